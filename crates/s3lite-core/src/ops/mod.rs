//! S3 operation handlers.
//!
//! This module contains the implementations of all S3 operations, organized
//! into submodules by category. Each submodule adds public methods to
//! [`crate::provider::S3Lite`].

pub mod bucket;
pub mod list;
pub mod multipart;
pub mod object;
