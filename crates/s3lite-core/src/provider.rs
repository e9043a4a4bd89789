//! The S3 engine handle.
//!
//! [`S3Lite`] owns all service state (buckets, objects, multipart uploads)
//! and the content store. Individual S3 operations are implemented in the
//! [`crate::ops`] submodules as inherent methods on [`S3Lite`].

use std::sync::Arc;

use crate::config::S3Config;
use crate::state::{MultipartCoordinator, S3ServiceState};
use crate::storage::{ContentStore, InMemoryStorage};

/// The S3 engine.
///
/// All fields are `Arc`-wrapped so the handle can be shared across tasks.
///
/// # Examples
///
/// ```
/// use s3lite_core::S3Lite;
/// use s3lite_core::config::S3Config;
///
/// let s3 = S3Lite::new(S3Config::default());
/// assert_eq!(s3.config().default_max_keys, 1000);
/// ```
#[derive(Debug)]
pub struct S3Lite {
    /// Bucket registry and per-bucket object indexes.
    pub(crate) state: Arc<S3ServiceState>,
    /// Object and part content.
    pub(crate) storage: Arc<dyn ContentStore>,
    /// In-progress multipart uploads.
    pub(crate) multipart: Arc<MultipartCoordinator>,
    /// Engine configuration.
    pub(crate) config: Arc<S3Config>,
}

impl S3Lite {
    /// Create an engine backed by [`InMemoryStorage`] configured from
    /// `config`.
    #[must_use]
    pub fn new(config: S3Config) -> Self {
        let mut storage = InMemoryStorage::new(config.max_memory_object_size);
        if let Some(dir) = &config.spill_dir {
            storage = storage.with_spill_dir(dir);
        }
        Self::with_storage(config, Arc::new(storage))
    }

    /// Create an engine on top of a caller-provided content store.
    #[must_use]
    pub fn with_storage(config: S3Config, storage: Arc<dyn ContentStore>) -> Self {
        let multipart = MultipartCoordinator::new(Arc::clone(&storage), config.max_part_number);
        Self {
            state: Arc::new(S3ServiceState::new()),
            storage,
            multipart: Arc::new(multipart),
            config: Arc::new(config),
        }
    }

    /// Returns a reference to the service state.
    #[must_use]
    pub fn state(&self) -> &S3ServiceState {
        &self.state
    }

    /// Returns a reference to the content store.
    #[must_use]
    pub fn storage(&self) -> &dyn ContentStore {
        self.storage.as_ref()
    }

    /// Returns a reference to the multipart coordinator.
    #[must_use]
    pub fn multipart(&self) -> &MultipartCoordinator {
        &self.multipart
    }

    /// Returns a reference to the engine configuration.
    #[must_use]
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Drop all buckets, objects, uploads and content.
    ///
    /// Buckets are marked deleted as they are drained, so a writer still
    /// holding one fails with `NoSuchBucket` instead of publishing into it.
    pub fn reset(&self) {
        self.multipart.reset();
        for bucket in self.state.reset() {
            for object in bucket.drain() {
                self.storage.delete(&object.handle);
            }
        }
        self.storage.reset();
    }
}
