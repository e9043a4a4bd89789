//! Ordered per-bucket object index.
//!
//! [`ObjectIndex`] maps keys to [`S3Object`] metadata in a `BTreeMap`, so keys
//! are always sorted. That ordering is what makes cursor pagination and
//! delimiter grouping work: a listing is a single forward scan starting at
//! `max(prefix, cursor)`.

use std::collections::BTreeMap;
use std::ops::Bound;

use super::object::S3Object;

/// Page size used by [`FullListing`] when none is given.
pub const FULL_LISTING_PAGE_SIZE: usize = 1000;

// ---------------------------------------------------------------------------
// ListResult
// ---------------------------------------------------------------------------

/// One page of a listing.
#[derive(Debug, Clone, Default)]
pub struct ListResult {
    /// Objects on this page, in key order.
    pub objects: Vec<S3Object>,
    /// Collapsed common prefixes on this page, in key order.
    pub common_prefixes: Vec<String>,
    /// Whether more entries follow this page.
    pub is_truncated: bool,
    /// The last key or common prefix returned, set only when truncated.
    pub next_marker: Option<String>,
}

impl ListResult {
    /// Number of entries (objects plus common prefixes) on this page.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.objects.len() + self.common_prefixes.len()
    }
}

// ---------------------------------------------------------------------------
// ObjectIndex
// ---------------------------------------------------------------------------

/// Sorted key to metadata mapping for one bucket.
#[derive(Debug, Default)]
pub struct ObjectIndex {
    objects: BTreeMap<String, S3Object>,
}

impl ObjectIndex {
    /// Insert or replace an object. Returns the displaced object.
    pub fn put(&mut self, object: S3Object) -> Option<S3Object> {
        self.objects.insert(object.key.clone(), object)
    }

    /// Look up an object by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&S3Object> {
        self.objects.get(key)
    }

    /// Remove an object. Returns it if it was present.
    pub fn delete(&mut self, key: &str) -> Option<S3Object> {
        self.objects.remove(key)
    }

    /// Number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the index holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Remove every object, returning them.
    pub fn drain(&mut self) -> Vec<S3Object> {
        std::mem::take(&mut self.objects).into_values().collect()
    }

    /// List one page of objects.
    ///
    /// - `prefix` restricts the listing to keys starting with it.
    /// - `delimiter` collapses keys into common prefixes at the first
    ///   occurrence of the delimiter after `prefix`. Each common prefix counts
    ///   as one entry toward `max_keys`.
    /// - `start_after` is the cursor: only entries strictly after it are
    ///   returned, and a common prefix at or before it is not repeated.
    #[must_use]
    pub fn list(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
        start_after: Option<&str>,
        max_keys: usize,
    ) -> ListResult {
        let delimiter = delimiter.filter(|d| !d.is_empty());
        let start_after = start_after.filter(|s| !s.is_empty());
        let mut result = ListResult::default();
        if max_keys == 0 {
            return result;
        }

        let lower = match start_after {
            Some(cursor) if cursor >= prefix => Bound::Excluded(cursor),
            _ => Bound::Included(prefix),
        };

        let mut last_marker: Option<&str> = None;
        for (key, object) in self
            .objects
            .range::<str, _>((lower, Bound::Unbounded))
        {
            if !key.starts_with(prefix) {
                break;
            }

            let grouped = delimiter.and_then(|d| common_prefix(key, prefix, d));
            if let Some(cp) = grouped {
                let repeated = result.common_prefixes.last().is_some_and(|p| p == cp);
                if repeated || start_after.is_some_and(|cursor| cp <= cursor) {
                    continue;
                }
            }

            if result.entry_count() == max_keys {
                result.is_truncated = true;
                break;
            }

            match grouped {
                Some(cp) => {
                    result.common_prefixes.push(cp.to_owned());
                    last_marker = Some(cp);
                }
                None => {
                    result.objects.push(object.clone());
                    last_marker = Some(key);
                }
            }
        }

        if result.is_truncated {
            result.next_marker = last_marker.map(ToOwned::to_owned);
        }
        result
    }
}

/// The common prefix `key` collapses into, if any.
fn common_prefix<'k>(key: &'k str, prefix: &str, delimiter: &str) -> Option<&'k str> {
    key[prefix.len()..]
        .find(delimiter)
        .map(|pos| &key[..prefix.len() + pos + delimiter.len()])
}

// ---------------------------------------------------------------------------
// FullListing
// ---------------------------------------------------------------------------

/// Iterative enumeration of every key under a prefix, ignoring delimiters.
///
/// Each call to [`FullListing::next_page`] borrows the index only for the
/// duration of the call, so callers can release their lock between pages.
#[derive(Debug, Clone)]
pub struct FullListing {
    prefix: String,
    cursor: Option<String>,
    page_size: usize,
    done: bool,
}

impl FullListing {
    /// Enumerate keys starting with `prefix`, `page_size` at a time.
    #[must_use]
    pub fn new(prefix: impl Into<String>, page_size: usize) -> Self {
        Self {
            prefix: prefix.into(),
            cursor: None,
            page_size: page_size.max(1),
            done: false,
        }
    }

    /// Fetch the next page, or `None` once the enumeration is exhausted.
    pub fn next_page(&mut self, index: &ObjectIndex) -> Option<Vec<S3Object>> {
        if self.done {
            return None;
        }
        let page = index.list(&self.prefix, None, self.cursor.as_deref(), self.page_size);
        self.done = !page.is_truncated;
        self.cursor = page.objects.last().map(|o| o.key.clone());
        if page.objects.is_empty() {
            self.done = true;
            return None;
        }
        Some(page.objects)
    }

    /// Collect every remaining object.
    pub fn collect_all(mut self, index: &ObjectIndex) -> Vec<S3Object> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page(index) {
            all.extend(page);
        }
        all
    }
}

impl Default for FullListing {
    fn default() -> Self {
        Self::new("", FULL_LISTING_PAGE_SIZE)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
