//! Filesystem cache of derived images.
//!
//! Transforming an image is the expensive path of every request — an
//! AVIF encode through rav1e can take seconds. This module stores each
//! derived result as a plain file so repeat requests are a single read.
//!
//! # Design
//!
//! The cache is keyed entirely by the request tuple, materialized as
//! `{cache_root}/{category}/{derived filename}` where the filename
//! comes from [`TransformRequest::cache_filename`]. Because the
//! pipeline is deterministic, the tuple fully identifies the bytes:
//! no manifest, no hash index, no sidecar metadata.
//!
//! Concurrent cold-cache requests for the same tuple may both run the
//! transform and both write the file. They produce identical bytes, so
//! the race is harmless and needs no locking.
//!
//! Cache writes are best-effort. A failed write is logged and the
//! freshly produced bytes are still returned, so a read-only or full
//! cache volume degrades to recomputing on every request rather than
//! failing them.
//!
//! Note that entries are never invalidated by source changes: a source
//! file edited in place keeps serving stale derivatives until the
//! entry is removed or the request carries `force`. Deployments that
//! replace sources should clear the cache root.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::types::TransformRequest;

/// Cache of derived images under a single root directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// On-disk location for a request's derived image.
    pub fn path(&self, request: &TransformRequest) -> PathBuf {
        self.root
            .join(&request.category)
            .join(request.cache_filename())
    }

    /// Read a cached derivative. Any read failure is a miss.
    pub fn get(&self, request: &TransformRequest) -> Option<Vec<u8>> {
        let path = self.path(request);
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a derivative. Failures are logged and swallowed.
    pub fn put(&self, request: &TransformRequest, bytes: &[u8]) {
        let path = self.path(request);
        if let Err(e) = self.write_entry(&path, bytes) {
            warn!(path = %path.display(), error = %e, "cache write failed");
        }
    }

    fn write_entry(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)
    }

    /// Serve from cache or run `produce` and store the result.
    ///
    /// With `force` the lookup is skipped entirely and the fresh result
    /// overwrites whatever entry existed. The write happens before the
    /// bytes are returned either way.
    ///
    /// Returns the bytes and whether they came from the cache.
    pub fn get_or_create<F, E>(
        &self,
        request: &TransformRequest,
        force: bool,
        produce: F,
    ) -> Result<(Vec<u8>, bool), E>
    where
        F: FnOnce() -> Result<Vec<u8>, E>,
    {
        if !force {
            if let Some(bytes) = self.get(request) {
                debug!(file = %request.cache_filename(), "cache hit");
                return Ok((bytes, true));
            }
        }
        let bytes = produce()?;
        self.put(request, &bytes);
        Ok((bytes, false))
    }
}
