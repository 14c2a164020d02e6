//! On-disk compressed tile cache.
//!
//! Renderers memoize expensive per-layer computations here. Each entry is a
//! single file addressed by a domain (one directory per kind of data) and a
//! key:
//!
//! ```text
//! <root>/
//! ├── catalog/
//! │   ├── bright.txt-10834-1718031201
//! │   └── ...
//! └── <domain>/
//!     └── <key>
//! ```
//!
//! Every failure on the read path is a miss; write failures are reported to
//! the caller, who carries on without caching. Entries are overwritten
//! wholesale and never evicted.

mod record;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use record::{compress_bound, RecordHeader, HEADER_LEN, TYPE_ZLIB};

/// Permission bits of a saved entry.
#[cfg(unix)]
const ENTRY_MODE: u32 = 0o644;

/// Errors that can occur while saving a cache entry.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Domain or key cannot name a single file under the root.
    #[error("Invalid cache {what} '{value}'")]
    InvalidKey { what: &'static str, value: String },

    /// The payload does not fit the 32-bit length field.
    #[error("Payload of {len} bytes is too large to cache")]
    TooLarge { len: usize },

    /// The compressor failed.
    #[error("Failed to compress cache payload: {0}")]
    Compress(#[source] io::Error),

    /// Creating, writing or renaming the file failed.
    #[error("Failed to write cache file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle to the cache directory for one request.
#[derive(Debug, Clone, Default)]
pub struct TileCache {
    root: Option<PathBuf>,
}

impl TileCache {
    /// Create a cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// A cache with no root: every load misses and every save is a no-op.
    pub fn disabled() -> Self {
        Self { root: None }
    }

    /// The configured root directory, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.root.is_some()
    }

    /// Load the bytes stored under `(domain, key)`.
    ///
    /// Returns `None` on any kind of miss: no root, no file, a file too short
    /// to hold a header, an unknown type tag, or a payload that does not
    /// decompress to exactly the recorded length.
    pub fn load(&self, domain: &str, key: &str) -> Option<Vec<u8>> {
        let root = self.root.as_deref()?;
        if validate_component("domain", domain).is_err() || validate_component("key", key).is_err()
        {
            tracing::debug!(domain, key, "Cache lookup with invalid name");
            return None;
        }
        let path = entry_path(root, domain, key);

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::trace!(domain, key, "Cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read cache file");
                return None;
            }
        };

        match record::decode(&bytes) {
            Ok(data) => {
                tracing::debug!(domain, key, bytes = data.len(), "Cache hit");
                Some(data)
            }
            Err(reason) => {
                tracing::warn!(path = %path.display(), %reason, "Ignoring unusable cache file");
                None
            }
        }
    }

    /// Store `data` under `(domain, key)`, replacing any previous entry.
    ///
    /// The record is written to a temporary file in the domain directory and
    /// renamed into place, so readers never observe a partial entry. With no
    /// root configured this succeeds without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the names are invalid, the payload is too
    /// large, or the file cannot be written. Nothing is left behind on
    /// failure.
    pub fn save(&self, domain: &str, key: &str, data: &[u8]) -> Result<(), CacheError> {
        let Some(root) = self.root.as_deref() else {
            return Ok(());
        };
        validate_component("domain", domain)?;
        validate_component("key", key)?;

        let stored = record::encode(data)?;

        let dir = root.join(domain);
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| CacheError::Io { path, source }
        };
        std::fs::create_dir_all(&dir).map_err(io_err(dir.as_path()))?;

        let path = dir.join(key);
        // Dropping the temp file on an early return deletes it
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err(dir.as_path()))?;
        tmp.write_all(&stored).map_err(io_err(tmp.path()))?;
        tmp.flush().map_err(io_err(tmp.path()))?;
        // Temp files start owner-only; entries are shared with other users
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(ENTRY_MODE))
                .map_err(io_err(tmp.path()))?;
        }
        tmp.persist(&path).map_err(|e| CacheError::Io {
            path: path.clone(),
            source: e.error,
        })?;

        tracing::debug!(
            domain,
            key,
            original = data.len(),
            stored = stored.len(),
            "Saved cache entry"
        );
        Ok(())
    }
}

fn entry_path(root: &Path, domain: &str, key: &str) -> PathBuf {
    root.join(domain).join(key)
}

/// Reject names that would escape or alias the domain directory.
fn validate_component(what: &'static str, value: &str) -> Result<(), CacheError> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains('/')
        || value.contains('\\')
        || value.contains('\0');
    if bad {
        Err(CacheError::InvalidKey {
            what,
            value: value.to_string(),
        })
    } else {
        Ok(())
    }
}
