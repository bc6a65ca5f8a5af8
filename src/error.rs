//! Error taxonomy for inline runs.
//!
//! Most failures here are *recoverable*: a reference that cannot be read or a
//! compressor that blows up degrades to "leave the original content alone"
//! and is logged, never propagated. Only an invalid top-level configuration
//! (an unreadable root directory) is a hard error for the caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InlineError {
    /// A referenced file could not be read from the cache, the virtual file
    /// map, or disk. Callers treat this as "reference left untouched".
    #[error("failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A compressor hook failed. The original uncompressed content is kept.
    #[error("compression failed for {path}: {message}")]
    Compress { path: String, message: String },

    /// The configured root directory does not exist or is not a directory.
    /// This is the one configuration error that aborts the whole run.
    #[error("root directory {0:?} is not readable")]
    InvalidRoot(PathBuf),
}
