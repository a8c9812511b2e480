//! Error types surfaced by the I/O and reconstruction-diagnostic boundary.
//!
//! `reconstruct` itself stays `Option`-based (matching the reference's control
//! flow); this type exists for callers of the loader/writer layer that need a
//! real `std::error::Error` to propagate with `?`.

use thiserror::Error;

/// Errors that can occur loading, reconstructing, or writing a point cloud.
#[derive(Error, Debug)]
pub enum ReconstructError {
    /// A PLY file could not be parsed.
    #[error("malformed PLY file: {0}")]
    Ply(String),

    /// An underlying filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized `Result` type for this crate's fallible operations.
pub type Result<T> = std::result::Result<T, ReconstructError>;
