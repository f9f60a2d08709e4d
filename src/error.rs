//! Typed failures that callers may need to tell apart.
//!
//! Everything else travels as `anyhow::Error` with context attached.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Board with name '{0}' not found (case-insensitive)")]
    BoardNotFound(String),

    #[error("image path '{path}' is not under outputs root '{root}'")]
    NotUnderRoot { path: PathBuf, root: PathBuf },

    #[error("database file not found: {0}")]
    MissingDatabase(PathBuf),

    #[error("directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("{0}")]
    Usage(String),
}
