//! Error types for the segue engine
//!
//! Domain errors use thiserror; action implementations report failures
//! through `anyhow` so arbitrary host causes can flow to the reporter.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Definition loading errors
#[derive(Debug, Error)]
pub enum DefsError {
    /// Definitions directory not found
    #[error("Definitions directory not found: {0}")]
    DirNotFound(PathBuf),

    /// Definition file failed to parse
    #[error("Invalid definition file {path}: {detail}")]
    InvalidFile {
        /// Path of the offending file
        path: PathBuf,
        /// Parse error details
        detail: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Convenience result alias for definition loading
pub type DefsResult<T> = std::result::Result<T, DefsError>;

/// Outcome type action implementations report through
///
/// Actions run inside the per-step failure boundary, so any `Err` returned
/// here is caught at the invoke site, reported once, and never unwinds into
/// the step that scheduled it.
pub type ActionResult<T = ()> = anyhow::Result<T>;
