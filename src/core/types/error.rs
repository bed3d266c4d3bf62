//! Error taxonomy for a reconstruction run
//!
//! Only run-aborting conditions are represented here. Locally recoverable
//! failures (an unreadable chain link, a bad field name pointer) degrade to
//! sentinel values at their originating stage and never unwind.

use thiserror::Error;

/// Fatal conditions that abort a reconstruction run
#[derive(Error, Debug)]
pub enum DumpError {
    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("Could not attach to process '{0}'")]
    AttachFailed(String),

    #[error("Mono runtime module not found in target process")]
    RuntimeModuleNotFound,

    #[error("Could not copy runtime module image ({size} bytes at {base})")]
    ModuleCopyFailed { base: String, size: usize },

    #[error("Export '{0}' not found in runtime module")]
    ExportNotFound(String),

    #[error("Unable to find assembly '{0}'")]
    AssemblyNotFound(String),

    #[error("Backend '{0}' is not available on this platform")]
    UnsupportedBackend(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database serialization error: {0}")]
    Database(#[from] bincode::Error),
}

/// Result type alias for run operations
pub type DumpResult<T> = Result<T, DumpError>;

impl DumpError {
    /// Creates a module copy failure for the given module bounds
    pub fn module_copy_failed(base: impl std::fmt::Display, size: usize) -> Self {
        DumpError::ModuleCopyFailed {
            base: base.to_string(),
            size,
        }
    }
}
