//! Core module containing fundamental types for monodump
//!
//! Provides address handling, module information and the run error taxonomy
//! used by every reconstruction stage.

pub mod types;

pub use types::{Address, DumpError, DumpResult, ModuleInfo};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
