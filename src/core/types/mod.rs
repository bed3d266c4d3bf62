//! Fundamental types shared across all reconstruction stages

mod address;
mod error;
mod module_info;

pub use address::{Address, DEFAULT_ADDRESS_FLOOR};
pub use error::{DumpError, DumpResult};
pub use module_info::ModuleInfo;
