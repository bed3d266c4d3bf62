//! Memory acquisition layer
//!
//! A [`MemoryBackend`] supplies raw byte reads out of the target address
//! space; the [`RemoteReader`] wraps one backend per run and adds the typed
//! read helpers the metadata walkers use.

pub mod backend;
#[cfg(windows)]
pub mod process;
pub mod reader;

pub use backend::{create_backend, BackendKind, MemoryBackend};
#[cfg(windows)]
pub use process::ProcessBackend;
pub use reader::RemoteReader;
