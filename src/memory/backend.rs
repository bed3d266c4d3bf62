//! Pluggable memory acquisition boundary
//!
//! The reconstruction stages only ever need three capabilities from the
//! outside world: attach to a target, locate a module, read a byte range.
//! Everything else (OS handles, DMA hardware, snapshots) lives behind this
//! trait.

use crate::core::types::{Address, DumpError, DumpResult, ModuleInfo};
use std::str::FromStr;

/// Read-only view into a foreign address space.
///
/// Implementations must tolerate arbitrary addresses: an unreadable region is
/// reported as `None`, never a panic. All reads after a successful `attach`
/// are issued concurrently from worker threads.
pub trait MemoryBackend: Send + Sync {
    /// Attach to a process by name or identifier. Returns false when the
    /// target cannot be opened.
    fn attach(&mut self, target: &str) -> bool;

    /// Look up a loaded module by file name
    fn module_by_name(&self, name: &str) -> Option<ModuleInfo>;

    /// Read `len` bytes at `address`. `None` signals an unreadable region.
    fn read_bytes(&self, address: Address, len: usize) -> Option<Vec<u8>>;
}

/// Selectable backend implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// OS process-memory reads (Windows only)
    Process,
}

impl FromStr for BackendKind {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "process" => Ok(BackendKind::Process),
            other => Err(DumpError::UnsupportedBackend(other.to_string())),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Process => write!(f, "process"),
        }
    }
}

/// Instantiate the selected backend
pub fn create_backend(kind: BackendKind) -> DumpResult<Box<dyn MemoryBackend>> {
    match kind {
        #[cfg(windows)]
        BackendKind::Process => Ok(Box::new(super::process::ProcessBackend::new())),
        #[cfg(not(windows))]
        BackendKind::Process => Err(DumpError::UnsupportedBackend("process".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!(BackendKind::from_str("process").unwrap(), BackendKind::Process);
        assert_eq!(BackendKind::from_str("Process").unwrap(), BackendKind::Process);
        assert!(BackendKind::from_str("dma").is_err());
    }

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Process.to_string(), "process");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_process_backend_unavailable_off_windows() {
        assert!(create_backend(BackendKind::Process).is_err());
    }
}
