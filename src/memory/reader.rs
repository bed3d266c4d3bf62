//! Remote reader bound to one attach session
//!
//! Thin layer over a [`MemoryBackend`] adding typed fixed-size reads and the
//! default-on-failure semantics the metadata walkers rely on: a zero result
//! reads as "could not resolve" and terminates pointer chains naturally.

use crate::core::types::{Address, ModuleInfo};
use crate::memory::backend::MemoryBackend;

/// One attach session's view of the target address space.
///
/// Constructed once per reconstruction run and shared read-only across the
/// parallel phases. Re-attaching replaces the bound target.
pub struct RemoteReader {
    backend: Box<dyn MemoryBackend>,
}

impl RemoteReader {
    /// Bind a backend instance for this run
    pub fn new(backend: Box<dyn MemoryBackend>) -> Self {
        RemoteReader { backend }
    }

    /// Attach the backend to a target process
    pub fn attach(&mut self, target: &str) -> bool {
        self.backend.attach(target)
    }

    /// Look up a loaded module in the target
    pub fn module_by_name(&self, name: &str) -> Option<ModuleInfo> {
        self.backend.module_by_name(name)
    }

    /// Read a byte range; `None` signals an unreadable region
    pub fn read_bytes(&self, address: Address, len: usize) -> Option<Vec<u8>> {
        self.backend.read_bytes(address, len)
    }

    /// Read a little-endian u64, or `None` if unreadable
    pub fn try_read_u64(&self, address: Address) -> Option<u64> {
        let bytes = self.read_bytes(address, 8)?;
        Some(u64::from_le_bytes(bytes.try_into().ok()?))
    }

    /// Read a little-endian u32, or `None` if unreadable
    pub fn try_read_u32(&self, address: Address) -> Option<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Some(u32::from_le_bytes(bytes.try_into().ok()?))
    }

    /// Metadata read: u64 or zero. Callers treat zero as "could not resolve".
    pub fn read_u64(&self, address: Address) -> u64 {
        self.try_read_u64(address).unwrap_or_default()
    }

    /// Metadata read: u32 or zero
    pub fn read_u32(&self, address: Address) -> u32 {
        self.try_read_u32(address).unwrap_or_default()
    }

    /// Metadata read: i32 or zero
    pub fn read_i32(&self, address: Address) -> i32 {
        self.try_read_u32(address).map(|v| v as i32).unwrap_or_default()
    }

    /// Read a NUL-terminated ASCII/UTF-8 string of at most `max_len` bytes
    pub fn read_c_string(&self, address: Address, max_len: usize) -> Option<String> {
        let buffer = self.read_bytes(address, max_len)?;
        let len = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
        Some(String::from_utf8_lossy(&buffer[..len]).into_owned())
    }

    /// Read a metadata name string.
    ///
    /// Obfuscators emit names whose first byte falls in the upper UTF-8 lead
    /// range; those render as an escape of the first decoded character so the
    /// dump stays diffable text.
    pub fn read_name(&self, address: Address, max_len: usize) -> Option<String> {
        let buffer = self.read_bytes(address, max_len)?;
        let len = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
        let slice = &buffer[..len];

        if slice.first().copied().unwrap_or(0) >= 0xE0 {
            let decoded = String::from_utf8_lossy(slice);
            if let Some(first) = decoded.chars().next() {
                return Some(format!("\\u{:04X}", first as u32));
            }
        }

        Some(String::from_utf8_lossy(slice).into_owned())
    }
}
