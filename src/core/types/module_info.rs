//! Module information reported by a memory backend

use super::address::Address;
use serde::{Deserialize, Serialize};

/// A loaded module inside the target process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub base_address: Address,
    pub size: usize,
}

impl ModuleInfo {
    /// Create new module info
    pub fn new(name: impl Into<String>, base_address: Address, size: usize) -> Self {
        ModuleInfo {
            name: name.into(),
            base_address,
            size,
        }
    }

    /// Check if an address is within this module
    pub fn contains_address(&self, addr: Address) -> bool {
        let addr = addr.as_u64();
        let base = self.base_address.as_u64();
        addr >= base && addr < base + self.size as u64
    }

    /// Get the end address of the module
    pub fn end_address(&self) -> Address {
        Address::new(self.base_address.as_u64() + self.size as u64)
    }
}
