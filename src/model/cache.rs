//! Per-run memoization of remote-derived values
//!
//! The target is read-only for the duration of a run, so a value computed
//! for a remote address can never go stale mid-run: entries are first-wins
//! and nothing is ever evicted. The point is to bound remote reads, not
//! memory.

use crate::runtime::records::ValueKind;
use dashmap::DashMap;

/// A fully resolved field type: display string plus value-kind flag,
/// produced from one descriptor read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub display: String,
    pub value_kind: Option<ValueKind>,
}

/// Caches shared by all resolution work within a single run
#[derive(Default)]
pub struct RunCaches {
    /// Name strings keyed by (name pointer, owning identity); the owner
    /// disambiguates identical offsets across contexts
    names: DashMap<(u64, u64), String>,
    /// Resolved type strings keyed by type-descriptor address
    types: DashMap<u64, ResolvedType>,
}

impl RunCaches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a cached name or compute and remember it
    pub fn name_or_insert_with(
        &self,
        name_ptr: u64,
        owner: u64,
        compute: impl FnOnce() -> String,
    ) -> String {
        self.names
            .entry((name_ptr, owner))
            .or_insert_with(compute)
            .clone()
    }

    /// Fetch a cached resolved type or compute and remember it
    pub fn type_or_insert_with(
        &self,
        type_ptr: u64,
        compute: impl FnOnce() -> ResolvedType,
    ) -> ResolvedType {
        self.types.entry(type_ptr).or_insert_with(compute).clone()
    }

    /// Number of cached name strings
    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    /// Number of cached resolved types
    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_cache_first_wins() {
        let caches = RunCaches::new();
        let first = caches.name_or_insert_with(0x1000, 0x2000, || "first".to_string());
        let second = caches.name_or_insert_with(0x1000, 0x2000, || "second".to_string());
        assert_eq!(first, "first");
        assert_eq!(second, "first");
        assert_eq!(caches.name_count(), 1);
    }

    #[test]
    fn test_owner_disambiguates_same_pointer() {
        let caches = RunCaches::new();
        caches.name_or_insert_with(0x1000, 0xA, || "from A".to_string());
        let other = caches.name_or_insert_with(0x1000, 0xB, || "from B".to_string());
        assert_eq!(other, "from B");
        assert_eq!(caches.name_count(), 2);
    }

    #[test]
    fn test_type_cache_memoizes() {
        let caches = RunCaches::new();
        let mut computed = 0;
        for _ in 0..3 {
            caches.type_or_insert_with(0x5000, || {
                computed += 1;
                ResolvedType {
                    display: "Int32".to_string(),
                    value_kind: None,
                }
            });
        }
        assert_eq!(computed, 1);
        assert_eq!(caches.type_count(), 1);
    }
}
