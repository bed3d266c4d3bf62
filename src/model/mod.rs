//! Reconstructed type model
//!
//! Turns the raw class set into the sorted, linked arena the exporters
//! consume: field resolution with memoization, generic expansion, and the
//! two-pass hierarchy build.

pub mod cache;
pub mod fields;
pub mod hierarchy;

pub use cache::{ResolvedType, RunCaches};
pub use fields::{FieldResolver, FieldSlot};
pub use hierarchy::{build_hierarchy, TypeNode};
