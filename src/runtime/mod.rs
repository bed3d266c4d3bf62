//! Runtime structure discovery
//!
//! Everything needed to get from an attached process to the complete raw
//! class set: PE export traversal, root-domain location, the assembly walk
//! and the concurrent class-cache collection.

pub mod exports;
pub mod locator;
pub mod offsets;
pub mod records;
pub mod tables;

pub use exports::resolve_export;
pub use locator::{find_runtime_module, locate_assembly_image};
pub use records::{
    ClassKind, GenericInstanceDescriptor, RawClassRecord, RawFieldRecord, TypeCode,
    TypeDescriptor, ValueKind,
};
pub use tables::collect_class_records;

/// Export whose prologue encodes the root-domain global
pub const ROOT_DOMAIN_EXPORT: &str = "mono_get_root_domain";
