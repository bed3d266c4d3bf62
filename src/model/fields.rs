//! Field type resolution and generic expansion
//!
//! Turns a raw field record into a display-ready slot: name, type string and
//! value-kind marker. The one descriptor read feeds both the string and the
//! flag. Generic instantiations expand recursively with an explicit depth
//! parameter; recovered metadata is known to contain self-referential chains.

use crate::config::Limits;
use crate::core::types::Address;
use crate::memory::RemoteReader;
use crate::model::cache::{ResolvedType, RunCaches};
use crate::runtime::offsets;
use crate::runtime::records::{
    GenericInstanceDescriptor, RawClassRecord, RawFieldRecord, TypeCode, TypeDescriptor, ValueKind,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Sentinel for a field whose offset or name pointer fails the sanity bounds
pub const SENTINEL_OUT_OF_RANGE: &str = "<ErrorReadingField_OutOfRange>";
/// Sentinel for a field whose name read returned nothing
pub const SENTINEL_UNREADABLE: &str = "<ErrorReadingField>";
/// Sentinel for a generic expansion that exceeded the depth bound
pub const SENTINEL_MAX_RECURSION: &str = "<MaxRecursion>";
/// Sentinel for a class record that could not be dereferenced
pub const SENTINEL_UNKNOWN: &str = "<Unknown>";
/// Marker appended when an instantiation carries more arguments than the cap
const TRUNCATION_MARKER: &str = "…";

/// Name components of a class record
pub(crate) struct ClassNames {
    pub name: String,
    pub namespace: String,
    pub full: String,
}

/// A resolved field ready for export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSlot {
    pub name: String,
    pub type_name: String,
    pub offset: i32,
    pub value_kind: Option<ValueKind>,
}

/// Resolves field records against the live target, memoizing through the
/// run caches
pub struct FieldResolver<'a> {
    reader: &'a RemoteReader,
    caches: &'a RunCaches,
    limits: &'a Limits,
}

impl<'a> FieldResolver<'a> {
    pub fn new(reader: &'a RemoteReader, caches: &'a RunCaches, limits: &'a Limits) -> Self {
        FieldResolver {
            reader,
            caches,
            limits,
        }
    }

    /// Resolve every declared field slot of a class.
    ///
    /// A missing or unparsable field list is "no fields", not an error.
    pub fn resolve_class_fields(&self, class: &RawClassRecord) -> Vec<FieldSlot> {
        let count = class.field_count;
        if count <= 0 || count > self.limits.max_field_count {
            return Vec::new();
        }
        if !class.fields_ptr.is_plausible(self.limits.min_valid_address) {
            return Vec::new();
        }

        let total = count as usize * offsets::FIELD_RECORD_SIZE;
        let Some(buf) = self.reader.read_bytes(class.fields_ptr, total) else {
            return Vec::new();
        };

        buf.chunks_exact(offsets::FIELD_RECORD_SIZE)
            .map(RawFieldRecord::parse)
            .map(|field| self.resolve_field(&field))
            .collect()
    }

    /// Resolve one field record into a display-ready slot
    pub fn resolve_field(&self, field: &RawFieldRecord) -> FieldSlot {
        let name = self.field_name(field);
        let resolved = self.resolve_type(field.type_ptr);
        FieldSlot {
            name,
            type_name: resolved.display,
            offset: field.offset,
            value_kind: resolved.value_kind,
        }
    }

    /// Field name with the sanity bounds applied before any remote read
    fn field_name(&self, field: &RawFieldRecord) -> String {
        let name_ptr = field.name_ptr.as_u64();
        let owner = field.type_ptr.as_u64();

        self.caches.name_or_insert_with(name_ptr, owner, || {
            if field.offset > self.limits.field_offset_bound
                || !field.name_ptr.is_plausible(self.limits.min_valid_address)
            {
                return SENTINEL_OUT_OF_RANGE.to_string();
            }
            match self
                .reader
                .read_name(field.name_ptr, self.limits.name_read_len)
            {
                Some(name) => name,
                None => SENTINEL_UNREADABLE.to_string(),
            }
        })
    }

    /// Resolve a type descriptor address to its display string and value
    /// kind, memoized per descriptor address
    fn resolve_type(&self, type_ptr: Address) -> ResolvedType {
        self.caches.type_or_insert_with(type_ptr.as_u64(), || {
            if !type_ptr.is_plausible(self.limits.min_valid_address) {
                return ResolvedType {
                    display: SENTINEL_UNKNOWN.to_string(),
                    value_kind: None,
                };
            }
            let Some(descriptor) = TypeDescriptor::read(self.reader, type_ptr) else {
                return ResolvedType {
                    display: SENTINEL_UNKNOWN.to_string(),
                    value_kind: None,
                };
            };
            ResolvedType {
                display: self.describe(&descriptor, 1),
                value_kind: descriptor.value_kind(),
            }
        })
    }

    /// Render a descriptor at the given expansion depth
    fn describe(&self, descriptor: &TypeDescriptor, depth: u32) -> String {
        let code = descriptor.type_code();
        if !code.is_class_like() {
            return code.display_name().to_string();
        }

        let Some(target) = self.payload_class(descriptor) else {
            return SENTINEL_UNKNOWN.to_string();
        };
        let names = self.class_names(&target);

        match code {
            TypeCode::GenericInst => self.expand_generic(names.full, descriptor, depth),
            TypeCode::SzArray => format!("{}[]", names.full),
            _ => names.full,
        }
    }

    /// Dereference a descriptor payload to the class record behind it
    fn payload_class(&self, descriptor: &TypeDescriptor) -> Option<RawClassRecord> {
        if !descriptor.data.is_plausible(self.limits.min_valid_address) {
            return None;
        }
        let target = Address::new(self.reader.read_u64(descriptor.data));
        if !target.is_plausible(self.limits.min_valid_address) {
            return None;
        }
        RawClassRecord::read(self.reader, target)
    }

    /// Short and namespace-qualified names of a class record, cached by
    /// (name pointer, record identity)
    pub(crate) fn class_names(&self, class: &RawClassRecord) -> ClassNames {
        let owner = class.address.as_u64();

        let name = self
            .caches
            .name_or_insert_with(class.name_ptr.as_u64(), owner, || {
                if !class.name_ptr.is_plausible(self.limits.min_valid_address) {
                    return SENTINEL_UNKNOWN.to_string();
                }
                self.reader
                    .read_name(class.name_ptr, self.limits.name_read_len)
                    .unwrap_or_else(|| SENTINEL_UNKNOWN.to_string())
            });

        let namespace = self
            .caches
            .name_or_insert_with(class.namespace_ptr.as_u64(), owner, || {
                if !class.namespace_ptr.is_plausible(self.limits.min_valid_address) {
                    return String::new();
                }
                self.reader
                    .read_name(class.namespace_ptr, self.limits.name_read_len)
                    .unwrap_or_default()
            });

        let full = if namespace.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", namespace, name)
        };
        ClassNames {
            name,
            namespace,
            full,
        }
    }

    /// Expand a generic instantiation into `Base<Arg1, Arg2, …>` notation
    fn expand_generic(&self, base: String, descriptor: &TypeDescriptor, depth: u32) -> String {
        if depth > self.limits.max_recursion_depth {
            return SENTINEL_MAX_RECURSION.to_string();
        }

        // Strip the arity suffix from the metadata name
        let mut base = base;
        if let Some(idx) = base.find('`') {
            base.truncate(idx);
        }

        let class_inst = Address::new(
            self.reader
                .read_u64(descriptor.data + offsets::GENERIC_CLASS_INST),
        );
        let Some(instance) =
            GenericInstanceDescriptor::read(self.reader, class_inst, self.limits.max_generic_params)
        else {
            return format!("{}<>", base);
        };

        let mut parts: Vec<String> = Vec::with_capacity(instance.argv.len());
        for &arg_ptr in &instance.argv {
            let sub = TypeDescriptor::read(self.reader, arg_ptr).unwrap_or_default();
            let code = sub.type_code();
            if !code.is_class_like() {
                parts.push(code.display_name().to_string());
                continue;
            }

            let Some(target) = self.payload_class(&sub) else {
                parts.push(SENTINEL_UNKNOWN.to_string());
                continue;
            };
            // Arguments render with their short names
            let short = self.class_names(&target).name;
            if code == TypeCode::GenericInst {
                parts.push(self.expand_generic(short, &sub, depth + 1));
            } else if code == TypeCode::SzArray {
                parts.push(format!("{}[]", short));
            } else {
                parts.push(short);
            }
        }

        if instance.truncated() {
            let dropped = instance.param_count as usize - instance.argv.len();
            warn!(
                base = %base,
                param_count = instance.param_count,
                dropped,
                "generic instantiation exceeds the argument cap"
            );
            parts.push(TRUNCATION_MARKER.to_string());
        }

        format!("{}<{}>", base, parts.join(", "))
    }
}
