//! Typed views over raw runtime structures
//!
//! Every structure here is copied out of the target with a single byte-range
//! read and decoded field by field; nothing is transmuted in place. A failed
//! read yields `None` and the caller substitutes a sentinel or stops the
//! walk.

use crate::core::types::Address;
use crate::memory::RemoteReader;
use crate::runtime::offsets;
use serde::{Deserialize, Serialize};
use std::fmt;

fn u64_at(buf: &[u8], off: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[off..off + 8]);
    u64::from_le_bytes(bytes)
}

fn u32_at(buf: &[u8], off: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[off..off + 4]);
    u32::from_le_bytes(bytes)
}

fn u16_at(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

/// Classification of a class record for the dump header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Struct,
    Enum,
    Interface,
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClassKind::Class => "Class",
            ClassKind::Struct => "Struct",
            ClassKind::Enum => "Enum",
            ClassKind::Interface => "Interface",
        };
        write!(f, "{}", name)
    }
}

/// One class definition copied verbatim out of the target.
///
/// Carries raw pointers only; resolution against the completed class set
/// happens in the hierarchy builder.
#[derive(Debug, Clone)]
pub struct RawClassRecord {
    /// The record's own remote address (its identity within a run)
    pub address: Address,
    pub name_ptr: Address,
    pub namespace_ptr: Address,
    pub parent_ptr: Address,
    pub interfaces_ptr: Address,
    pub interface_count: u16,
    pub flags: u32,
    pub kind_bits: u32,
    pub fields_ptr: Address,
    pub field_count: i32,
}

impl RawClassRecord {
    /// Read the full record at `address` with one remote read
    pub fn read(reader: &RemoteReader, address: Address) -> Option<Self> {
        let buf = reader.read_bytes(address, offsets::CLASS_RECORD_SIZE)?;
        Some(Self::parse(address, &buf))
    }

    fn parse(address: Address, buf: &[u8]) -> Self {
        RawClassRecord {
            address,
            name_ptr: Address::new(u64_at(buf, offsets::CLASS_NAME as usize)),
            namespace_ptr: Address::new(u64_at(buf, offsets::CLASS_NAMESPACE as usize)),
            parent_ptr: Address::new(u64_at(buf, offsets::CLASS_PARENT as usize)),
            interfaces_ptr: Address::new(u64_at(buf, offsets::CLASS_INTERFACES as usize)),
            interface_count: u16_at(buf, offsets::CLASS_INTERFACE_COUNT as usize),
            flags: u32_at(buf, offsets::CLASS_FLAGS as usize),
            kind_bits: u32_at(buf, offsets::CLASS_KIND_BITS as usize),
            fields_ptr: Address::new(u64_at(buf, offsets::CLASS_FIELDS as usize)),
            field_count: u32_at(buf, offsets::CLASS_FIELD_COUNT as usize) as i32,
        }
    }

    /// Classify the record from its attribute flags and packed bits
    pub fn kind(&self) -> ClassKind {
        if self.kind_bits & offsets::CLASS_BIT_ENUMTYPE != 0 {
            ClassKind::Enum
        } else if self.kind_bits & offsets::CLASS_BIT_VALUETYPE != 0 {
            ClassKind::Struct
        } else if self.flags & offsets::CLASS_FLAG_INTERFACE != 0 {
            ClassKind::Interface
        } else {
            ClassKind::Class
        }
    }
}

/// One declared field slot of a class
#[derive(Debug, Clone, Copy)]
pub struct RawFieldRecord {
    pub type_ptr: Address,
    pub name_ptr: Address,
    pub parent_ptr: Address,
    pub offset: i32,
}

impl RawFieldRecord {
    /// Decode one field slot from a field-array buffer
    pub fn parse(buf: &[u8]) -> Self {
        RawFieldRecord {
            type_ptr: Address::new(u64_at(buf, offsets::FIELD_TYPE)),
            name_ptr: Address::new(u64_at(buf, offsets::FIELD_NAME)),
            parent_ptr: Address::new(u64_at(buf, offsets::FIELD_PARENT)),
            offset: u32_at(buf, offsets::FIELD_OFFSET) as i32,
        }
    }
}

/// Whether a field carries a compile-time constant or a static slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Static,
    Constant,
}

impl ValueKind {
    /// Single-letter marker used in the text export legend
    pub fn marker(&self) -> char {
        match self {
            ValueKind::Static => 'S',
            ValueKind::Constant => 'C',
        }
    }
}

/// A type descriptor: payload pointer plus packed attribute/code bits
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeDescriptor {
    pub data: Address,
    pub attrs: u32,
}

impl TypeDescriptor {
    /// Read a descriptor at `address`, or `None` if unreadable
    pub fn read(reader: &RemoteReader, address: Address) -> Option<Self> {
        let buf = reader.read_bytes(address, offsets::TYPE_RECORD_SIZE)?;
        Some(Self::parse(&buf))
    }

    /// Decode a descriptor from an in-memory buffer
    pub fn parse(buf: &[u8]) -> Self {
        TypeDescriptor {
            data: Address::new(u64_at(buf, offsets::TYPE_DATA)),
            attrs: u32_at(buf, offsets::TYPE_ATTRS),
        }
    }

    /// The element-type code packed into bits 16..24
    pub fn type_code(&self) -> TypeCode {
        TypeCode::from_u8(((self.attrs >> 16) & 0xFF) as u8)
    }

    pub fn is_static(&self) -> bool {
        self.attrs & offsets::FIELD_ATTRIBUTE_STATIC != 0
    }

    pub fn is_constant(&self) -> bool {
        self.attrs & offsets::FIELD_ATTRIBUTE_LITERAL != 0
    }

    /// Value-kind classification, derived from the already-read attribute
    /// bits (no additional remote read)
    pub fn value_kind(&self) -> Option<ValueKind> {
        if self.is_constant() {
            Some(ValueKind::Constant)
        } else if self.is_static() {
            Some(ValueKind::Static)
        } else {
            None
        }
    }
}

/// A generic instantiation: packed argument count plus argument descriptors.
#[derive(Debug, Clone)]
pub struct GenericInstanceDescriptor {
    /// Full packed argument count (low 22 bits of the bit-field)
    pub param_count: u32,
    /// Argument descriptor pointers, capped at the configured maximum
    pub argv: Vec<Address>,
}

impl GenericInstanceDescriptor {
    /// Read the instantiation record at `address`, keeping at most
    /// `max_params` argument pointers
    pub fn read(reader: &RemoteReader, address: Address, max_params: u32) -> Option<Self> {
        let len = offsets::GENERIC_INST_ARGV as usize + max_params as usize * 8;
        let buf = reader.read_bytes(address, len)?;

        let bitfield = u32_at(&buf, offsets::GENERIC_INST_BITFIELD as usize);
        let param_count = bitfield & offsets::GENERIC_INST_COUNT_MASK;

        let kept = param_count.min(max_params) as usize;
        let argv = (0..kept)
            .map(|i| Address::new(u64_at(&buf, offsets::GENERIC_INST_ARGV as usize + i * 8)))
            .collect();

        Some(GenericInstanceDescriptor { param_count, argv })
    }

    /// Whether arguments beyond the cap were dropped
    pub fn truncated(&self) -> bool {
        self.param_count as usize > self.argv.len()
    }
}

/// ECMA-335 element-type codes carried by a type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeCode {
    End = 0x00,
    Void = 0x01,
    Boolean = 0x02,
    Char = 0x03,
    SByte = 0x04,
    Byte = 0x05,
    Int16 = 0x06,
    UInt16 = 0x07,
    Int32 = 0x08,
    UInt32 = 0x09,
    Int64 = 0x0A,
    UInt64 = 0x0B,
    Single = 0x0C,
    Double = 0x0D,
    String = 0x0E,
    Pointer = 0x0F,
    ByRef = 0x10,
    ValueType = 0x11,
    Class = 0x12,
    Var = 0x13,
    Array = 0x14,
    GenericInst = 0x15,
    TypedByRef = 0x16,
    IntPtr = 0x18,
    UIntPtr = 0x19,
    FnPtr = 0x1B,
    Object = 0x1C,
    SzArray = 0x1D,
    MVar = 0x1E,
    Unknown = 0xFF,
}

impl TypeCode {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => TypeCode::End,
            0x01 => TypeCode::Void,
            0x02 => TypeCode::Boolean,
            0x03 => TypeCode::Char,
            0x04 => TypeCode::SByte,
            0x05 => TypeCode::Byte,
            0x06 => TypeCode::Int16,
            0x07 => TypeCode::UInt16,
            0x08 => TypeCode::Int32,
            0x09 => TypeCode::UInt32,
            0x0A => TypeCode::Int64,
            0x0B => TypeCode::UInt64,
            0x0C => TypeCode::Single,
            0x0D => TypeCode::Double,
            0x0E => TypeCode::String,
            0x0F => TypeCode::Pointer,
            0x10 => TypeCode::ByRef,
            0x11 => TypeCode::ValueType,
            0x12 => TypeCode::Class,
            0x13 => TypeCode::Var,
            0x14 => TypeCode::Array,
            0x15 => TypeCode::GenericInst,
            0x16 => TypeCode::TypedByRef,
            0x18 => TypeCode::IntPtr,
            0x19 => TypeCode::UIntPtr,
            0x1B => TypeCode::FnPtr,
            0x1C => TypeCode::Object,
            0x1D => TypeCode::SzArray,
            0x1E => TypeCode::MVar,
            _ => TypeCode::Unknown,
        }
    }

    /// Canonical short name emitted for primitive codes
    pub fn display_name(&self) -> &'static str {
        match self {
            TypeCode::End => "End",
            TypeCode::Void => "Void",
            TypeCode::Boolean => "Boolean",
            TypeCode::Char => "Char",
            TypeCode::SByte => "SByte",
            TypeCode::Byte => "Byte",
            TypeCode::Int16 => "Int16",
            TypeCode::UInt16 => "UInt16",
            TypeCode::Int32 => "Int32",
            TypeCode::UInt32 => "UInt32",
            TypeCode::Int64 => "Int64",
            TypeCode::UInt64 => "UInt64",
            TypeCode::Single => "Single",
            TypeCode::Double => "Double",
            TypeCode::String => "String",
            TypeCode::Pointer => "Pointer",
            TypeCode::ByRef => "ByRef",
            TypeCode::ValueType => "ValueType",
            TypeCode::Class => "Class",
            TypeCode::Var => "Var",
            TypeCode::Array => "Array",
            TypeCode::GenericInst => "GenericInst",
            TypeCode::TypedByRef => "TypedByRef",
            TypeCode::IntPtr => "IntPtr",
            TypeCode::UIntPtr => "UIntPtr",
            TypeCode::FnPtr => "FnPtr",
            TypeCode::Object => "Object",
            TypeCode::SzArray => "SzArray",
            TypeCode::MVar => "MVar",
            TypeCode::Unknown => "Unknown",
        }
    }

    /// Codes whose payload points (indirectly) at a class record
    pub fn is_class_like(&self) -> bool {
        matches!(
            self,
            TypeCode::Class | TypeCode::ValueType | TypeCode::SzArray | TypeCode::GenericInst
        )
    }
}
