//! Fixed structure layouts for the inspected runtime
//!
//! PE header offsets follow the on-disk image format; the Mono offsets match
//! the 64-bit mono-2.0-bdwgc layout shipped with Unity 2018+ players. These
//! are byte offsets into structures read verbatim out of the target, so they
//! change only when the runtime's internal layout does.

// --- PE image -------------------------------------------------------------

/// IMAGE_DOS_HEADER.e_lfanew
pub const DOS_E_LFANEW: usize = 0x3C;
/// Export directory RVA slot, relative to the NT headers
pub const NT_EXPORT_DIRECTORY_RVA: usize = 0x88;
/// IMAGE_EXPORT_DIRECTORY.NumberOfFunctions
pub const EXPORT_NUMBER_OF_FUNCTIONS: usize = 0x14;
/// IMAGE_EXPORT_DIRECTORY.AddressOfFunctions
pub const EXPORT_ADDRESS_OF_FUNCTIONS: usize = 0x1C;
/// IMAGE_EXPORT_DIRECTORY.AddressOfNames
pub const EXPORT_ADDRESS_OF_NAMES: usize = 0x20;

// --- Root domain accessor prologue ----------------------------------------

// mono_get_root_domain starts with `mov rax, [rip+disp32]`: the 32-bit
// displacement sits at entry+3 and is relative to the following instruction
// at entry+7.
pub const ROOT_DOMAIN_DISP: u64 = 3;
pub const ROOT_DOMAIN_NEXT_INSN: u64 = 7;

// --- MonoDomain / MonoAssembly --------------------------------------------

/// MonoDomain.domain_assemblies (GSList head)
pub const DOMAIN_ASSEMBLIES: u64 = 0xC8;
/// GSList.next
pub const ASSEMBLY_LIST_NEXT: u64 = 0x8;
/// MonoAssembly.aname.name (char*)
pub const ASSEMBLY_NAME: u64 = 0x10;
/// MonoAssembly.image
pub const ASSEMBLY_IMAGE: u64 = 0x60;

// --- MonoImage class cache -------------------------------------------------

/// MonoImage.class_cache (MonoInternalHashTable, inline)
pub const IMAGE_CLASS_CACHE: u64 = 0x4C0;
/// MonoInternalHashTable.size (bucket count)
pub const HASH_TABLE_SIZE: u64 = 0x18;
/// MonoInternalHashTable.table (bucket array)
pub const HASH_TABLE_TABLE: u64 = 0x20;

// --- MonoClass -------------------------------------------------------------

pub const CLASS_FLAGS: u64 = 0x20;
pub const CLASS_KIND_BITS: u64 = 0x24;
pub const CLASS_INTERFACES: u64 = 0x28;
pub const CLASS_PARENT: u64 = 0x30;
pub const CLASS_NAME: u64 = 0x40;
pub const CLASS_NAMESPACE: u64 = 0x48;
pub const CLASS_INTERFACE_COUNT: u64 = 0x5C;
pub const CLASS_FIELDS: u64 = 0x98;
pub const CLASS_FIELD_COUNT: u64 = 0x100;
pub const CLASS_NEXT_CLASS_CACHE: u64 = 0x108;
/// Bytes fetched per class record (covers everything up to the cache link)
pub const CLASS_RECORD_SIZE: usize = 0x110;

/// ECMA-335 TypeAttributes.Interface
pub const CLASS_FLAG_INTERFACE: u32 = 0x20;
/// Packed class bits: valuetype
pub const CLASS_BIT_VALUETYPE: u32 = 0x1;
/// Packed class bits: enumtype
pub const CLASS_BIT_ENUMTYPE: u32 = 0x2;

// --- MonoClassField --------------------------------------------------------

pub const FIELD_RECORD_SIZE: usize = 0x20;
pub const FIELD_TYPE: usize = 0x0;
pub const FIELD_NAME: usize = 0x8;
pub const FIELD_PARENT: usize = 0x10;
pub const FIELD_OFFSET: usize = 0x18;

// --- MonoType --------------------------------------------------------------

pub const TYPE_RECORD_SIZE: usize = 0xC;
pub const TYPE_DATA: usize = 0x0;
pub const TYPE_ATTRS: usize = 0x8;

/// ECMA-335 FieldAttributes.Static
pub const FIELD_ATTRIBUTE_STATIC: u32 = 0x10;
/// ECMA-335 FieldAttributes.Literal (compile-time constant)
pub const FIELD_ATTRIBUTE_LITERAL: u32 = 0x40;

// --- MonoGenericClass / MonoGenericInst ------------------------------------

/// MonoGenericClass.context.class_inst
pub const GENERIC_CLASS_INST: u64 = 0x8;
/// MonoGenericInst bit-field (packed argument count in the low 22 bits)
pub const GENERIC_INST_BITFIELD: u64 = 0x4;
/// MonoGenericInst.type_argv
pub const GENERIC_INST_ARGV: u64 = 0x8;
/// Mask extracting the packed argument count
pub const GENERIC_INST_COUNT_MASK: u32 = 0x003F_FFFF;
