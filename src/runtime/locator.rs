//! Runtime structure location: root domain and assembly image
//!
//! The root-domain accessor's prologue encodes the address of the runtime's
//! global domain pointer; from the domain everything else is reachable by
//! following the assembly list.

use crate::core::types::{Address, DumpError, DumpResult, ModuleInfo};
use crate::memory::RemoteReader;
use crate::runtime::offsets;
use tracing::{debug, info};

/// Module names the supported runtime family ships under. The non-bdwgc
/// variants use a different structure layout and are not supported.
const RUNTIME_MODULE_NAMES: &[&str] = &["mono-2.0-bdwgc.dll"];

/// Longest assembly name fetched during the list walk
const ASSEMBLY_NAME_READ_LEN: usize = 1024;

/// Find the runtime module inside the attached target
pub fn find_runtime_module(reader: &RemoteReader) -> DumpResult<ModuleInfo> {
    for name in RUNTIME_MODULE_NAMES {
        if let Some(module) = reader.module_by_name(name) {
            info!(
                module = %module.name,
                base = %module.base_address,
                size = module.size,
                "runtime module located"
            );
            return Ok(module);
        }
    }
    Err(DumpError::RuntimeModuleNotFound)
}

/// Decode the root-domain accessor's prologue into the live domain address.
///
/// The function starts with `mov rax, [rip+disp32]`; the displacement at
/// entry+3 is relative to the following instruction, giving the address of
/// the global domain pointer.
pub fn read_root_domain(reader: &RemoteReader, accessor: Address) -> Address {
    let displacement = reader.read_u32(accessor + offsets::ROOT_DOMAIN_DISP) as u64;
    let domain_slot = accessor + offsets::ROOT_DOMAIN_NEXT_INSN + displacement;
    let domain = Address::new(reader.read_u64(domain_slot));
    debug!(slot = %domain_slot, domain = %domain, "root domain resolved");
    domain
}

/// Walk the domain's assembly list for the named assembly and return its
/// metadata image address.
///
/// Names compare case-sensitively; an exhausted list is fatal.
pub fn locate_assembly_image(
    reader: &RemoteReader,
    accessor: Address,
    assembly_name: &str,
) -> DumpResult<Address> {
    let domain = read_root_domain(reader, accessor);

    let mut cell = reader.read_u64(domain + offsets::DOMAIN_ASSEMBLIES);
    while cell != 0 {
        let assembly = Address::new(reader.read_u64(Address::new(cell)));
        let name_ptr = Address::new(reader.read_u64(assembly + offsets::ASSEMBLY_NAME));

        if let Some(name) = reader.read_c_string(name_ptr, ASSEMBLY_NAME_READ_LEN) {
            if name == assembly_name {
                let image = Address::new(reader.read_u64(assembly + offsets::ASSEMBLY_IMAGE));
                info!(assembly = assembly_name, image = %image, "assembly image located");
                return Ok(image);
            }
        }

        cell = reader.read_u64(Address::new(cell) + offsets::ASSEMBLY_LIST_NEXT);
    }

    Err(DumpError::AssemblyNotFound(assembly_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use std::collections::BTreeMap;

    /// Flat synthetic address space
    struct Synthetic {
        bytes: BTreeMap<u64, u8>,
    }

    impl Synthetic {
        fn new() -> Self {
            Synthetic {
                bytes: BTreeMap::new(),
            }
        }

        fn put(&mut self, address: u64, data: &[u8]) {
            for (i, b) in data.iter().enumerate() {
                self.bytes.insert(address + i as u64, *b);
            }
        }

        fn put_u64(&mut self, address: u64, value: u64) {
            self.put(address, &value.to_le_bytes());
        }
    }

    impl MemoryBackend for Synthetic {
        fn attach(&mut self, _target: &str) -> bool {
            true
        }

        fn module_by_name(&self, _name: &str) -> Option<ModuleInfo> {
            None
        }

        fn read_bytes(&self, address: Address, len: usize) -> Option<Vec<u8>> {
            let base = address.as_u64();
            if !self.bytes.contains_key(&base) {
                return None;
            }
            Some(
                (0..len as u64)
                    .map(|i| self.bytes.get(&(base + i)).copied().unwrap_or(0))
                    .collect(),
            )
        }
    }

    const ACCESSOR: u64 = 0x7FF6_0000_1000;
    const DOMAIN: u64 = 0x2100_0000;

    /// Lay out accessor prologue, domain and a two-entry assembly list
    fn build_space() -> Synthetic {
        let mut mem = Synthetic::new();

        // mov rax, [rip+0x100] -> slot at accessor + 7 + 0x100
        mem.put(ACCESSOR, &[0x48, 0x8B, 0x05]);
        mem.put(ACCESSOR + 3, &0x100u32.to_le_bytes());
        mem.put_u64(ACCESSOR + 7 + 0x100, DOMAIN);

        // Assembly list: cell1 -> cell2 -> null
        let (cell1, cell2) = (0x2200_0000u64, 0x2200_0100u64);
        let (asm1, asm2) = (0x2300_0000u64, 0x2300_1000u64);
        let (name1, name2) = (0x2400_0000u64, 0x2400_0100u64);

        mem.put_u64(DOMAIN + offsets::DOMAIN_ASSEMBLIES, cell1);
        mem.put_u64(cell1, asm1);
        mem.put_u64(cell1 + offsets::ASSEMBLY_LIST_NEXT, cell2);
        mem.put_u64(cell2, asm2);
        mem.put_u64(cell2 + offsets::ASSEMBLY_LIST_NEXT, 0);

        mem.put_u64(asm1 + offsets::ASSEMBLY_NAME, name1);
        mem.put(name1, b"mscorlib\0");
        mem.put_u64(asm1 + offsets::ASSEMBLY_IMAGE, 0x2500_0000);

        mem.put_u64(asm2 + offsets::ASSEMBLY_NAME, name2);
        mem.put(name2, b"Target\0");
        mem.put_u64(asm2 + offsets::ASSEMBLY_IMAGE, 0x2600_0000);

        mem
    }

    #[test]
    fn test_root_domain_decode() {
        let reader = RemoteReader::new(Box::new(build_space()));
        assert_eq!(
            read_root_domain(&reader, Address::new(ACCESSOR)),
            Address::new(DOMAIN)
        );
    }

    #[test]
    fn test_assembly_found_by_exact_name() {
        let reader = RemoteReader::new(Box::new(build_space()));
        let image = locate_assembly_image(&reader, Address::new(ACCESSOR), "Target").unwrap();
        assert_eq!(image, Address::new(0x2600_0000));
    }

    #[test]
    fn test_name_comparison_is_case_sensitive() {
        let reader = RemoteReader::new(Box::new(build_space()));
        let result = locate_assembly_image(&reader, Address::new(ACCESSOR), "target");
        assert!(matches!(result, Err(DumpError::AssemblyNotFound(_))));
    }

    #[test]
    fn test_exhausted_list_is_fatal() {
        let reader = RemoteReader::new(Box::new(build_space()));
        let result = locate_assembly_image(&reader, Address::new(ACCESSOR), "Missing");
        assert!(matches!(result, Err(DumpError::AssemblyNotFound(name)) if name == "Missing"));
    }

    #[test]
    fn test_runtime_module_not_found() {
        let reader = RemoteReader::new(Box::new(build_space()));
        assert!(matches!(
            find_runtime_module(&reader),
            Err(DumpError::RuntimeModuleNotFound)
        ));
    }
}
