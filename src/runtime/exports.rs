//! Export resolution over a locally copied module image
//!
//! The runtime module is pulled into local memory once; from there the walk
//! is pure byte arithmetic over the PE export directory. The image copy uses
//! the loaded (virtual) layout, so RVAs index the buffer directly.

use crate::core::types::{Address, DumpError, DumpResult, ModuleInfo};
use crate::runtime::offsets;
use rayon::prelude::*;
use tracing::debug;

/// Bounds-checked little-endian u32 read out of the image copy
fn u32_at(image: &[u8], offset: usize) -> Option<u32> {
    let bytes = image.get(offset..offset + 4)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

/// NUL-terminated ASCII name at an RVA inside the image copy
fn name_at(image: &[u8], offset: usize) -> Option<&[u8]> {
    let tail = image.get(offset..)?;
    let len = tail.iter().position(|&b| b == 0)?;
    Some(&tail[..len])
}

/// Resolve a named export to its absolute address in the target.
///
/// Scans the export name-pointer array in parallel (4-byte index strides,
/// first exact match wins) and maps the matching index into the parallel
/// function-address array. An absent export is fatal: nothing downstream can
/// run without the root-domain accessor.
pub fn resolve_export(
    image: &[u8],
    module: &ModuleInfo,
    export_name: &str,
    workers: usize,
) -> DumpResult<Address> {
    let not_found = || DumpError::ExportNotFound(export_name.to_string());

    let e_lfanew = u32_at(image, offsets::DOS_E_LFANEW).ok_or_else(not_found)? as usize;
    let export_dir =
        u32_at(image, e_lfanew + offsets::NT_EXPORT_DIRECTORY_RVA).ok_or_else(not_found)? as usize;

    let function_count =
        u32_at(image, export_dir + offsets::EXPORT_NUMBER_OF_FUNCTIONS).ok_or_else(not_found)?;
    let functions_rva =
        u32_at(image, export_dir + offsets::EXPORT_ADDRESS_OF_FUNCTIONS).ok_or_else(not_found)? as usize;
    let names_rva =
        u32_at(image, export_dir + offsets::EXPORT_ADDRESS_OF_NAMES).ok_or_else(not_found)? as usize;

    debug!(
        "walking export directory: e_lfanew=0x{:X} export_dir=0x{:X} functions={}",
        e_lfanew, export_dir, function_count
    );

    let target = export_name.as_bytes();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| DumpError::Config(e.to_string()))?;

    let rva = pool.install(|| {
        (0..function_count as usize).into_par_iter().find_map_any(|i| {
            let name_rva = u32_at(image, names_rva + i * 4)? as usize;
            if name_at(image, name_rva)? != target {
                return None;
            }
            u32_at(image, functions_rva + i * 4)
        })
    });

    match rva {
        Some(rva) => Ok(module.base_address + rva as u64),
        None => Err(not_found()),
    }
}
