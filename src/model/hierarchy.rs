//! Arena-style type hierarchy construction
//!
//! The collected raw records carry remote parent and interface pointers.
//! Nodes are built for every record first, sorted by full name, and only
//! then linked: a pointer resolves to an in-arena index when its target was
//! collected in the same run, and to nothing otherwise. Cross-assembly
//! parents therefore show up as roots rather than dangling references.

use crate::config::Limits;
use crate::core::types::{DumpError, DumpResult};
use crate::memory::RemoteReader;
use crate::model::cache::RunCaches;
use crate::model::fields::{FieldResolver, FieldSlot};
use crate::output::progress::ProgressReporter;
use crate::runtime::records::{ClassKind, RawClassRecord};
use dashmap::DashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Stage lengths the hierarchy build contributes to the progress total
pub const HIERARCHY_STAGE_LENGTHS: f64 = 3.0;

/// One type in the reconstructed model.
///
/// `parent` and `interfaces` are indices into the same arena; both are
/// present only when the referenced type was collected in this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    /// Remote address of the class record this node was built from
    pub address: u64,
    pub name: String,
    pub namespace: String,
    pub full_name: String,
    pub kind: ClassKind,
    pub parent: Option<usize>,
    pub interfaces: Vec<usize>,
    pub fields: Vec<FieldSlot>,
}

struct Staged {
    node: TypeNode,
    parent_ptr: u64,
    interface_ptrs: Vec<u64>,
}

/// Build the sorted, fully linked type arena from the raw class set
pub fn build_hierarchy(
    reader: &RemoteReader,
    records: &DashMap<u64, RawClassRecord>,
    caches: &RunCaches,
    limits: &Limits,
    workers: usize,
    progress: &ProgressReporter,
) -> DumpResult<Vec<TypeNode>> {
    if records.is_empty() {
        progress.add(HIERARCHY_STAGE_LENGTHS);
        return Ok(Vec::new());
    }

    let raw: Vec<RawClassRecord> = records.iter().map(|entry| entry.value().clone()).collect();
    let increment = HIERARCHY_STAGE_LENGTHS / raw.len() as f64;
    let resolver = FieldResolver::new(reader, caches, limits);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| DumpError::Config(e.to_string()))?;

    let mut staged: Vec<Staged> = pool.install(|| {
        raw.into_par_iter()
            .map(|record| {
                let result = stage_record(reader, &resolver, limits, &record);
                progress.add(increment);
                result
            })
            .collect()
    });

    // Ordinal sort by full name; address breaks ties deterministically
    staged.sort_by(|a, b| {
        a.node
            .full_name
            .cmp(&b.node.full_name)
            .then(a.node.address.cmp(&b.node.address))
    });

    let index_of: HashMap<u64, usize> = staged
        .iter()
        .enumerate()
        .map(|(i, s)| (s.node.address, i))
        .collect();

    let nodes: Vec<TypeNode> = staged
        .into_iter()
        .map(|staged| {
            let mut node = staged.node;
            node.parent = index_of.get(&staged.parent_ptr).copied();
            node.interfaces = staged
                .interface_ptrs
                .iter()
                .filter_map(|ptr| index_of.get(ptr).copied())
                .collect();
            node
        })
        .collect();

    info!(types = nodes.len(), "type hierarchy linked");
    Ok(nodes)
}

fn stage_record(
    reader: &RemoteReader,
    resolver: &FieldResolver<'_>,
    limits: &Limits,
    record: &RawClassRecord,
) -> Staged {
    let names = resolver.class_names(record);

    let node = TypeNode {
        address: record.address.as_u64(),
        name: names.name,
        namespace: names.namespace,
        full_name: names.full,
        kind: record.kind(),
        parent: None,
        interfaces: Vec::new(),
        fields: resolver.resolve_class_fields(record),
    };

    Staged {
        node,
        parent_ptr: record.parent_ptr.as_u64(),
        interface_ptrs: read_interface_ptrs(reader, limits, record),
    }
}

/// The interface list is a flat array of class-record pointers
fn read_interface_ptrs(
    reader: &RemoteReader,
    limits: &Limits,
    record: &RawClassRecord,
) -> Vec<u64> {
    let count = record.interface_count as usize;
    if count == 0 || !record.interfaces_ptr.is_plausible(limits.min_valid_address) {
        return Vec::new();
    }
    let Some(buf) = reader.read_bytes(record.interfaces_ptr, count * 8) else {
        return Vec::new();
    };
    buf.chunks_exact(8)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            u64::from_le_bytes(bytes)
        })
        .collect()
}
