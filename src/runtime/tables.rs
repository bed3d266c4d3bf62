//! Class hash-table collection
//!
//! Walks every bucket of the image's class cache concurrently, copying out
//! the full raw record behind each live pointer. The target is a moving
//! process: a chain that turns unreadable mid-walk simply ends there, losing
//! only the remainder of that one bucket.

use crate::core::types::{Address, DumpError, DumpResult};
use crate::memory::RemoteReader;
use crate::output::progress::ProgressReporter;
use crate::runtime::offsets;
use crate::runtime::records::RawClassRecord;
use dashmap::DashMap;
use rayon::prelude::*;
use tracing::{info, warn};

/// Bucket counts beyond this mark a misread header rather than a real table
const MAX_BUCKET_COUNT: i32 = 1_000_000;

/// Stage lengths this walk contributes to the progress total
pub const WALK_STAGE_LENGTHS: f64 = 2.0;

/// Collect every reachable class record out of the image's class cache.
///
/// Records are keyed by their own remote address; a pointer seen through two
/// chains lands on the same key and the re-read is idempotent within a run.
pub fn collect_class_records(
    reader: &RemoteReader,
    image: Address,
    workers: usize,
    progress: &ProgressReporter,
) -> DumpResult<DashMap<u64, RawClassRecord>> {
    let cache = image + offsets::IMAGE_CLASS_CACHE;
    let bucket_count = reader.read_i32(cache + offsets::HASH_TABLE_SIZE);
    let table = Address::new(reader.read_u64(cache + offsets::HASH_TABLE_TABLE));

    let records: DashMap<u64, RawClassRecord> = DashMap::new();

    if bucket_count <= 0 || bucket_count > MAX_BUCKET_COUNT {
        warn!(bucket_count, "class cache header looks corrupt, skipping walk");
        progress.add(WALK_STAGE_LENGTHS);
        return Ok(records);
    }

    info!(bucket_count, "processing class cache buckets");
    let increment = WALK_STAGE_LENGTHS / bucket_count as f64;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| DumpError::Config(e.to_string()))?;

    pool.install(|| {
        (0..bucket_count as u64).into_par_iter().for_each(|i| {
            let mut class_ptr = reader.read_u64(table + i * 8);
            while class_ptr != 0 {
                match RawClassRecord::read(reader, Address::new(class_ptr)) {
                    Some(record) => {
                        records.insert(class_ptr, record);
                    }
                    // Unreadable link: drop the rest of this chain only
                    None => break,
                }
                class_ptr = reader.read_u64(Address::new(class_ptr) + offsets::CLASS_NEXT_CLASS_CACHE);
            }
            progress.add(increment);
        });
    });

    info!(classes = records.len(), "class collection complete");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ModuleInfo;
    use crate::memory::MemoryBackend;
    use std::collections::HashMap;

    struct Synthetic {
        regions: HashMap<u64, Vec<u8>>,
    }

    impl Synthetic {
        fn new() -> Self {
            Synthetic {
                regions: HashMap::new(),
            }
        }

        fn put(&mut self, address: u64, data: &[u8]) {
            self.regions.insert(address, data.to_vec());
        }

        fn put_u64(&mut self, address: u64, value: u64) {
            self.put(address, &value.to_le_bytes());
        }

        fn put_class(&mut self, address: u64, next: u64) {
            let mut buf = vec![0u8; offsets::CLASS_RECORD_SIZE];
            buf[offsets::CLASS_NEXT_CLASS_CACHE as usize..offsets::CLASS_NEXT_CLASS_CACHE as usize + 8]
                .copy_from_slice(&next.to_le_bytes());
            self.put(address, &buf);
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
            for (&base, region) in &self.regions {
                let addr = address.as_u64();
                if addr >= base && addr < base + region.len() as u64 {
                    let start = (addr - base) as usize;
                    let end = (start + len).min(region.len());
                    let mut out = region[start..end].to_vec();
                    out.resize(len, 0);
                    return Some(out);
                }
            }
            None
        }
    }

    const IMAGE: u64 = 0x2500_0000;
    const TABLE: u64 = 0x2600_0000;

    fn with_header(mem: &mut Synthetic, bucket_count: i32) {
        let cache = IMAGE + offsets::IMAGE_CLASS_CACHE;
        mem.put(
            cache + offsets::HASH_TABLE_SIZE,
            &bucket_count.to_le_bytes(),
        );
        mem.put_u64(cache + offsets::HASH_TABLE_TABLE, TABLE);
    }

    #[test]
    fn test_collects_all_chains() {
        let mut mem = Synthetic::new();
        with_header(&mut mem, 2);

        // Bucket 0: a -> b, bucket 1: c
        let (a, b, c) = (0x3000_0000u64, 0x3000_1000u64, 0x3000_2000u64);
        mem.put_u64(TABLE, a);
        mem.put_u64(TABLE + 8, c);
        mem.put_class(a, b);
        mem.put_class(b, 0);
        mem.put_class(c, 0);

        let reader = RemoteReader::new(Box::new(mem));
        let progress = ProgressReporter::disabled();
        let records = collect_class_records(&reader, Address::new(IMAGE), 2, &progress).unwrap();

        assert_eq!(records.len(), 3);
        assert!(records.contains_key(&a));
        assert!(records.contains_key(&b));
        assert!(records.contains_key(&c));
    }

    #[test]
    fn test_broken_chain_loses_tail_only() {
        let mut mem = Synthetic::new();
        with_header(&mut mem, 2);

        // Bucket 0: a -> (unreadable) -> never seen; bucket 1: c still walks
        let (a, c) = (0x3000_0000u64, 0x3000_2000u64);
        mem.put_u64(TABLE, a);
        mem.put_u64(TABLE + 8, c);
        mem.put_class(a, 0xDEAD_0000_0000); // dangling link, not mapped
        mem.put_class(c, 0);

        let reader = RemoteReader::new(Box::new(mem));
        let progress = ProgressReporter::disabled();
        let records = collect_class_records(&reader, Address::new(IMAGE), 2, &progress).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.contains_key(&a));
        assert!(records.contains_key(&c));
    }

    #[test]
    fn test_corrupt_header_yields_empty_set() {
        let mut mem = Synthetic::new();
        with_header(&mut mem, -5);

        let reader = RemoteReader::new(Box::new(mem));
        let progress = ProgressReporter::disabled();
        let records = collect_class_records(&reader, Address::new(IMAGE), 2, &progress).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_duplicate_pointers_deduplicate() {
        let mut mem = Synthetic::new();
        with_header(&mut mem, 2);

        // Both buckets point at the same record
        let a = 0x3000_0000u64;
        mem.put_u64(TABLE, a);
        mem.put_u64(TABLE + 8, a);
        mem.put_class(a, 0);

        let reader = RemoteReader::new(Box::new(mem));
        let progress = ProgressReporter::disabled();
        let records = collect_class_records(&reader, Address::new(IMAGE), 2, &progress).unwrap();
        assert_eq!(records.len(), 1);
    }
}
