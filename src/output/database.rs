//! Persistent type databases
//!
//! A finished reconstruction can be saved as a compact binary database and
//! reloaded later without touching the target again. Files are
//! bincode-encoded, gzip-compressed and named after the process/assembly
//! pair they were dumped from.

use crate::core::types::DumpResult;
use crate::core::VERSION;
use crate::model::TypeNode;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// File extension for saved type databases
pub const DATABASE_EXTENSION: &str = "mtd";

/// Default directory databases are saved under
pub const DATABASE_DIR: &str = "typedbs";

/// A saved reconstruction: provenance plus the full type arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDatabase {
    pub process: String,
    pub assembly: String,
    /// Version of the tool that produced the file
    pub version: String,
    /// Unix timestamp of the run
    pub created_unix: u64,
    pub types: Vec<TypeNode>,
}

impl TypeDatabase {
    pub fn new(process: &str, assembly: &str, types: Vec<TypeNode>) -> Self {
        let created_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        TypeDatabase {
            process: process.to_string(),
            assembly: assembly.to_string(),
            version: VERSION.to_string(),
            created_unix,
            types,
        }
    }

    /// Save under `dir`, creating it if needed. Returns the written path.
    pub fn save(&self, dir: &Path) -> DumpResult<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(database_file_name(&self.process, &self.assembly));

        let file = File::create(&path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        bincode::serialize_into(&mut encoder, self)?;
        encoder.try_finish()?;

        info!(path = %path.display(), types = self.types.len(), "type database saved");
        Ok(path)
    }

    /// Load a previously saved database
    pub fn load(path: &Path) -> DumpResult<Self> {
        let file = File::open(path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        let database = bincode::deserialize_from(decoder)?;
        Ok(database)
    }
}

/// Canonical file name for a process/assembly pair
pub fn database_file_name(process: &str, assembly: &str) -> String {
    format!(
        "{}.{}",
        sanitize_file_name(&format!("{} {}", process, assembly)).to_lowercase(),
        DATABASE_EXTENSION
    )
}

/// List every saved database under `dir`, newest first by file name
pub fn list_databases(dir: &Path) -> DumpResult<Vec<PathBuf>> {
    let mut found = Vec::new();
    if !dir.is_dir() {
        return Ok(found);
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some(DATABASE_EXTENSION) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// Keep file names portable: anything outside a conservative set becomes '_'
fn sanitize_file_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
