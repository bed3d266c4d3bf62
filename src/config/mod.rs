//! Configuration for a reconstruction run
//!
//! The bounds that guard pointer-following against recovered garbage are
//! deliberately configuration, not constants: they are heuristics tied to
//! observed runtime layouts and differ between targets.

use crate::core::types::{DumpError, DumpResult, DEFAULT_ADDRESS_FLOOR};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Guard bounds applied to every remote pointer dereference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum generic type arguments expanded per instantiation
    pub max_generic_params: u32,
    /// Maximum generic-expansion recursion depth per top-level field
    pub max_recursion_depth: u32,
    /// Field offsets beyond this are treated as corrupt records
    pub field_offset_bound: i32,
    /// Pointers below this are treated as definitively invalid
    pub min_valid_address: u64,
    /// Bytes fetched per remote name read
    pub name_read_len: usize,
    /// Field counts beyond this mark an unparsable field list
    pub max_field_count: i32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_generic_params: 10,
            max_recursion_depth: 30,
            field_offset_bound: 0x2000,
            min_valid_address: DEFAULT_ADDRESS_FLOOR,
            name_read_len: 1024,
            max_field_count: 0x1000,
        }
    }
}

/// Logging settings for the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
        }
    }
}

/// Top-level run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker cap for the parallel phases (export scan, bucket walk)
    pub workers: usize,
    pub limits: Limits,
    pub logging: LoggingSettings,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workers: 4.min(num_cpus::get()),
            limits: Limits::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing sections
    pub fn load(path: &Path) -> DumpResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| DumpError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional path, defaulting when no file is given
    pub fn load_or_default(path: Option<&Path>) -> DumpResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Config::default()),
        }
    }

    /// Check that the configured bounds are usable
    pub fn validate(&self) -> DumpResult<()> {
        if self.workers == 0 {
            return Err(DumpError::Config("workers must be at least 1".to_string()));
        }
        if self.limits.max_recursion_depth == 0 {
            return Err(DumpError::Config(
                "limits.max_recursion_depth must be at least 1".to_string(),
            ));
        }
        if self.limits.field_offset_bound <= 0 {
            return Err(DumpError::Config(
                "limits.field_offset_bound must be positive".to_string(),
            ));
        }
        if self.limits.name_read_len == 0 {
            return Err(DumpError::Config(
                "limits.name_read_len must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = Config::default();
        assert_eq!(config.limits.max_generic_params, 10);
        assert_eq!(config.limits.max_recursion_depth, 30);
        assert_eq!(config.limits.field_offset_bound, 0x2000);
        assert_eq!(config.limits.min_valid_address, 0x1000_0000);
        assert!(config.workers >= 1 && config.workers <= 4);
        config.validate().unwrap();
    }

    #[test]
    fn test_validation_rejects_zero_workers() {
        let mut config = Config::default();
        config.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_depth() {
        let mut config = Config::default();
        config.limits.max_recursion_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        assert!(serialized.contains("max_generic_params"));

        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(
            deserialized.limits.field_offset_bound,
            config.limits.field_offset_bound
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("workers = 2\n").unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.limits.max_generic_params, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("does-not-exist.toml"));
        assert!(result.is_err());
    }
}
