//! End-to-end reconstruction runs
//!
//! The [`Inspector`] strings the stages together: attach, locate the
//! runtime, copy its image, decode the root-domain accessor, walk to the
//! requested assembly, collect the raw class set, build the hierarchy and
//! export. Each stage feeds the shared progress reporter; stage failures
//! abort the run with their own error variant.

use crate::config::Config;
use crate::core::types::{DumpError, DumpResult};
use crate::memory::{create_backend, BackendKind, MemoryBackend, RemoteReader};
use crate::model::{build_hierarchy, RunCaches, TypeNode};
use crate::output::database::{TypeDatabase, DATABASE_DIR};
use crate::output::export::{format_dump, EXPORT_STAGE_LENGTHS};
use crate::output::progress::ProgressReporter;
use crate::runtime::{
    collect_class_records, find_runtime_module, locate_assembly_image, resolve_export,
    ROOT_DOMAIN_EXPORT,
};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Stage length added per setup step (attach through assembly location).
/// Five setup steps plus the walk, hierarchy and export stages sum to the
/// progress total.
const SETUP_STEP_LENGTH: f64 = 0.4;

/// What to dump and where to put it
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Process name or pid, as understood by the selected backend
    pub process: String,
    /// Assembly to reconstruct, compared case-sensitively
    pub assembly: String,
    /// Text dump destination; `None` keeps the dump in memory only
    pub output_path: Option<PathBuf>,
    pub backend: BackendKind,
    /// Include kind tags and value-kind markers in the text dump
    pub verbose: bool,
    /// Directory the binary type database is saved under
    pub database_dir: PathBuf,
}

impl DumpOptions {
    pub fn new(process: impl Into<String>) -> Self {
        DumpOptions {
            process: process.into(),
            assembly: "Assembly-CSharp".to_string(),
            output_path: None,
            backend: BackendKind::Process,
            verbose: true,
            database_dir: PathBuf::from(DATABASE_DIR),
        }
    }
}

/// Everything a finished run produced
#[derive(Debug)]
pub struct DumpReport {
    pub types: Vec<TypeNode>,
    pub text: String,
    pub database_path: Option<PathBuf>,
}

/// One-shot reconstruction driver
pub struct Inspector {
    config: Config,
    progress: ProgressReporter,
}

impl Inspector {
    pub fn new(config: Config) -> Self {
        Inspector {
            config,
            progress: ProgressReporter::disabled(),
        }
    }

    /// Driver that reports normalized progress to `callback`
    pub fn with_progress(config: Config, callback: Box<dyn Fn(f32) + Send + Sync>) -> Self {
        Inspector {
            config,
            progress: ProgressReporter::new(callback),
        }
    }

    /// Run against the backend selected in the options
    pub fn run(&self, options: &DumpOptions) -> DumpResult<DumpReport> {
        let backend = create_backend(options.backend)?;
        self.run_with_backend(backend, options)
    }

    /// Run against a caller-supplied backend
    pub fn run_with_backend(
        &self,
        backend: Box<dyn MemoryBackend>,
        options: &DumpOptions,
    ) -> DumpResult<DumpReport> {
        let mut reader = RemoteReader::new(backend);

        if !reader.attach(&options.process) {
            return Err(DumpError::AttachFailed(options.process.clone()));
        }
        info!(process = %options.process, "attached to target");
        self.progress.add(SETUP_STEP_LENGTH);

        let module = find_runtime_module(&reader)?;
        self.progress.add(SETUP_STEP_LENGTH);

        // One bulk copy of the loaded image; export RVAs index it directly
        let image_copy = reader
            .read_bytes(module.base_address, module.size)
            .ok_or_else(|| DumpError::module_copy_failed(module.base_address, module.size))?;
        self.progress.add(SETUP_STEP_LENGTH);

        let accessor = resolve_export(
            &image_copy,
            &module,
            ROOT_DOMAIN_EXPORT,
            self.config.workers,
        )?;
        drop(image_copy);
        self.progress.add(SETUP_STEP_LENGTH);

        let image = locate_assembly_image(&reader, accessor, &options.assembly)?;
        self.progress.add(SETUP_STEP_LENGTH);

        let records = collect_class_records(&reader, image, self.config.workers, &self.progress)?;

        let caches = RunCaches::new();
        let types = build_hierarchy(
            &reader,
            &records,
            &caches,
            &self.config.limits,
            self.config.workers,
            &self.progress,
        )?;
        info!(
            types = types.len(),
            names_cached = caches.name_count(),
            types_cached = caches.type_count(),
            "model built"
        );

        let text = format_dump(&types, options.verbose, self.config.limits.field_offset_bound);

        let mut database_path = None;
        if let Some(path) = &options.output_path {
            fs::write(path, &text)?;
            info!(path = %path.display(), "text dump written");

            let database = TypeDatabase::new(&options.process, &options.assembly, types.clone());
            database_path = Some(database.save(&options.database_dir)?);
        }
        self.progress.add(EXPORT_STAGE_LENGTHS);
        self.progress.finish();

        Ok(DumpReport {
            types,
            text,
            database_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Address, ModuleInfo};

    /// Backend that attaches to nothing
    struct DeafBackend;

    impl MemoryBackend for DeafBackend {
        fn attach(&mut self, _target: &str) -> bool {
            false
        }

        fn module_by_name(&self, _name: &str) -> Option<ModuleInfo> {
            None
        }

        fn read_bytes(&self, _address: Address, _len: usize) -> Option<Vec<u8>> {
            None
        }
    }

    /// Backend that attaches but exposes no runtime module
    struct EmptyBackend;

    impl MemoryBackend for EmptyBackend {
        fn attach(&mut self, _target: &str) -> bool {
            true
        }

        fn module_by_name(&self, _name: &str) -> Option<ModuleInfo> {
            None
        }

        fn read_bytes(&self, _address: Address, _len: usize) -> Option<Vec<u8>> {
            None
        }
    }

    #[test]
    fn test_attach_failure_is_fatal() {
        let inspector = Inspector::new(Config::default());
        let options = DumpOptions::new("missing.exe");
        let result = inspector.run_with_backend(Box::new(DeafBackend), &options);
        assert!(matches!(result, Err(DumpError::AttachFailed(p)) if p == "missing.exe"));
    }

    #[test]
    fn test_missing_runtime_module_is_fatal() {
        let inspector = Inspector::new(Config::default());
        let options = DumpOptions::new("game.exe");
        let result = inspector.run_with_backend(Box::new(EmptyBackend), &options);
        assert!(matches!(result, Err(DumpError::RuntimeModuleNotFound)));
    }

    #[test]
    fn test_default_options() {
        let options = DumpOptions::new("game.exe");
        assert_eq!(options.assembly, "Assembly-CSharp");
        assert_eq!(options.backend, BackendKind::Process);
        assert!(options.verbose);
        assert_eq!(options.database_dir, PathBuf::from("typedbs"));
    }
}
