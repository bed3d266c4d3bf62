//! Command-line entry point

use anyhow::{Context, Result};
use clap::Parser;
use monodump::memory::BackendKind;
use monodump::output::{format_dump, TypeDatabase, DATABASE_DIR};
use monodump::{Config, DumpOptions, Inspector};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Reconstructs a Mono runtime's type model from a remote process image
#[derive(Parser, Debug)]
#[command(name = "monodump", version, about)]
struct Args {
    /// Target process name (e.g. game.exe) or pid; not needed with --from-db
    #[arg(required_unless_present = "from_db")]
    process: Option<String>,

    /// Assembly to reconstruct (case-sensitive)
    #[arg(short, long, default_value = "Assembly-CSharp")]
    assembly: String,

    /// Write the text dump here; omit to print to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Memory acquisition backend
    #[arg(long, default_value = "process")]
    backend: BackendKind,

    /// Drop kind tags and value-kind markers from the dump
    #[arg(long)]
    plain: bool,

    /// Directory the binary type database is saved under
    #[arg(long, default_value = DATABASE_DIR)]
    database_dir: PathBuf,

    /// Re-render a saved type database instead of attaching to a process
    #[arg(long)]
    from_db: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(args: &Args, config: &Config) {
    let level = if args.verbose {
        "debug"
    } else {
        &config.logging.level
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("monodump={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Progress callback printing whole-percent steps to stderr
fn progress_printer() -> Box<dyn Fn(f32) + Send + Sync> {
    let last = Arc::new(AtomicU32::new(u32::MAX));
    Box::new(move |fraction| {
        let percent = (fraction * 100.0) as u32;
        if last.swap(percent, Ordering::Relaxed) != percent {
            eprint!("\r{:>3}%", percent);
            if percent >= 100 {
                eprintln!();
            }
        }
    })
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load_or_default(args.config.as_deref())?;
    init_logging(&args, &config);

    if let Some(path) = &args.from_db {
        let database = TypeDatabase::load(path)?;
        let text = format_dump(
            &database.types,
            !args.plain,
            config.limits.field_offset_bound,
        );
        match &args.output {
            Some(out) => std::fs::write(out, text)?,
            None => print!("{}", text),
        }
        return Ok(());
    }

    let process = args
        .process
        .clone()
        .context("a target process is required")?;
    let options = DumpOptions {
        process,
        assembly: args.assembly.clone(),
        output_path: args.output.clone(),
        backend: args.backend,
        verbose: !args.plain,
        database_dir: args.database_dir.clone(),
    };

    let inspector = Inspector::with_progress(config, progress_printer());
    let report = inspector.run(&options)?;

    match &args.output {
        Some(path) => {
            eprintln!(
                "{} types written to {}",
                report.types.len(),
                path.display()
            );
            if let Some(database) = &report.database_path {
                eprintln!("type database saved to {}", database.display());
            }
        }
        None => print!("{}", report.text),
    }

    Ok(())
}
