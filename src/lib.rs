//! monodump reconstructs a Mono runtime's type model out of a remote
//! process image.
//!
//! The pipeline attaches to a running Unity player, locates the Mono
//! runtime module, decodes the root-domain accessor out of its export
//! table, walks the domain's assembly list to the requested assembly and
//! collects every class record reachable from the image's class cache.
//! The raw records are resolved into a sorted, linked type arena which can
//! be exported as diffable text or saved as a compressed binary database.
//!
//! The target is treated as a moving, potentially hostile address space:
//! every remote read may fail, and failures degrade to sentinel values or
//! truncated chains rather than aborting the run.
//!
//! # Example
//!
//! ```no_run
//! use monodump::{Config, DumpOptions, Inspector};
//!
//! # fn main() -> anyhow::Result<()> {
//! let inspector = Inspector::new(Config::default());
//! let report = inspector.run(&DumpOptions::new("game.exe"))?;
//! println!("{}", report.text);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod inspector;
pub mod memory;
pub mod model;
pub mod output;
pub mod runtime;

pub use config::Config;
pub use core::types::{Address, DumpError, DumpResult, ModuleInfo};
pub use inspector::{DumpOptions, DumpReport, Inspector};
pub use memory::{BackendKind, MemoryBackend, RemoteReader};
pub use model::TypeNode;
pub use output::TypeDatabase;
