//! # Sumally Core
//!
//! Byte accounting for storage namespaces.
//!
//! ## Pipeline
//!
//! ```text
//! target/<registry id>        list/*.list            csv/*.csv
//!     │                           │                      │
//!     ├──> Registry (id,name)     │                      │
//!     │                           ├──> SizeIndex         │
//!     │                           │    (path -> bytes)   │
//!     └──────────────┬────────────┘                      │
//!                    └──> Aggregator <───────────────────┘
//!                           └─> FileStat per (namespace, csv file)
//!                                  │
//!                                  ├──> summarize (namespace + total sums)
//!                                  └──> Report (result.yaml)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use sumally_core::{run_and_write, TallyConfig};
//!
//! fn main() -> sumally_core::Result<()> {
//!     let config = TallyConfig::with_root("/data/billing");
//!     let (outcome, path) = run_and_write(&config)?;
//!
//!     println!("{} -> {}", outcome.report.registry.sum_str, path.display());
//!     Ok(())
//! }
//! ```

mod aggregate;
mod config;
mod error;
mod lines;
mod pipeline;
mod registry;
mod report;
mod scanner;
mod size_index;
mod stats;
mod summary;

pub use aggregate::Aggregator;
pub use config::{OutputFormat, TallyConfig};
pub use error::{Result, TallyError};
pub use pipeline::{run, run_and_write, RunOutcome};
pub use registry::{FileStat, NamespaceRecord, Registry};
pub use report::Report;
pub use scanner::{base_name, FileScanner};
pub use size_index::SizeIndex;
pub use stats::{JoinStats, PipelineStats};
pub use summary::{format_bytes, summarize};
