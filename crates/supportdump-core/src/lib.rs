//! Support dump archives: stream named payloads into a deflate-compressed ZIP
//! file one entry at a time, without buffering the whole archive in memory.
//!
//! ```no_run
//! use std::sync::Arc;
//! use supportdump_core::{interlock_configs, run_dump, DumpConfig, PayloadSource, TracingLog};
//!
//! # async fn demo() -> Result<(), supportdump_core::DumpError> {
//! let config = DumpConfig::default();
//! let configs = interlock_configs();
//! let sources: [&dyn PayloadSource; 1] = [&configs];
//! let report = run_dump(&config, &sources, Arc::new(TracingLog)).await?;
//! println!("{} entries in {}", report.entries, report.path.display());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod log;
pub mod payload;
pub mod pipeline;
pub mod walker;

pub use archive::{ArchiveHandle, EntryOptions, StreamHandle, StreamSummary};
pub use config::{DumpConfig, PartialArchivePolicy};
pub use error::{DumpError, DumpResult};
pub use log::{LogLevel, MemoryLog, StreamLog, TracingLog};
pub use payload::{interlock_configs, Payload, PayloadSource, StaticSource};
pub use pipeline::{output_file_name, output_path, run_dump, write_dump, DumpReport};
pub use walker::{DirWalker, WalkedFile};
