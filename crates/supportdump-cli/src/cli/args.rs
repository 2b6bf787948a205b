use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use supportdump_core::PartialArchivePolicy;

#[derive(Parser, Debug)]
#[command(
    name = "supportdump",
    version,
    about = "Stream configuration blobs and directories into a compressed support dump archive"
)]
pub struct Cli {
    /// YAML config file; flags override its values
    #[arg(long, env = "SUPPORTDUMP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory the archive is written into
    #[arg(long, env = "SUPPORTDUMP_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Archive name prefix (archive is <prefix>-<unix seconds>.zip)
    #[arg(long, env = "SUPPORTDUMP_PREFIX")]
    pub prefix: Option<String>,

    /// Payloads buffered between gathering and writing
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Deflate level (0-9)
    #[arg(long)]
    pub level: Option<i64>,

    /// What to do with a partial archive when streaming fails
    #[arg(long, value_enum, env = "SUPPORTDUMP_ON_FAILURE")]
    pub on_failure: Option<OnFailure>,

    /// Add every regular file under DIR as files/<dir name>/<relative path> (repeatable)
    #[arg(long = "include-dir", value_name = "DIR")]
    pub include_dirs: Vec<PathBuf>,

    /// Leave out the built-in configuration blobs
    #[arg(long)]
    pub no_sample_configs: bool,

    /// Debug-level logging (overrides RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnFailure {
    Keep,
    Delete,
}

impl From<OnFailure> for PartialArchivePolicy {
    fn from(value: OnFailure) -> Self {
        match value {
            OnFailure::Keep => PartialArchivePolicy::Keep,
            OnFailure::Delete => PartialArchivePolicy::Delete,
        }
    }
}
