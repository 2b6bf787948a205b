//! YAML configuration for a support dump run, with defaults and validation.

use crate::error::{DumpError, DumpResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Channel capacity used when none is configured.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10;

/// Highest deflate level supported by the archive writer.
pub const MAX_COMPRESSION_LEVEL: i64 = 9;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DumpConfig {
    /// Directory the archive is written into.
    pub output_dir: PathBuf,

    /// File name prefix; the archive is named `<prefix>-<unix seconds>.zip`.
    pub prefix: String,

    /// Payloads buffered between producer and writer before `submit` waits.
    pub channel_capacity: usize,

    /// Deflate level, 0..=9.
    pub compression_level: i64,

    /// What to do with a partially written archive after a mid-stream failure.
    pub on_failure: PartialArchivePolicy,

    /// Add the built-in configuration blobs to the dump.
    pub include_sample_configs: bool,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            prefix: "hello".to_string(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            compression_level: MAX_COMPRESSION_LEVEL,
            on_failure: PartialArchivePolicy::default(),
            include_sample_configs: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PartialArchivePolicy {
    /// Leave the truncated archive on disk.
    #[default]
    Keep,
    /// Remove the archive file.
    Delete,
}

impl DumpConfig {
    /// Load from a YAML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> DumpResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| DumpError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let cfg = Self::from_yaml(&raw).map_err(|reason| DumpError::Config {
            path: path.to_path_buf(),
            reason,
        })?;
        cfg.validate().map_err(|reason| DumpError::Config {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(cfg)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, String> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|e| e.to_string())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.channel_capacity == 0 {
            return Err("channel_capacity must be at least 1".to_string());
        }
        if !(0..=MAX_COMPRESSION_LEVEL).contains(&self.compression_level) {
            return Err(format!(
                "compression_level must be between 0 and {}, got {}",
                MAX_COMPRESSION_LEVEL, self.compression_level
            ));
        }
        if self.prefix.is_empty() || self.prefix.contains(['/', '\\']) {
            return Err(format!("invalid prefix '{}'", self.prefix));
        }
        Ok(())
    }
}
