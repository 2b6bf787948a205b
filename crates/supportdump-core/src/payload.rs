//! Named payloads and the sources that produce them.

use crate::error::DumpResult;
use std::collections::BTreeMap;

/// A single named blob destined for one archive entry.
///
/// `name` is archive-relative with forward slashes (e.g. "configs/app.txt").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub name: String,
    pub data: Vec<u8>,
}

impl Payload {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Produces payloads in a defined order.
///
/// The pipeline submits items in exactly the order they are yielded, so the
/// archive entry order is the iteration order.
pub trait PayloadSource: Send + Sync {
    fn payloads(&self) -> Box<dyn Iterator<Item = DumpResult<Payload>> + Send + '_>;
}

/// Fixed set of payloads, enumerated in name order.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: BTreeMap<String, Vec<u8>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }

    /// Insert or replace a payload. Names are unique within a source.
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.entries.insert(name.into(), data.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, Vec<u8>>> for StaticSource {
    fn from(entries: BTreeMap<String, Vec<u8>>) -> Self {
        Self { entries }
    }
}

impl PayloadSource for StaticSource {
    fn payloads(&self) -> Box<dyn Iterator<Item = DumpResult<Payload>> + Send + '_> {
        Box::new(
            self.entries
                .iter()
                .map(|(name, data)| Ok(Payload::new(name.clone(), data.clone()))),
        )
    }
}

/// Sample configuration blobs gathered for a support dump.
pub fn interlock_configs() -> StaticSource {
    StaticSource::new()
        .with("configs/interlock-metadata.txt", "metadata")
        .with("configs/interlock-conf-1.txt", "conf1")
        .with("configs/interlock-conf-2.txt", "conf2")
}
