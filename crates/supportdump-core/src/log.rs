//! Logging seam for the streaming path.
//!
//! The streaming worker runs on a blocking thread, outside any task-local
//! subscriber, so it logs through an injected `StreamLog` instead of relying
//! on whatever global subscriber happens to be installed.

use std::sync::{Arc, Mutex};

/// Debug/error sink used by the archive streamer and pipeline.
pub trait StreamLog: Send + Sync {
    fn debug(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl StreamLog for TracingLog {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "supportdump", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "supportdump", "{}", message);
    }
}

/// Severity of a recorded line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Error,
}

/// Records every line in memory. Cloning shares the buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    lines: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(level, _)| *level == LogLevel::Error)
            .map(|(_, line)| line)
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_string()));
        }
    }
}

impl StreamLog for MemoryLog {
    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}
