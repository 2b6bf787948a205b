//! End-to-end support dump run: name the file, open it, stream every source
//! into it and settle what is left on disk.

use crate::archive::{ArchiveHandle, EntryOptions};
use crate::config::{DumpConfig, PartialArchivePolicy};
use crate::error::{DumpError, DumpResult};
use crate::log::StreamLog;
use crate::payload::PayloadSource;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub path: PathBuf,
    pub entries: usize,
    pub bytes: u64,
}

/// `<prefix>-<unix seconds>.zip`
pub fn output_file_name(prefix: &str, unix_secs: i64) -> String {
    format!("{}-{}.zip", prefix, unix_secs)
}

/// Archive path for a run starting now.
pub fn output_path(config: &DumpConfig) -> PathBuf {
    let now = chrono::Utc::now().timestamp();
    config
        .output_dir
        .join(output_file_name(&config.prefix, now))
}

/// Run a dump into a freshly named archive under `config.output_dir`.
pub async fn run_dump(
    config: &DumpConfig,
    sources: &[&dyn PayloadSource],
    log: Arc<dyn StreamLog>,
) -> DumpResult<DumpReport> {
    let path = output_path(config);
    write_dump(&path, config, sources, log).await
}

/// Stream every payload of `sources`, in order, into a new archive at `path`.
///
/// A mid-stream failure leaves the partial archive in place or removes it,
/// depending on `config.on_failure`.
pub async fn write_dump(
    path: &Path,
    config: &DumpConfig,
    sources: &[&dyn PayloadSource],
    log: Arc<dyn StreamLog>,
) -> DumpResult<DumpReport> {
    let archive = ArchiveHandle::create(
        path,
        EntryOptions::with_level(config.compression_level),
    )?;
    let stream = archive.begin_stream(config.channel_capacity, log.clone());

    let mut source_err = None;
    'sources: for source in sources {
        let mut items = source.payloads();
        while let Some(item) = next_payload(&mut items) {
            let payload = match item {
                Ok(payload) => payload,
                Err(err) => {
                    log.error(&err.to_string());
                    source_err = Some(err);
                    break 'sources;
                }
            };
            // The worker already stopped; its own error is reported by finish.
            if stream.submit(payload).await.is_err() {
                break 'sources;
            }
        }
    }

    log.debug("Waiting for stream to finish");
    let result = match stream.finish().await {
        Ok(summary) => match source_err {
            Some(err) => Err(err),
            None => sync_archive(summary.writer).map(|()| DumpReport {
                path: path.to_path_buf(),
                entries: summary.entries,
                bytes: summary.bytes,
            }),
        },
        Err(err) => Err(err),
    };

    match &result {
        Ok(_) => log.debug("Complete"),
        Err(_) => settle_partial_archive(path, config.on_failure, log.as_ref()),
    }
    result
}

/// Pull the next item from a source. Sources may read from disk, so on a
/// multi-thread runtime the pull happens inside `block_in_place`.
fn next_payload<I: Iterator>(items: &mut I) -> Option<I::Item> {
    match Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(|| items.next()),
        _ => items.next(),
    }
}

fn sync_archive(writer: std::io::BufWriter<std::fs::File>) -> DumpResult<()> {
    let file = writer.into_inner().map_err(|e| DumpError::Finalize {
        source: e.into_error(),
    })?;
    file.sync_all()
        .map_err(|source| DumpError::Finalize { source })
}

fn settle_partial_archive(path: &Path, policy: PartialArchivePolicy, log: &dyn StreamLog) {
    if policy == PartialArchivePolicy::Keep {
        log.debug(&format!("Keeping partial archive {}", path.display()));
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => log.debug(&format!("Removed partial archive {}", path.display())),
        Err(e) => log.error(&format!(
            "failed to remove partial archive {}: {}",
            path.display(),
            e
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_uses_prefix_and_timestamp() {
        assert_eq!(output_file_name("hello", 1700000000), "hello-1700000000.zip");
    }

    #[test]
    fn output_path_lives_in_output_dir() {
        let config = DumpConfig {
            output_dir: PathBuf::from("/tmp/dumps"),
            prefix: "support".into(),
            ..DumpConfig::default()
        };
        let path = output_path(&config);
        assert!(path.starts_with("/tmp/dumps"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("support-"), "{name}");
        assert!(name.ends_with(".zip"), "{name}");
    }
}
