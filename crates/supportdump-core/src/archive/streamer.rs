use super::ArchiveHandle;
use crate::error::{DumpError, DumpResult};
use crate::log::StreamLog;
use crate::payload::Payload;
use std::io::{Seek, Write};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Result of a stream that drained without error.
#[derive(Debug)]
pub struct StreamSummary<W> {
    pub entries: usize,
    pub bytes: u64,
    /// The finalized sink, central directory already written.
    pub writer: W,
}

/// Producer side of a running stream.
///
/// Payloads go through a bounded channel to a single blocking worker that
/// owns the archive. `finish` closes the channel and resolves exactly once.
pub struct StreamHandle<W> {
    tx: mpsc::Sender<Payload>,
    worker: JoinHandle<DumpResult<StreamSummary<W>>>,
}

impl<W: Write + Seek + Send + 'static> ArchiveHandle<W> {
    /// Hand the archive to a background worker fed by a channel of `capacity`.
    ///
    /// Must be called from within a Tokio runtime. A capacity of 0 is treated as 1.
    pub fn begin_stream(self, capacity: usize, log: Arc<dyn StreamLog>) -> StreamHandle<W> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::task::spawn_blocking(move || drain(self, rx, log.as_ref()));
        StreamHandle { tx, worker }
    }
}

impl<W: Send + 'static> StreamHandle<W> {
    /// Queue a payload, waiting while the channel is full.
    ///
    /// Fails with `StreamClosed` once the worker has stopped; call `finish`
    /// to get the error that stopped it.
    pub async fn submit(&self, payload: Payload) -> DumpResult<()> {
        self.tx
            .send(payload)
            .await
            .map_err(|rejected| DumpError::StreamClosed {
                name: rejected.0.name,
            })
    }

    /// Close the channel and wait for the worker's terminal result.
    pub async fn finish(self) -> DumpResult<StreamSummary<W>> {
        let Self { tx, worker } = self;
        drop(tx);
        match worker.await {
            Ok(result) => result,
            Err(e) => Err(DumpError::WorkerPanicked {
                message: e.to_string(),
            }),
        }
    }
}

fn drain<W: Write + Seek>(
    mut archive: ArchiveHandle<W>,
    mut rx: mpsc::Receiver<Payload>,
    log: &dyn StreamLog,
) -> DumpResult<StreamSummary<W>> {
    let mut failure = None;

    while let Some(payload) = rx.blocking_recv() {
        log.debug(&format!("Support dump: writing {}", payload.name));
        if let Err(err) = archive.write_entry(&payload) {
            log.error(&err.to_string());
            failure = Some(err);
            break;
        }
    }

    // Anything still queued is abandoned; unblock the producer before finalizing.
    rx.close();
    drop(rx);

    let entries = archive.entries();
    let bytes = archive.bytes();
    let closed = archive.finish();

    match (failure, closed) {
        (None, Ok(writer)) => {
            log.debug("Streaming complete");
            Ok(StreamSummary {
                entries,
                bytes,
                writer,
            })
        }
        (None, Err(err)) => {
            log.error(&err.to_string());
            Err(err)
        }
        (Some(err), Ok(_)) => Err(err),
        (Some(err), Err(close_err)) => {
            log.error(&format!("archive left incomplete: {close_err}"));
            Err(err)
        }
    }
}
