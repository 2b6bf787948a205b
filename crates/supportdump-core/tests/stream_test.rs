use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use supportdump_core::{
    ArchiveHandle, DumpError, EntryOptions, LogLevel, MemoryLog, Payload, StreamLog,
};

fn read_entries<R: Read + Seek>(reader: R) -> Vec<(String, Vec<u8>)> {
    let mut archive = zip::ZipArchive::new(reader).expect("valid zip");
    let mut out = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        assert_eq!(file.compression(), zip::CompressionMethod::Deflated);
        let mut data = Vec::new();
        file.read_to_end(&mut data).unwrap();
        out.push((file.name().to_string(), data));
    }
    out
}

fn memory_archive() -> ArchiveHandle<Cursor<Vec<u8>>> {
    ArchiveHandle::new(Cursor::new(Vec::new()), EntryOptions::default())
}

/// Sink that fails every write once `budget` bytes have been accepted.
#[derive(Debug)]
struct FailingWriter {
    inner: Cursor<Vec<u8>>,
    budget: usize,
    written: usize,
}

impl FailingWriter {
    fn new(budget: usize) -> Self {
        Self {
            inner: Cursor::new(Vec::new()),
            budget,
            written: 0,
        }
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.written + buf.len() > self.budget {
            return Err(std::io::Error::other("disk full"));
        }
        self.written += buf.len();
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Seek for FailingWriter {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// xorshift bytes; deflate cannot shrink these.
fn noise(len: usize) -> Vec<u8> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state as u8
        })
        .collect()
}

#[tokio::test]
async fn two_payloads_round_trip_in_order() {
    let stream = memory_archive().begin_stream(10, Arc::new(MemoryLog::new()));
    stream
        .submit(Payload::new("configs/a.txt", "x"))
        .await
        .unwrap();
    stream
        .submit(Payload::new("configs/b.txt", "y"))
        .await
        .unwrap();

    let summary = stream.finish().await.unwrap();
    assert_eq!(summary.entries, 2);
    assert_eq!(summary.bytes, 2);

    let mut writer = summary.writer;
    writer.set_position(0);
    assert_eq!(
        read_entries(writer),
        vec![
            ("configs/a.txt".to_string(), b"x".to_vec()),
            ("configs/b.txt".to_string(), b"y".to_vec()),
        ]
    );
}

#[tokio::test]
async fn zero_payloads_still_produce_valid_archive() {
    let stream = memory_archive().begin_stream(10, Arc::new(MemoryLog::new()));
    let summary = stream.finish().await.unwrap();

    assert_eq!(summary.entries, 0);
    assert!(read_entries(summary.writer).is_empty());
}

#[tokio::test]
async fn submission_order_survives_backpressure() {
    // Capacity 1 forces the producer to wait on nearly every submit.
    let stream = memory_archive().begin_stream(1, Arc::new(MemoryLog::new()));
    let names: Vec<String> = (0..200).rev().map(|i| format!("configs/{i:03}.txt")).collect();
    for (i, name) in names.iter().enumerate() {
        stream
            .submit(Payload::new(name.clone(), format!("body {i}")))
            .await
            .unwrap();
    }

    let summary = stream.finish().await.unwrap();
    let entries = read_entries(summary.writer);
    assert_eq!(entries.len(), names.len());
    for (i, (name, data)) in entries.iter().enumerate() {
        assert_eq!(name, &names[i]);
        assert_eq!(data, format!("body {i}").as_bytes());
    }
}

#[tokio::test]
async fn zero_capacity_is_clamped() {
    let stream = memory_archive().begin_stream(0, Arc::new(MemoryLog::new()));
    stream
        .submit(Payload::new("configs/a.txt", "x"))
        .await
        .unwrap();
    assert_eq!(stream.finish().await.unwrap().entries, 1);
}

#[tokio::test]
async fn duplicate_entry_stops_stream_and_keeps_earlier_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dump.zip");
    let log = MemoryLog::new();

    let archive = ArchiveHandle::create(&path, EntryOptions::default()).unwrap();
    let stream = archive.begin_stream(10, Arc::new(log.clone()));
    stream
        .submit(Payload::new("configs/a.txt", "x"))
        .await
        .unwrap();
    stream
        .submit(Payload::new("configs/a.txt", "again"))
        .await
        .unwrap();
    // May be rejected if the worker already stopped.
    let _ = stream.submit(Payload::new("configs/c.txt", "z")).await;

    let err = stream.finish().await.unwrap_err();
    assert!(matches!(err, DumpError::EntryCreate { .. }), "{err}");
    assert_eq!(err.entry_name(), Some("configs/a.txt"));

    let errors = log.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("configs/a.txt"), "{}", errors[0]);

    let file = std::fs::File::open(&path).unwrap();
    assert_eq!(
        read_entries(file),
        vec![("configs/a.txt".to_string(), b"x".to_vec())]
    );
}

#[tokio::test]
async fn write_failure_is_reported_by_name() {
    let archive = ArchiveHandle::new(FailingWriter::new(4096), EntryOptions::default());
    let log = MemoryLog::new();
    let stream = archive.begin_stream(10, Arc::new(log.clone()));

    stream
        .submit(Payload::new("configs/small.txt", "x"))
        .await
        .unwrap();
    stream
        .submit(Payload::new("configs/big.bin", noise(256 * 1024)))
        .await
        .unwrap();
    let _ = stream.submit(Payload::new("configs/after.txt", "y")).await;

    let err = stream.finish().await.unwrap_err();
    assert!(matches!(err, DumpError::Write { .. }), "{err}");
    assert_eq!(err.entry_name(), Some("configs/big.bin"));
    assert!(log.errors()[0].contains("configs/big.bin"));
    assert!(!log
        .lines()
        .iter()
        .any(|(_, line)| line.contains("configs/after.txt")));
}

#[tokio::test]
async fn submit_after_worker_stopped_is_rejected() {
    let stream = memory_archive().begin_stream(1, Arc::new(MemoryLog::new()));
    stream.submit(Payload::new("", "x")).await.unwrap();

    let mut rejected = None;
    for i in 0..64 {
        if let Err(err) = stream
            .submit(Payload::new(format!("configs/{i}.txt"), "x"))
            .await
        {
            rejected = Some(err);
            break;
        }
    }
    let rejected = rejected.expect("worker should have closed the channel");
    assert!(matches!(rejected, DumpError::StreamClosed { .. }));

    let err = stream.finish().await.unwrap_err();
    assert!(matches!(err, DumpError::EntryCreate { .. }));
    assert_eq!(err.entry_name(), Some(""));
}

#[tokio::test]
async fn worker_logs_progress() {
    let log = MemoryLog::new();
    let stream = memory_archive().begin_stream(10, Arc::new(log.clone()));
    stream
        .submit(Payload::new("configs/a.txt", "x"))
        .await
        .unwrap();
    stream.finish().await.unwrap();

    let lines = log.lines();
    assert_eq!(
        lines,
        vec![
            (
                LogLevel::Debug,
                "Support dump: writing configs/a.txt".to_string()
            ),
            (LogLevel::Debug, "Streaming complete".to_string()),
        ]
    );
}

#[test]
fn memory_log_is_a_stream_log() {
    fn takes(_: Arc<dyn StreamLog>) {}
    takes(Arc::new(MemoryLog::new()));
}
