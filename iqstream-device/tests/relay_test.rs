use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use iqstream_device::{
    Device, FileDevice, POSTAMBLE_LEN, PREAMBLE_LEN, RAMP_LEN, ReadStatus, Relay, RelayConfig,
    RelayStats, SampleBuf, SampleBufMut, SampleFormat, StreamDirection, StreamError,
    StreamHandle, make_device,
};
use num_complex::Complex;
use tempfile::TempDir;

// Test helpers to reduce boilerplate

const FRAMING: usize = PREAMBLE_LEN + RAMP_LEN + POSTAMBLE_LEN;

fn relay_file(source: &Path, sink: &Path, config: RelayConfig) -> RelayStats {
    let relay = Relay::new(
        Box::new(FileDevice::new(source)),
        Box::new(FileDevice::new(sink)),
        config,
    );
    relay.run().expect("Relay should succeed")
}

/// File source that records when it is dropped.
struct TrackedSource {
    inner: FileDevice,
    dropped: Arc<AtomicBool>,
}

impl Drop for TrackedSource {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

impl Device for TrackedSource {
    fn driver(&self) -> &'static str {
        self.inner.driver()
    }

    fn setup_stream(&self, direction: StreamDirection, format: &str) -> iqstream_device::Result<StreamHandle> {
        self.inner.setup_stream(direction, format)
    }

    fn read_stream(
        &self,
        handle: &StreamHandle,
        buf: SampleBufMut<'_>,
        timeout: Duration,
    ) -> iqstream_device::Result<ReadStatus> {
        self.inner.read_stream(handle, buf, timeout)
    }

    fn write_stream(
        &self,
        handle: &StreamHandle,
        buf: SampleBuf<'_>,
        end_of_burst: bool,
        timeout: Duration,
    ) -> iqstream_device::Result<usize> {
        self.inner.write_stream(handle, buf, end_of_burst, timeout)
    }

    fn close_stream(&self, handle: &StreamHandle) -> iqstream_device::Result<()> {
        self.inner.close_stream(handle)
    }

    fn stream_mtu(&self, handle: &StreamHandle) -> usize {
        self.inner.stream_mtu(handle)
    }
}

/// Sink whose writes always fail.
struct BrokenSink {
    inner: FileDevice,
}

impl Device for BrokenSink {
    fn driver(&self) -> &'static str {
        "broken"
    }

    fn setup_stream(&self, direction: StreamDirection, format: &str) -> iqstream_device::Result<StreamHandle> {
        self.inner.setup_stream(direction, format)
    }

    fn read_stream(
        &self,
        handle: &StreamHandle,
        buf: SampleBufMut<'_>,
        timeout: Duration,
    ) -> iqstream_device::Result<ReadStatus> {
        self.inner.read_stream(handle, buf, timeout)
    }

    fn write_stream(
        &self,
        _handle: &StreamHandle,
        _buf: SampleBuf<'_>,
        _end_of_burst: bool,
        _timeout: Duration,
    ) -> iqstream_device::Result<usize> {
        Err(StreamError::Io(io::Error::other("disk full")))
    }

    fn close_stream(&self, handle: &StreamHandle) -> iqstream_device::Result<()> {
        self.inner.close_stream(handle)
    }

    fn stream_mtu(&self, handle: &StreamHandle) -> usize {
        self.inner.stream_mtu(handle)
    }
}

/// Reads every record of a text capture as CS8 samples.
fn read_all(path: &Path) -> Vec<Complex<i8>> {
    let device = FileDevice::new(path);
    let rx = device
        .setup_stream(StreamDirection::Receive, "CS8")
        .unwrap();
    let mut buf = vec![Complex::new(0i8, 0); iqstream_device::MAX_TRANSFER_UNIT];
    let mut all = Vec::new();
    loop {
        match device
            .read_stream(&rx, SampleBufMut::from(&mut buf[..]), Duration::ZERO)
            .unwrap()
        {
            ReadStatus::Samples(n) => all.extend_from_slice(&buf[..n]),
            ReadStatus::Underflow => return all,
        }
    }
}

#[test]
fn test_relay_single_burst() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.txt");
    let sink = dir.path().join("sink.txt");
    std::fs::write(&source, "2\n1 1\n2 2\n3\n3 3\n4 4\n5 5\n").unwrap();

    let stats = relay_file(
        &source,
        &sink,
        RelayConfig {
            format: SampleFormat::Cs8,
            burst_per_chunk: false,
        },
    );

    assert_eq!(
        stats,
        RelayStats {
            transmitted: 5,
            received: FRAMING + 5,
            bursts: 1,
        }
    );

    let received = read_all(&sink);
    assert_eq!(received.len(), FRAMING + 5);
    let payload: Vec<_> = received[PREAMBLE_LEN + RAMP_LEN..][..5].to_vec();
    assert_eq!(
        payload,
        (1..=5).map(|v| Complex::new(v, v)).collect::<Vec<Complex<i8>>>()
    );
}

#[test]
fn test_relay_burst_per_chunk() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.txt");
    let sink = dir.path().join("sink.txt");
    std::fs::write(&source, "2\n10 10\n20 20\n1\n30 30\n").unwrap();

    let stats = relay_file(
        &source,
        &sink,
        RelayConfig {
            format: SampleFormat::Cf32,
            burst_per_chunk: true,
        },
    );

    assert_eq!(stats.transmitted, 3);
    assert_eq!(stats.bursts, 2);
    assert_eq!(stats.received, 2 * FRAMING + 3);
    assert_eq!(read_all(&sink).len(), stats.received);
}

#[test]
fn test_relay_empty_source() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.txt");
    let sink = dir.path().join("sink.txt");
    std::fs::write(&source, "").unwrap();

    let stats = relay_file(&source, &sink, RelayConfig::default());
    assert_eq!(stats, RelayStats::default());
    assert!(read_all(&sink).is_empty());
}

#[test]
fn test_relay_reports_source_parse_error() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.txt");
    std::fs::write(&source, "2\n1 1\nbroken\n").unwrap();

    let relay = Relay::new(
        Box::new(FileDevice::new(&source)),
        make_device(&"driver=virtual".parse().unwrap()).unwrap(),
        RelayConfig::default(),
    );
    let err = relay.run().unwrap_err();
    assert!(
        format!("{err:#}").contains("malformed record at line 3"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn test_relay_missing_source() {
    let dir = TempDir::new().unwrap();
    let relay = Relay::new(
        Box::new(FileDevice::new(dir.path().join("missing.txt"))),
        Box::new(FileDevice::new(dir.path().join("sink.txt"))),
        RelayConfig::default(),
    );
    let err = relay.run().unwrap_err();
    assert!(format!("{err:#}").contains("Failed to set up relay source"));
}

#[test]
fn test_relay_rejects_virtual_source() {
    let dir = TempDir::new().unwrap();
    let sink = dir.path().join("sink.txt");
    let (done_tx, done_rx) = flume::bounded(1);

    thread::spawn(move || {
        let relay = Relay::new(
            make_device(&"driver=virtual".parse().unwrap()).unwrap(),
            Box::new(FileDevice::new(sink)),
            RelayConfig::default(),
        );
        let _ = done_tx.send(relay.run().map_err(|e| format!("{e:#}")));
    });

    let result = done_rx
        .recv_timeout(Duration::from_secs(3))
        .expect("Relay with a virtual source should return promptly");
    let err = result.unwrap_err();
    assert!(err.contains("relay source must be a file device"), "unexpected error: {err}");
}

#[test]
fn test_relay_sink_failure_joins_transmitter() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.txt");
    let records: String = (0..200).map(|i| format!("1\n{} {}\n", i % 100, -(i % 100))).collect();
    std::fs::write(&source, records).unwrap();

    let dropped = Arc::new(AtomicBool::new(false));
    let relay = Relay::new(
        Box::new(TrackedSource {
            inner: FileDevice::new(&source),
            dropped: dropped.clone(),
        }),
        Box::new(BrokenSink {
            inner: FileDevice::new(dir.path().join("sink.txt")),
        }),
        RelayConfig::default(),
    );

    let err = relay.run().unwrap_err();
    assert!(format!("{err:#}").contains("disk full"), "unexpected error: {err:#}");
    // The source lives on the transmitter thread, so it is gone only once
    // that thread has been joined.
    assert!(dropped.load(Ordering::SeqCst), "Transmitter thread should be joined");
}
