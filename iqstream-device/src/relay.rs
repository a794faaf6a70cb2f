use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use flume::{Receiver, RecvTimeoutError, Sender};
use iqstream_messages::{RelayEvent, SampleFormat, StreamDirection};
use log::{debug, info};

use crate::buffer::SampleVec;
use crate::channel::VirtualChannel;
use crate::error::StreamError;
use crate::stream::{ReadStatus, StreamHandle};
use crate::virtual_device::VirtualDevice;
use crate::Device;

const EVENT_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    pub format: SampleFormat,
    /// Close a burst after every chunk read from the source instead of once
    /// the source runs dry.
    pub burst_per_chunk: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            format: SampleFormat::Cf32,
            burst_per_chunk: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Payload samples read from the source and transmitted.
    pub transmitted: usize,
    /// Samples received off the channel and written to the sink, framing included.
    pub received: usize,
    /// Bursts closed by the transmitter.
    pub bursts: usize,
}

/// Moves samples from a source device, across a virtual channel, into a sink
/// device.
///
/// The transmitter runs on its own thread and reports progress over a flume
/// channel; the receiving side drains the channel on the calling thread.
pub struct Relay {
    source: Box<dyn Device>,
    sink: Box<dyn Device>,
    channel: Arc<VirtualChannel>,
    config: RelayConfig,
}

impl Relay {
    pub fn new(source: Box<dyn Device>, sink: Box<dyn Device>, config: RelayConfig) -> Self {
        debug!("Constructing a new relay");
        Self {
            source,
            sink,
            channel: Arc::new(VirtualChannel::new()),
            config,
        }
    }

    /// Run the relay until the source underflows (blocking).
    ///
    /// The source must be a file device: a virtual channel never underflows,
    /// so a relay reading one would never finish.
    pub fn run(self) -> Result<RelayStats> {
        if self.source.driver() != "file" {
            return Err(StreamError::Configuration(format!(
                "relay source must be a file device, got '{}'",
                self.source.driver()
            ))
            .into());
        }

        let format = self.config.format.name();
        let source_rx = self
            .source
            .setup_stream(StreamDirection::Receive, format)
            .context("Failed to set up relay source")?;
        let sink_tx = self
            .sink
            .setup_stream(StreamDirection::Transmit, format)
            .context("Failed to set up relay sink")?;

        let link_tx_device = VirtualDevice::with_channel(self.channel.clone());
        let link_rx_device = VirtualDevice::with_channel(self.channel.clone());
        let link_tx = link_tx_device.setup_stream(StreamDirection::Transmit, format)?;
        let link_rx = link_rx_device.setup_stream(StreamDirection::Receive, format)?;

        let (event_tx, event_rx) = flume::unbounded();
        let transmitter = Transmitter {
            source: self.source,
            source_rx,
            link: link_tx_device,
            link_tx,
            buffer: SampleVec::zeroed(self.config.format, crate::MAX_TRANSFER_UNIT),
            burst_per_chunk: self.config.burst_per_chunk,
            event_tx,
        };
        let transmitter_handle = thread::spawn(move || transmitter.run());

        let collector = Collector {
            link: &link_rx_device,
            link_rx: &link_rx,
            sink: self.sink.as_ref(),
            sink_tx: &sink_tx,
            buffer: SampleVec::zeroed(self.config.format, crate::MAX_TRANSFER_UNIT),
        };
        let collected = collector.run(&event_rx);

        // A closed event channel stops the transmitter at its next chunk.
        drop(event_rx);
        let bursts = transmitter_handle
            .join()
            .map_err(|_| anyhow!("Transmitter thread panicked"))?;

        let mut stats = collected?;
        stats.bursts = bursts?;
        self.sink.close_stream(&sink_tx)?;
        info!(
            "Relay finished: {} samples transmitted in {} bursts, {} received",
            stats.transmitted, stats.bursts, stats.received
        );
        Ok(stats)
    }
}

struct Transmitter {
    source: Box<dyn Device>,
    source_rx: StreamHandle,
    link: VirtualDevice,
    link_tx: StreamHandle,
    buffer: SampleVec,
    burst_per_chunk: bool,
    event_tx: Sender<RelayEvent>,
}

impl Transmitter {
    /// Returns the number of bursts closed.
    fn run(mut self) -> Result<usize> {
        let result = self.transmit_all();
        let event = match &result {
            Ok(_) => RelayEvent::Finished,
            Err(e) => RelayEvent::Failed(format!("{e:#}")),
        };
        // The receiving side may already be gone after a sink failure.
        let _ = self.event_tx.send(event);
        result
    }

    fn transmit_all(&mut self) -> Result<usize> {
        let mut bursts = 0;
        let mut in_burst = false;

        loop {
            let status = self
                .source
                .read_stream(&self.source_rx, self.buffer.as_buf_mut(), Duration::ZERO)
                .context("Failed to read relay source")?;

            match status {
                ReadStatus::Samples(0) => continue,
                ReadStatus::Samples(n) => {
                    self.link.write_stream(
                        &self.link_tx,
                        self.buffer.head(n),
                        self.burst_per_chunk,
                        Duration::ZERO,
                    )?;
                    if self.burst_per_chunk {
                        bursts += 1;
                    } else {
                        in_burst = true;
                    }
                    if self
                        .event_tx
                        .send(RelayEvent::Transmitted { samples: n })
                        .is_err()
                    {
                        return Ok(bursts);
                    }
                }
                ReadStatus::Underflow => {
                    if in_burst {
                        self.link
                            .write_stream(&self.link_tx, self.buffer.head(0), true, Duration::ZERO)?;
                        bursts += 1;
                    }
                    return Ok(bursts);
                }
            }
        }
    }
}

/// Receiving end of the relay: drains the channel into the sink.
struct Collector<'a> {
    link: &'a VirtualDevice,
    link_rx: &'a StreamHandle,
    sink: &'a dyn Device,
    sink_tx: &'a StreamHandle,
    buffer: SampleVec,
}

impl Collector<'_> {
    fn run(mut self, events: &Receiver<RelayEvent>) -> Result<RelayStats> {
        let mut stats = RelayStats::default();
        loop {
            let event = events.recv_timeout(EVENT_POLL);
            debug!("Relay received event: {:?}", event);

            let done = match event {
                Ok(RelayEvent::Transmitted { samples }) => {
                    stats.transmitted += samples;
                    false
                }
                Ok(RelayEvent::Finished | RelayEvent::Failed(_))
                | Err(RecvTimeoutError::Disconnected) => true,
                Err(RecvTimeoutError::Timeout) => false,
            };

            stats.received += self.drain()?;
            if done {
                return Ok(stats);
            }
        }
    }

    /// Copies everything queued on the channel to the sink.
    fn drain(&mut self) -> Result<usize> {
        let mut total = 0;
        loop {
            let status =
                self.link
                    .read_stream(self.link_rx, self.buffer.as_buf_mut(), Duration::ZERO)?;
            match status {
                ReadStatus::Samples(0) | ReadStatus::Underflow => return Ok(total),
                ReadStatus::Samples(n) => {
                    self.sink
                        .write_stream(self.sink_tx, self.buffer.head(n), false, Duration::ZERO)
                        .context("Failed to write relay sink")?;
                    total += n;
                }
            }
        }
    }
}
