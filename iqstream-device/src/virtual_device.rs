use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use iqstream_messages::{SampleFormat, StreamDirection};
use log::{debug, info, trace};

use crate::buffer::{SampleBuf, SampleBufMut};
use crate::burst::BurstState;
use crate::channel::VirtualChannel;
use crate::error::Result;
use crate::stream::{Access, ReadStatus, StreamHandle, StreamSlot};
use crate::{Device, MAX_TRANSFER_UNIT};

/// Device whose single stream reads from or transmits onto a [`VirtualChannel`].
///
/// A transmitting device and a receiving device built with the same channel
/// form a loopback link. The device is `Sync`; concurrent writes through one
/// handle are serialized so each call's burst framing stays contiguous.
pub struct VirtualDevice {
    channel: Arc<VirtualChannel>,
    // Lock order: slot, then the channel queue.
    slot: Mutex<StreamSlot<BurstState>>,
}

impl VirtualDevice {
    /// Device on a channel of its own.
    pub fn new() -> Self {
        Self::with_channel(Arc::new(VirtualChannel::new()))
    }

    pub fn with_channel(channel: Arc<VirtualChannel>) -> Self {
        info!("Opening virtual device on channel {:p}", Arc::as_ptr(&channel));
        Self {
            channel,
            slot: Mutex::new(StreamSlot::default()),
        }
    }

    /// Shared channel backing both stream directions.
    pub fn channel(&self) -> &Arc<VirtualChannel> {
        &self.channel
    }

    fn lock(&self) -> MutexGuard<'_, StreamSlot<BurstState>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for VirtualDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for VirtualDevice {
    fn driver(&self) -> &'static str {
        "virtual"
    }

    fn setup_stream(&self, direction: StreamDirection, format: &str) -> Result<StreamHandle> {
        let format: SampleFormat = format.parse()?;
        let handle = self
            .lock()
            .setup(direction, format, || Ok(BurstState::default()))?;
        info!("setupStream: direction: {direction}, format: {format}");
        Ok(handle)
    }

    fn read_stream(
        &self,
        handle: &StreamHandle,
        mut buf: SampleBufMut<'_>,
        _timeout: Duration,
    ) -> Result<ReadStatus> {
        self.lock().get(handle, Access::Read, buf.format())?;
        let count = self.channel.read(&mut buf);
        trace!("readStream: {count} of {} samples", buf.len());
        Ok(ReadStatus::Samples(count))
    }

    fn write_stream(
        &self,
        handle: &StreamHandle,
        buf: SampleBuf<'_>,
        end_of_burst: bool,
        _timeout: Duration,
    ) -> Result<usize> {
        let mut slot = self.lock();
        let burst = slot.get(handle, Access::Write, buf.format())?;
        if !burst.in_burst() {
            debug!("Starting burst at phase {}", burst.phase());
        }

        let payload = buf.to_wire();
        let written = self.channel.transmit(burst, &payload, end_of_burst);
        trace!("writeStream: {written} samples, end of burst: {end_of_burst}");
        if end_of_burst {
            debug!("Ended burst at phase {}", burst.phase());
        }
        Ok(written)
    }

    fn close_stream(&self, handle: &StreamHandle) -> Result<()> {
        self.lock().close(handle)
    }

    fn stream_mtu(&self, _handle: &StreamHandle) -> usize {
        MAX_TRANSFER_UNIT
    }
}
