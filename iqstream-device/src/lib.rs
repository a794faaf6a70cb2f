//! Streaming sample I/O for complex-baseband devices.
//!
//! A [`Device`] hands out one [`StreamHandle`], bound to a direction and a
//! sample format, and then exchanges buffers of samples through it. Two
//! backends are provided: [`FileDevice`] records and replays files, and
//! [`VirtualDevice`] transmits and receives over an in-process
//! [`VirtualChannel`].

mod buffer;
mod burst;
mod channel;
mod codec;
mod error;
mod file;
mod registry;
mod relay;
mod stream;
mod virtual_device;

use std::time::Duration;

pub use buffer::{SampleBuf, SampleBufMut, SampleVec};
pub use burst::{BurstState, POSTAMBLE_LEN, PREAMBLE_LEN, RAMP_LEN};
pub use channel::VirtualChannel;
pub use codec::{IqSample, WIRE_SCALE, WireSample};
pub use error::{Result, StreamError};
pub use file::{Encoding, FileDevice};
pub use iqstream_messages::{DeviceArgs, SampleFormat, StreamDirection};
pub use registry::{enumerate, make_device};
pub use relay::{Relay, RelayConfig, RelayStats};
pub use stream::{ReadStatus, StreamHandle};
pub use virtual_device::VirtualDevice;

/// Largest buffer, in samples, a caller needs for one call. The same for
/// every backend and never renegotiated.
pub const MAX_TRANSFER_UNIT: usize = 0x20000;

/// A streaming device with a single channel.
///
/// Timeouts are accepted for interface compatibility only: every data source
/// is local, so no call ever waits.
pub trait Device: Send + Sync {
    /// Backend name, as used in the `driver` argument.
    fn driver(&self) -> &'static str;

    /// Opens the device's one stream. `format` is `"CS8"` or `"CF32"`.
    fn setup_stream(&self, direction: StreamDirection, format: &str) -> Result<StreamHandle>;

    /// Fills the front of `buf`, which must match the handle's format.
    fn read_stream(
        &self,
        handle: &StreamHandle,
        buf: SampleBufMut<'_>,
        timeout: Duration,
    ) -> Result<ReadStatus>;

    /// Sends all of `buf` and returns its length.
    fn write_stream(
        &self,
        handle: &StreamHandle,
        buf: SampleBuf<'_>,
        end_of_burst: bool,
        timeout: Duration,
    ) -> Result<usize>;

    /// Releases the stream; later calls with `handle` fail with a closed-stream error.
    fn close_stream(&self, handle: &StreamHandle) -> Result<()>;

    /// Largest number of samples a single read or write should carry.
    fn stream_mtu(&self, handle: &StreamHandle) -> usize;
}
