use std::sync::atomic::{AtomicU64, Ordering};

use iqstream_messages::{SampleFormat, StreamDirection};

use crate::error::{Result, StreamError};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Token returned by `setup_stream`, bound to a direction and a sample format.
///
/// Devices check every handle they are given against the stream they issued,
/// so a handle from another device, or one used after close, is rejected
/// instead of being reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamHandle {
    token: u64,
    direction: StreamDirection,
    format: SampleFormat,
}

impl StreamHandle {
    fn issue(direction: StreamDirection, format: SampleFormat) -> Self {
        Self {
            token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            direction,
            format,
        }
    }

    pub fn direction(&self) -> StreamDirection {
        self.direction
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }
}

/// Outcome of a successful `read_stream` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Number of samples written to the front of the caller's buffer.
    Samples(usize),
    /// No further complete record is available. The stream stays usable.
    Underflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    Write,
}

impl Access {
    fn name(self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
        }
    }

    fn direction(self) -> StreamDirection {
        match self {
            Access::Read => StreamDirection::Receive,
            Access::Write => StreamDirection::Transmit,
        }
    }
}

/// Lifecycle of the single stream a device may hand out.
#[derive(Debug)]
pub(crate) enum StreamSlot<S> {
    Unconfigured,
    Open {
        handle: StreamHandle,
        stream: S,
    },
    Closed(StreamHandle),
}

impl<S> Default for StreamSlot<S> {
    fn default() -> Self {
        StreamSlot::Unconfigured
    }
}

impl<S> StreamSlot<S> {
    /// Runs `open` and stores its stream. A failed open leaves the slot empty.
    pub(crate) fn setup(
        &mut self,
        direction: StreamDirection,
        format: SampleFormat,
        open: impl FnOnce() -> Result<S>,
    ) -> Result<StreamHandle> {
        if !matches!(self, StreamSlot::Unconfigured) {
            return Err(StreamError::AlreadyConfigured);
        }
        let stream = open()?;
        let handle = StreamHandle::issue(direction, format);
        *self = StreamSlot::Open { handle, stream };
        Ok(handle)
    }

    /// Validates `handle` for `access` with a buffer of `buf_format`.
    pub(crate) fn get(
        &mut self,
        handle: &StreamHandle,
        access: Access,
        buf_format: SampleFormat,
    ) -> Result<&mut S> {
        match self {
            StreamSlot::Open { handle: issued, stream } if issued.token == handle.token => {
                if issued.direction != access.direction() {
                    return Err(StreamError::WrongDirection {
                        op: access.name(),
                        direction: issued.direction,
                    });
                }
                if issued.format != buf_format {
                    return Err(StreamError::FormatMismatch {
                        expected: issued.format,
                        actual: buf_format,
                    });
                }
                Ok(stream)
            }
            StreamSlot::Closed(issued) if issued.token == handle.token => {
                Err(StreamError::StreamClosed)
            }
            _ => Err(StreamError::UnknownStream),
        }
    }

    /// Drops the stream. Closing twice is not an error.
    pub(crate) fn close(&mut self, handle: &StreamHandle) -> Result<()> {
        let issued = match self {
            StreamSlot::Open { handle: issued, .. } | StreamSlot::Closed(issued) => Some(*issued),
            StreamSlot::Unconfigured => None,
        };
        match issued {
            Some(issued) if issued.token == handle.token => {
                *self = StreamSlot::Closed(issued);
                Ok(())
            }
            _ => Err(StreamError::UnknownStream),
        }
    }
}
