//! Error type shared by every device backend.
//!
//! Running out of data is not an error: reads report it through
//! [`ReadStatus::Underflow`](crate::ReadStatus::Underflow).

use std::io;
use std::path::PathBuf;

use iqstream_messages::{SampleFormat, StreamDirection, UnknownFormat};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    /// Missing or invalid device arguments
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unsupported sample format '{0}'")]
    UnsupportedFormat(String),

    /// A device hands out a single stream over its lifetime
    #[error("stream already configured")]
    AlreadyConfigured,

    #[error("cannot {op} on a {direction} stream")]
    WrongDirection {
        op: &'static str,
        direction: StreamDirection,
    },

    #[error("failed to open {}: {source}", path.display())]
    ResourceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is read-only", .0.display())]
    ResourceReadOnly(PathBuf),

    /// Malformed record content. The stream is unusable afterwards.
    #[error("malformed record at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("record of {needed} samples does not fit a buffer of {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },

    #[error("{actual} buffer passed to a stream bound to {expected}")]
    FormatMismatch {
        expected: SampleFormat,
        actual: SampleFormat,
    },

    #[error("stream handle was not issued by this device")]
    UnknownStream,

    #[error("stream is closed")]
    StreamClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<UnknownFormat> for StreamError {
    fn from(err: UnknownFormat) -> Self {
        StreamError::UnsupportedFormat(err.0)
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
