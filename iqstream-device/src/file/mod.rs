//! File-backed device: replays or records samples on disk.

mod binary;
mod text;

pub use binary::BinaryFrameReader;
pub use text::{TextRecordReader, TextRecordWriter};

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use iqstream_messages::{DeviceArgs, SampleFormat, StreamDirection};
use log::{debug, info, trace};

use crate::buffer::{SampleBuf, SampleBufMut};
use crate::error::{Result, StreamError};
use crate::stream::{Access, ReadStatus, StreamHandle, StreamSlot};
use crate::{Device, MAX_TRANSFER_UNIT};

/// On-disk sample layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Length-prefixed text records. Readable and writable.
    Text,
    /// Raw interleaved `i8` frames. Read-only.
    Binary,
}

impl Encoding {
    /// `.cs8` and `.bin` files hold binary frames, anything else text records.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("cs8") || ext.eq_ignore_ascii_case("bin") => {
                Encoding::Binary
            }
            _ => Encoding::Text,
        }
    }
}

impl FromStr for Encoding {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Encoding::Text),
            "binary" => Ok(Encoding::Binary),
            other => Err(StreamError::Configuration(format!(
                "unknown encoding '{other}', expected 'text' or 'binary'"
            ))),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Text => f.write_str("text"),
            Encoding::Binary => f.write_str("binary"),
        }
    }
}

enum RecordReader {
    Text(TextRecordReader<BufReader<File>>),
    Binary(BinaryFrameReader<BufReader<File>>),
}

/// The opened file, tagged with the only access it permits.
enum FileResource {
    Read(RecordReader),
    Write(TextRecordWriter<BufWriter<File>>),
}

/// Device that reads or writes one file through a single stream.
///
/// Calls on the stream are serialized internally, but the record cursor is
/// strictly sequential: interleaving reads from several threads splits records
/// between them in whatever order the lock is won.
pub struct FileDevice {
    path: PathBuf,
    encoding: Encoding,
    slot: Mutex<StreamSlot<FileResource>>,
}

impl FileDevice {
    /// Encoding is derived from the file extension.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let encoding = Encoding::from_path(&path);
        Self::with_encoding(path, encoding)
    }

    pub fn with_encoding(path: impl Into<PathBuf>, encoding: Encoding) -> Self {
        Self {
            path: path.into(),
            encoding,
            slot: Mutex::new(StreamSlot::default()),
        }
    }

    /// Reads `path` and the optional `encoding` override. Other keys are ignored.
    pub fn from_args(args: &DeviceArgs) -> Result<Self> {
        let path = match args.get("path") {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => {
                return Err(StreamError::Configuration(
                    "file device requires a 'path' argument".to_string(),
                ));
            }
        };
        let device = match args.get("encoding") {
            Some(encoding) => Self::with_encoding(path, encoding.parse()?),
            None => Self::new(path),
        };
        Ok(device)
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record encoding used for this file.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn lock(&self) -> MutexGuard<'_, StreamSlot<FileResource>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self, direction: StreamDirection) -> Result<FileResource> {
        let open_error = |source: io::Error| StreamError::ResourceOpen {
            path: self.path.clone(),
            source,
        };

        match direction {
            StreamDirection::Receive => {
                let file = BufReader::new(File::open(&self.path).map_err(open_error)?);
                let reader = match self.encoding {
                    Encoding::Text => RecordReader::Text(TextRecordReader::new(file)),
                    Encoding::Binary => RecordReader::Binary(BinaryFrameReader::new(file)),
                };
                Ok(FileResource::Read(reader))
            }
            StreamDirection::Transmit => {
                if self.encoding == Encoding::Binary {
                    return Err(StreamError::ResourceReadOnly(self.path.clone()));
                }
                let file = BufWriter::new(File::create(&self.path).map_err(open_error)?);
                Ok(FileResource::Write(TextRecordWriter::new(file)))
            }
        }
    }
}

impl Device for FileDevice {
    fn driver(&self) -> &'static str {
        "file"
    }

    fn setup_stream(&self, direction: StreamDirection, format: &str) -> Result<StreamHandle> {
        let format: SampleFormat = format.parse()?;
        let mut slot = self.lock();
        let handle = slot.setup(direction, format, || self.open(direction))?;
        info!(
            "Opening file ({direction}, {format}, {}) with path: {}",
            self.encoding,
            self.path.display()
        );
        Ok(handle)
    }

    fn read_stream(
        &self,
        handle: &StreamHandle,
        mut buf: SampleBufMut<'_>,
        _timeout: Duration,
    ) -> Result<ReadStatus> {
        let mut slot = self.lock();
        let status = match slot.get(handle, Access::Read, buf.format())? {
            FileResource::Read(RecordReader::Text(reader)) => reader.read_record(&mut buf),
            FileResource::Read(RecordReader::Binary(reader)) => reader.read_frames(&mut buf),
            FileResource::Write(_) => Err(StreamError::WrongDirection {
                op: "read",
                direction: StreamDirection::Transmit,
            }),
        };
        trace!("readStream: capacity {}, status {status:?}", buf.len());

        if let Err(err @ StreamError::Parse { .. }) = &status {
            debug!("Closing {} after {err}", self.path.display());
            slot.close(handle)?;
        }
        status
    }

    fn write_stream(
        &self,
        handle: &StreamHandle,
        buf: SampleBuf<'_>,
        _end_of_burst: bool,
        _timeout: Duration,
    ) -> Result<usize> {
        let mut slot = self.lock();
        let written = match slot.get(handle, Access::Write, buf.format())? {
            FileResource::Write(writer) => writer.write_record(&buf)?,
            FileResource::Read(_) => {
                return Err(StreamError::WrongDirection {
                    op: "write",
                    direction: StreamDirection::Receive,
                });
            }
        };
        trace!("writeStream: {written} samples");
        Ok(written)
    }

    fn close_stream(&self, handle: &StreamHandle) -> Result<()> {
        self.lock().close(handle)
    }

    fn stream_mtu(&self, _handle: &StreamHandle) -> usize {
        MAX_TRANSFER_UNIT
    }
}
