//! Line-oriented record format.
//!
//! ```text
//! <N>
//! <re> <im>    (N lines)
//! ```

use std::io::{self, BufRead, Write};

use crate::buffer::{SampleBuf, SampleBufMut};
use crate::error::{Result, StreamError};
use crate::stream::ReadStatus;

pub struct TextRecordReader<R> {
    reader: R,
    line: String,
    line_no: usize,
    // Header already consumed by a read whose buffer was too small.
    pending: Option<usize>,
}

impl<R: BufRead> TextRecordReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
            pending: None,
        }
    }

    /// Reads the next record into the front of `buf`.
    pub fn read_record(&mut self, buf: &mut SampleBufMut<'_>) -> Result<ReadStatus> {
        let len = match self.pending.take() {
            Some(len) => len,
            None => match self.read_header()? {
                Some(len) => len,
                None => return Ok(ReadStatus::Underflow),
            },
        };

        if len > buf.len() {
            self.pending = Some(len);
            return Err(StreamError::BufferTooSmall {
                needed: len,
                capacity: buf.len(),
            });
        }

        for i in 0..len {
            if !self.next_line()? {
                return Err(self.parse_error(format!(
                    "end of file after {i} of {len} samples"
                )));
            }
            let (re, im) = self.parse_pair()?;
            buf.set_raw(i, re, im);
        }
        Ok(ReadStatus::Samples(len))
    }

    /// Skips blank lines. `None` at end of file.
    fn read_header(&mut self) -> Result<Option<usize>> {
        while self.next_line()? {
            let text = self.line.trim();
            if text.is_empty() {
                continue;
            }
            // `usize::from_str` would also take a leading '+'.
            if !text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(self.parse_error(format!("invalid record length '{text}'")));
            }
            return match text.parse::<usize>() {
                Ok(len) => Ok(Some(len)),
                Err(e) => Err(self.parse_error(format!("invalid record length '{text}': {e}"))),
            };
        }
        Ok(None)
    }

    fn parse_pair(&self) -> Result<(i32, i32)> {
        let mut fields = self.line.split_ascii_whitespace();
        let pair = match (fields.next(), fields.next(), fields.next()) {
            (Some(re), Some(im), None) => re.parse().ok().zip(im.parse().ok()),
            _ => None,
        };
        pair.ok_or_else(|| {
            self.parse_error(format!("expected '<re> <im>', got '{}'", self.line.trim_end()))
        })
    }

    fn next_line(&mut self) -> Result<bool> {
        self.line.clear();
        match self.reader.read_line(&mut self.line) {
            Ok(0) => Ok(false),
            Ok(_) => {
                self.line_no += 1;
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                Err(self.parse_error(format!("line is not valid UTF-8: {e}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn parse_error(&self, reason: String) -> StreamError {
        StreamError::Parse {
            line: self.line_no,
            reason,
        }
    }
}

pub struct TextRecordWriter<W> {
    writer: W,
}

impl<W: Write> TextRecordWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes `buf` as one record and flushes it.
    pub fn write_record(&mut self, buf: &SampleBuf<'_>) -> Result<usize> {
        let wire = buf.to_wire();
        writeln!(self.writer, "{}", wire.len())?;
        for sample in &wire {
            writeln!(self.writer, "{} {}", sample.re, sample.im)?;
        }
        self.writer.flush()?;
        Ok(wire.len())
    }
}
