use std::io::{self, Read};

use num_complex::Complex;

use crate::buffer::SampleBufMut;
use crate::codec::WireSample;
use crate::error::Result;
use crate::stream::ReadStatus;

/// Bytes per frame: one signed byte each for I and Q.
const FRAME_BYTES: usize = 2;

/// Reader for headerless interleaved `i8` I/Q frames.
///
/// The format has no length framing, so each read takes as many frames as the
/// buffer holds or the file still has. A trailing odd byte is ignored.
pub struct BinaryFrameReader<R> {
    reader: R,
    scratch: Vec<u8>,
}

impl<R: Read> BinaryFrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            scratch: Vec::new(),
        }
    }

    pub fn read_frames(&mut self, buf: &mut SampleBufMut<'_>) -> Result<ReadStatus> {
        if buf.is_empty() {
            return Ok(ReadStatus::Samples(0));
        }

        let bytes_needed = buf.len() * FRAME_BYTES;
        self.scratch.resize(bytes_needed, 0);

        let mut total_read = 0;
        while total_read < bytes_needed {
            match self.reader.read(&mut self.scratch[total_read..]) {
                Ok(0) => break,
                Ok(n) => total_read += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        let frames = total_read / FRAME_BYTES;
        if frames == 0 {
            return Ok(ReadStatus::Underflow);
        }

        let wire: Vec<WireSample> = self.scratch[..frames * FRAME_BYTES]
            .chunks_exact(FRAME_BYTES)
            .map(|frame| Complex::new(frame[0] as i8, frame[1] as i8))
            .collect();
        buf.fill_from_wire(&wire);
        Ok(ReadStatus::Samples(frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_greedily_then_partial_then_underflow() {
        let bytes: Vec<u8> = [1i8, -1, 2, -2, 3, -3, 127, -128, 5]
            .iter()
            .map(|b| *b as u8)
            .collect();
        let mut r = BinaryFrameReader::new(Cursor::new(bytes));
        let mut out = vec![Complex::new(0i8, 0); 3];

        let status = r.read_frames(&mut SampleBufMut::from(&mut out[..])).unwrap();
        assert_eq!(status, ReadStatus::Samples(3));
        assert_eq!(out, vec![Complex::new(1i8, -1), Complex::new(2, -2), Complex::new(3, -3)]);

        let status = r.read_frames(&mut SampleBufMut::from(&mut out[..])).unwrap();
        assert_eq!(status, ReadStatus::Samples(1));
        assert_eq!(out[0], Complex::new(127, -128));

        let status = r.read_frames(&mut SampleBufMut::from(&mut out[..])).unwrap();
        assert_eq!(status, ReadStatus::Underflow);
    }

    #[test]
    fn test_cf32_frames() {
        let mut r = BinaryFrameReader::new(Cursor::new(vec![127u8, 0x81]));
        let mut out = vec![Complex::new(0.0f32, 0.0); 4];
        let status = r.read_frames(&mut SampleBufMut::from(&mut out[..])).unwrap();
        assert_eq!(status, ReadStatus::Samples(1));
        assert_eq!(out[0], Complex::new(1.0, -1.0));
    }

    #[test]
    fn test_empty_buffer_reads_nothing() {
        let mut r = BinaryFrameReader::new(Cursor::new(vec![1u8, 1]));
        let mut out: Vec<Complex<i8>> = Vec::new();
        let status = r.read_frames(&mut SampleBufMut::from(&mut out[..])).unwrap();
        assert_eq!(status, ReadStatus::Samples(0));
    }
}
