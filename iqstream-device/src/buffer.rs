use iqstream_messages::SampleFormat;
use num_complex::Complex;

use crate::codec::{self, IqSample, WireSample};

/// Caller samples handed to `write_stream`.
#[derive(Debug, Clone, Copy)]
pub enum SampleBuf<'a> {
    Cs8(&'a [Complex<i8>]),
    Cf32(&'a [Complex<f32>]),
}

/// Caller buffer filled by `read_stream`. Its length is the maximum count.
#[derive(Debug)]
pub enum SampleBufMut<'a> {
    Cs8(&'a mut [Complex<i8>]),
    Cf32(&'a mut [Complex<f32>]),
}

impl SampleBuf<'_> {
    /// Sample format of the underlying storage.
    pub fn format(&self) -> SampleFormat {
        match self {
            SampleBuf::Cs8(_) => SampleFormat::Cs8,
            SampleBuf::Cf32(_) => SampleFormat::Cf32,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            SampleBuf::Cs8(buf) => buf.len(),
            SampleBuf::Cf32(buf) => buf.len(),
        }
    }

    /// True when the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wire-domain copy of the samples.
    pub fn to_wire(&self) -> Vec<WireSample> {
        let mut wire = Vec::with_capacity(self.len());
        match *self {
            SampleBuf::Cs8(buf) => codec::extend_wire(&mut wire, buf),
            SampleBuf::Cf32(buf) => codec::extend_wire(&mut wire, buf),
        }
        wire
    }
}

impl SampleBufMut<'_> {
    /// Sample format of the underlying storage.
    pub fn format(&self) -> SampleFormat {
        match self {
            SampleBufMut::Cs8(_) => SampleFormat::Cs8,
            SampleBufMut::Cf32(_) => SampleFormat::Cf32,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            SampleBufMut::Cs8(buf) => buf.len(),
            SampleBufMut::Cf32(buf) => buf.len(),
        }
    }

    /// True when the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores raw integer components at `index`.
    pub fn set_raw(&mut self, index: usize, re: i32, im: i32) {
        match self {
            SampleBufMut::Cs8(buf) => buf[index] = IqSample::from_raw(re, im),
            SampleBufMut::Cf32(buf) => buf[index] = IqSample::from_raw(re, im),
        }
    }

    /// Converts `wire` into the first `wire.len()` slots.
    pub fn fill_from_wire(&mut self, wire: &[WireSample]) {
        match self {
            SampleBufMut::Cs8(buf) => codec::fill_from_wire(&mut buf[..wire.len()], wire),
            SampleBufMut::Cf32(buf) => codec::fill_from_wire(&mut buf[..wire.len()], wire),
        }
    }
}

impl<'a> From<&'a [Complex<i8>]> for SampleBuf<'a> {
    fn from(buf: &'a [Complex<i8>]) -> Self {
        SampleBuf::Cs8(buf)
    }
}

impl<'a> From<&'a [Complex<f32>]> for SampleBuf<'a> {
    fn from(buf: &'a [Complex<f32>]) -> Self {
        SampleBuf::Cf32(buf)
    }
}

impl<'a> From<&'a mut [Complex<i8>]> for SampleBufMut<'a> {
    fn from(buf: &'a mut [Complex<i8>]) -> Self {
        SampleBufMut::Cs8(buf)
    }
}

impl<'a> From<&'a mut [Complex<f32>]> for SampleBufMut<'a> {
    fn from(buf: &'a mut [Complex<f32>]) -> Self {
        SampleBufMut::Cf32(buf)
    }
}

/// Owned sample storage of either format.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleVec {
    Cs8(Vec<Complex<i8>>),
    Cf32(Vec<Complex<f32>>),
}

impl SampleVec {
    /// Zeroed storage for `len` samples.
    pub fn zeroed(format: SampleFormat, len: usize) -> Self {
        match format {
            SampleFormat::Cs8 => SampleVec::Cs8(vec![Complex::default(); len]),
            SampleFormat::Cf32 => SampleVec::Cf32(vec![Complex::default(); len]),
        }
    }

    /// Sample format of the underlying storage.
    pub fn format(&self) -> SampleFormat {
        match self {
            SampleVec::Cs8(_) => SampleFormat::Cs8,
            SampleVec::Cf32(_) => SampleFormat::Cf32,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            SampleVec::Cs8(v) => v.len(),
            SampleVec::Cf32(v) => v.len(),
        }
    }

    /// True when the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The first `len` samples.
    pub fn head(&self, len: usize) -> SampleBuf<'_> {
        match self {
            SampleVec::Cs8(v) => SampleBuf::Cs8(&v[..len]),
            SampleVec::Cf32(v) => SampleBuf::Cf32(&v[..len]),
        }
    }

    /// Borrows the whole vector as a read-only buffer.
    pub fn as_buf(&self) -> SampleBuf<'_> {
        self.head(self.len())
    }

    /// Borrows the whole vector as a writable buffer.
    pub fn as_buf_mut(&mut self) -> SampleBufMut<'_> {
        match self {
            SampleVec::Cs8(v) => SampleBufMut::Cs8(v),
            SampleVec::Cf32(v) => SampleBufMut::Cf32(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_formats() {
        let cs8 = [Complex::new(1i8, 2)];
        let mut cf32 = [Complex::new(0.0f32, 0.0); 3];
        assert_eq!(SampleBuf::from(&cs8[..]).format(), SampleFormat::Cs8);
        assert_eq!(SampleBufMut::from(&mut cf32[..]).format(), SampleFormat::Cf32);
        assert_eq!(SampleBufMut::from(&mut cf32[..]).len(), 3);
    }

    #[test]
    fn test_fill_from_wire_leaves_tail_untouched() {
        let mut out = vec![Complex::new(9i8, 9); 4];
        SampleBufMut::from(&mut out[..]).fill_from_wire(&[Complex::new(1, -1), Complex::new(2, -2)]);
        assert_eq!(
            out,
            vec![
                Complex::new(1i8, -1),
                Complex::new(2, -2),
                Complex::new(9, 9),
                Complex::new(9, 9),
            ]
        );
    }

    #[test]
    fn test_sample_vec_head() {
        let v = SampleVec::zeroed(SampleFormat::Cf32, 8);
        assert_eq!(v.len(), 8);
        assert_eq!(v.head(3).len(), 3);
        assert_eq!(v.as_buf().format(), SampleFormat::Cf32);
    }
}
