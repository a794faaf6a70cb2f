//! Conversion between caller sample types and the `Complex<i8>` wire domain
//! that both backends store and transport.

use iqstream_messages::SampleFormat;
use num_complex::Complex;

/// Full-scale magnitude of one wire component.
pub const WIRE_SCALE: f32 = 127.0;

/// Sample storage and transport type.
pub type WireSample = Complex<i8>;

/// A caller-facing complex sample type.
pub trait IqSample: Copy + Default + Send + Sync + 'static {
    const FORMAT: SampleFormat;

    /// Builds a sample from raw integer components.
    fn from_raw(re: i32, im: i32) -> Self;

    fn to_wire(self) -> WireSample;

    fn from_wire(wire: WireSample) -> Self {
        Self::from_raw(wire.re.into(), wire.im.into())
    }
}

impl IqSample for Complex<i8> {
    const FORMAT: SampleFormat = SampleFormat::Cs8;

    fn from_raw(re: i32, im: i32) -> Self {
        Complex::new(clamp_i8(re), clamp_i8(im))
    }

    fn to_wire(self) -> WireSample {
        self
    }
}

impl IqSample for Complex<f32> {
    const FORMAT: SampleFormat = SampleFormat::Cf32;

    fn from_raw(re: i32, im: i32) -> Self {
        Complex::new(re as f32 / WIRE_SCALE, im as f32 / WIRE_SCALE)
    }

    // `as` truncates toward zero, saturates at the i8 bounds and maps NaN to 0.
    fn to_wire(self) -> WireSample {
        Complex::new((self.re * WIRE_SCALE) as i8, (self.im * WIRE_SCALE) as i8)
    }
}

fn clamp_i8(v: i32) -> i8 {
    v.clamp(i8::MIN.into(), i8::MAX.into()) as i8
}

/// Converts `src` into the wire domain, appending to `dst`.
pub fn extend_wire<S: IqSample>(dst: &mut Vec<WireSample>, src: &[S]) {
    dst.extend(src.iter().map(|s| s.to_wire()));
}

/// Converts wire samples into `dst`, element by element. Lengths must match.
pub fn fill_from_wire<S: IqSample>(dst: &mut [S], src: &[WireSample]) {
    debug_assert_eq!(dst.len(), src.len());
    for (out, wire) in dst.iter_mut().zip(src) {
        *out = S::from_wire(*wire);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cs8_round_trip_is_exact() {
        for re in -128..=127 {
            for im in -128..=127 {
                let s = Complex::<i8>::from_raw(re, im);
                let w = s.to_wire();
                assert_eq!((i32::from(w.re), i32::from(w.im)), (re, im));
            }
        }
    }

    #[test]
    fn test_cs8_clamps_out_of_range() {
        assert_eq!(Complex::<i8>::from_raw(300, -300), Complex::new(127, -128));
    }

    #[test]
    fn test_cf32_scaling() {
        let s = Complex::<f32>::from_raw(127, -127);
        assert_eq!(s, Complex::new(1.0, -1.0));
        assert_eq!(Complex::<f32>::from_raw(0, 0), Complex::new(0.0, 0.0));
    }

    #[test]
    fn test_cf32_round_trip_within_one_lsb() {
        for re in -128..=127 {
            let im = re / 2;
            let s = Complex::<f32>::from_raw(re, im);
            let w = s.to_wire();
            assert!((i32::from(w.re) - re).abs() <= 1, "re {re} -> {}", w.re);
            assert!((i32::from(w.im) - im).abs() <= 1, "im {im} -> {}", w.im);
            let back = Complex::<f32>::from_wire(w);
            let tolerance = 1.0 / WIRE_SCALE + f32::EPSILON;
            assert!((back.re - s.re).abs() <= tolerance);
            assert!((back.im - s.im).abs() <= tolerance);
        }
    }

    #[test]
    fn test_cf32_to_wire_truncates_toward_zero() {
        assert_eq!(Complex::new(0.0199f32, -0.0199).to_wire(), Complex::new(2, -2));
        assert_eq!(Complex::new(0.005f32, -0.005).to_wire(), Complex::new(0, 0));
    }

    #[test]
    fn test_cf32_to_wire_saturates() {
        assert_eq!(Complex::new(2.0f32, -2.0).to_wire(), Complex::new(127, -128));
        assert_eq!(Complex::new(f32::NAN, 0.5).to_wire(), Complex::new(0, 63));
    }
}
