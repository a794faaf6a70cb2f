//! Burst framing for the virtual channel.
//!
//! A burst opens with a low-level tone followed by a raised-cosine ramp up to
//! the settling level, and closes with the low-level tone again. Receivers see
//! the same settling a real front end produces around a transmission.

use std::f64::consts::TAU;

use num_complex::Complex;

use crate::codec::{IqSample, WireSample};

pub const PREAMBLE_LEN: usize = 500;
pub const RAMP_LEN: usize = 50;
pub const POSTAMBLE_LEN: usize = 500;

/// Tone frequency in cycles per sample.
const TONE_FREQUENCY: f64 = 0.0193;
const FLOOR_AMPLITUDE: f32 = 1e-2;
const RAMP_AMPLITUDE: f32 = 1e-1;

/// Burst progress of one transmit stream.
///
/// `phase` counts every sample the stream has put on the channel, synthetic or
/// payload, and is never reset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BurstState {
    in_burst: bool,
    phase: u64,
}

impl BurstState {
    pub fn in_burst(&self) -> bool {
        self.in_burst
    }

    pub fn phase(&self) -> u64 {
        self.phase
    }

    /// Wraps `payload` in whatever framing the burst needs at this point and
    /// advances the state.
    pub fn frame(&mut self, payload: &[WireSample], end_of_burst: bool) -> Vec<WireSample> {
        let mut framed = Vec::with_capacity(
            PREAMBLE_LEN + RAMP_LEN + payload.len() + POSTAMBLE_LEN,
        );

        if !self.in_burst {
            for _ in 0..PREAMBLE_LEN {
                framed.push(self.next_tone(FLOOR_AMPLITUDE));
            }
            for k in 0..RAMP_LEN {
                framed.push(self.next_tone(ramp_amplitude(k)));
            }
            self.in_burst = true;
        }

        framed.extend_from_slice(payload);
        self.phase += payload.len() as u64;

        if end_of_burst {
            for _ in 0..POSTAMBLE_LEN {
                framed.push(self.next_tone(FLOOR_AMPLITUDE));
            }
            self.in_burst = false;
        }
        framed
    }

    fn next_tone(&mut self, amplitude: f32) -> WireSample {
        let sample = tone(self.phase, amplitude);
        self.phase += 1;
        sample
    }
}

/// Half-cosine envelope from the floor up to the ramp level over `RAMP_LEN`.
fn ramp_amplitude(k: usize) -> f32 {
    let progress = 0.5 - 0.5 * (std::f32::consts::PI * k as f32 / RAMP_LEN as f32).cos();
    FLOOR_AMPLITUDE + (RAMP_AMPLITUDE - FLOOR_AMPLITUDE) * progress
}

fn tone(phase: u64, amplitude: f32) -> WireSample {
    // Reduce to one cycle in f64 so long-running streams keep their precision.
    let angle = TAU * (phase as f64 * TONE_FREQUENCY).fract();
    let (sin, cos) = angle.sin_cos();
    Complex::new(amplitude * cos as f32, amplitude * sin as f32).to_wire()
}
