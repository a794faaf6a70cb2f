use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::buffer::SampleBufMut;
use crate::burst::BurstState;
use crate::codec::WireSample;

/// Idealized shared medium: an unbounded FIFO of wire samples.
///
/// The queue is only touched under its lock, and each lock is held just long
/// enough to move samples in or out. Share one channel between devices with
/// an `Arc`.
#[derive(Debug, Default)]
pub struct VirtualChannel {
    queue: Mutex<VecDeque<WireSample>>,
}

impl VirtualChannel {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<WireSample>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `samples` contiguously.
    pub fn push(&self, samples: &[WireSample]) {
        self.lock().extend(samples.iter().copied());
    }

    /// Removes up to `max` samples from the front.
    pub fn pull(&self, max: usize) -> Vec<WireSample> {
        let mut queue = self.lock();
        let count = max.min(queue.len());
        queue.drain(..count).collect()
    }

    /// Fills the front of `buf` with whatever is queued. Never waits.
    pub fn read(&self, buf: &mut SampleBufMut<'_>) -> usize {
        let wire = self.pull(buf.len());
        buf.fill_from_wire(&wire);
        wire.len()
    }

    /// Puts `payload` on the channel inside the framing `burst` calls for.
    /// Returns the payload length; synthetic samples are not counted.
    pub fn transmit(
        &self,
        burst: &mut BurstState,
        payload: &[WireSample],
        end_of_burst: bool,
    ) -> usize {
        let framed = burst.frame(payload, end_of_burst);
        self.push(&framed);
        payload.len()
    }

    /// Samples currently queued.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
