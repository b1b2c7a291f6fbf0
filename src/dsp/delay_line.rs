//! # Delay Line (Ring Buffer)
//!
//! A delay line stores audio samples and lets you read them back after a
//! specified number of samples. It is the storage half of the echo
//! effect; [`Delay`](super::delay::Delay) adds the feedback and wet-level
//! math on top.
//!
//! ## How a Ring Buffer Works
//!
//! Picture a circular tape loop. A "write head" records incoming audio,
//! and a "read head" sits a fixed distance behind it. The distance
//! between the two heads is the delay. In code the tape is a `Vec<f32>`
//! and the write head is an index. For each audio sample:
//!
//! 1. Read the sample `delay` slots behind `write_pos`, wrapping around
//!    to the end of the buffer if we go past the start.
//! 2. Write the new sample at `write_pos`.
//! 3. Advance `write_pos` by 1, wrapping back to 0 at the end.
//!
//! Reading before writing matters: the slot at `write_pos` holds the
//! *oldest* sample in the ring, and it is about to be overwritten.

/// A fixed-capacity ring buffer of `f32` samples.
///
/// The buffer is allocated once, when the delay is prepared, so reading,
/// writing and clearing never touch the allocator.
#[derive(Debug, Clone)]
pub struct DelayLine {
    /// The circular buffer storing audio samples. Starts silent.
    buffer: Vec<f32>,

    /// Where the next incoming sample will be stored. Always in
    /// `0..capacity`.
    write_pos: usize,
}

impl DelayLine {
    /// Create a silent delay line holding `capacity` samples.
    ///
    /// A delay line can hold at most `capacity - 1` samples of delay,
    /// because a read of `capacity` samples back would land on the slot
    /// that is about to be overwritten. `capacity` must be at least 1.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "delay line capacity must be > 0");
        Self {
            buffer: vec![0.0; capacity.max(1)],
            write_pos: 0,
        }
    }

    /// Number of samples the ring holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Current write position.
    #[inline]
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Read the sample written `delay_samples` samples ago.
    ///
    /// `read(1)` returns the most recently written sample. The index
    /// math adds `capacity` before subtracting so the `usize` never goes
    /// negative:
    ///
    /// ```text
    /// read_index = (write_pos + capacity - delay) % capacity
    /// ```
    ///
    /// Example: `write_pos = 5`, `delay = 10`, `capacity = 100` gives
    /// `(5 + 100 - 10) % 100 = 95`, ten steps behind 5 on a ring of 100.
    ///
    /// Delays larger than `capacity` wrap; the caller keeps them in range.
    #[inline]
    pub fn read(&self, delay_samples: usize) -> f32 {
        let capacity = self.buffer.len();
        let delay = delay_samples % capacity;
        self.buffer[(self.write_pos + capacity - delay) % capacity]
    }

    /// Store a sample at the write position.
    ///
    /// This does NOT advance the write position; call
    /// [`advance()`](Self::advance) once the current sample is done so the
    /// old value can be read before it is overwritten.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
    }

    /// Move the write position forward one sample, wrapping at the end.
    #[inline]
    pub fn advance(&mut self) {
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Clear the buffer to silence and move the write position to 0.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Sum of squares of everything stored in the ring.
    pub fn energy(&self) -> f64 {
        self.buffer.iter().map(|&s| f64::from(s) * f64::from(s)).sum()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_back() {
        let mut dl = DelayLine::new(100);

        dl.write(0.75);
        dl.advance();

        let result = dl.read(1);
        assert!((result - 0.75).abs() < 1e-6, "Expected 0.75, got {result}");
    }

    /// Write 0..6 into a ring of 4; only the last four survive.
    #[test]
    fn test_wrapping() {
        let mut dl = DelayLine::new(4);

        for i in 0..6 {
            dl.write(i as f32);
            dl.advance();
        }

        // write_pos = 6 % 4 = 2, buffer = [4, 5, 2, 3]
        assert_eq!(dl.write_pos(), 2);
        assert_eq!(dl.read(1), 5.0);
        assert_eq!(dl.read(2), 4.0);
        assert_eq!(dl.read(3), 3.0);
        // The slot about to be overwritten holds the oldest sample.
        assert_eq!(dl.read(4), 2.0);
        assert_eq!(dl.read(0), 2.0);
    }

    #[test]
    fn test_fifo_sequence() {
        let mut dl = DelayLine::new(10);

        for i in 1..=5 {
            dl.write(i as f32);
            dl.advance();
        }

        for back in 1..=5 {
            let expected = (6 - back) as f32;
            assert_eq!(dl.read(back), expected, "read({back})");
        }
    }

    #[test]
    fn test_clear() {
        let mut dl = DelayLine::new(10);

        dl.write(0.5);
        dl.advance();
        dl.clear();

        assert_eq!(dl.write_pos(), 0);
        assert_eq!(dl.read(1), 0.0);
        assert_eq!(dl.energy(), 0.0);
    }

    #[test]
    fn test_silence_in_silence_out() {
        let dl = DelayLine::new(100);

        for delay in [1, 10, 50, 99] {
            let result = dl.read(delay);
            assert_eq!(result, 0.0, "Expected silence at delay {delay}");
        }
    }

    #[test]
    fn test_write_pos_stays_in_range() {
        let mut dl = DelayLine::new(3);
        for _ in 0..10 {
            dl.advance();
            assert!(dl.write_pos() < dl.capacity());
        }
        assert_eq!(dl.write_pos(), 1);
    }
}
