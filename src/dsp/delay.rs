//! # Feedback Delay Engine
//!
//! One [`DelayLine`] per channel plus the math that turns a ring buffer
//! into an echo:
//!
//! ```text
//!             ┌─────────────────────────────────────────┐
//!             │                                         │
//! input ───►(+)──► [ DelayLine: d samples ] ──┬──► × feedback
//!                                             │
//!                                             └──► × wet ───► output
//! ```
//!
//! For every sample, in time order:
//!
//! 1. `delayed = line.read(d)`, the sample written `d` samples ago
//! 2. `output  = wet * delayed`
//! 3. `line.write(input + feedback * delayed)`
//! 4. `line.advance()`
//!
//! An impulse therefore comes back after `d` samples at full wet level,
//! again after `2d` at `feedback`, after `3d` at `feedback²`, and so on.
//! The output holds only the echoes. Mixing the dry signal back in is the
//! processor's job.
//!
//! ## Stability
//!
//! With `feedback >= 1` each trip around the loop is at least as loud as
//! the last, and the echoes never die (or grow until they clip). The
//! setter clamps feedback to [`MAX_FEEDBACK`], so no caller can configure
//! a loop with gain of 1 or more.

use nih_plug::nih_debug_assert;

use super::delay_line::DelayLine;
use crate::config::DelayConfig;
use crate::error::{Result, SetupError};

/// Largest feedback coefficient the engine accepts.
pub const MAX_FEEDBACK: f32 = 0.999;

/// Multi-channel feedback delay.
///
/// Lifecycle: [`prepare()`](Self::prepare) sizes the ring buffers,
/// [`set_delay_time()`](Self::set_delay_time) and friends configure
/// them, [`process()`](Self::process) runs once per block.
/// [`reset()`](Self::reset) silences the rings between blocks.
#[derive(Debug, Clone)]
pub struct Delay {
    sample_rate: f64,
    max_delay_time: f64,
    lines: Vec<DelayLine>,
    /// Read-behind offset per channel, in samples. Always in
    /// `1..capacity`.
    delay_samples: Vec<usize>,
    feedback: f32,
    wet_level: f32,
    prepared: bool,
}

impl Delay {
    pub fn new() -> Self {
        Self {
            sample_rate: 0.0,
            max_delay_time: DelayConfig::DEFAULT_MAX_DELAY_TIME,
            lines: Vec::new(),
            delay_samples: Vec::new(),
            feedback: 0.0,
            wet_level: 1.0,
            prepared: false,
        }
    }

    /// Allocate one silent ring buffer per channel, big enough for the
    /// current maximum delay time at `sample_rate`.
    ///
    /// Every channel's delay starts at the minimum (one sample); set the
    /// real delay times afterwards. On error the engine is left
    /// unprepared and [`process()`](Self::process) does nothing.
    pub fn prepare(
        &mut self,
        sample_rate: f64,
        max_block_size: usize,
        num_channels: usize,
    ) -> Result<()> {
        self.prepared = false;

        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(SetupError::InvalidSampleRate(sample_rate));
        }
        if max_block_size == 0 {
            return Err(SetupError::InvalidBlockSize(max_block_size));
        }
        if num_channels == 0 {
            return Err(SetupError::InvalidChannelCount(num_channels));
        }

        self.sample_rate = sample_rate;
        let capacity = capacity_for(self.max_delay_time, sample_rate);
        self.lines = (0..num_channels).map(|_| DelayLine::new(capacity)).collect();
        self.delay_samples = vec![1; num_channels];
        self.prepared = true;

        Ok(())
    }

    /// Zero every ring buffer and move every write cursor back to 0.
    ///
    /// Call between blocks, never in the middle of one.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
    }

    /// Set the longest delay the rings must hold, in seconds.
    ///
    /// Before `prepare()` this just records the value. After it, the
    /// rings already have a fixed size: shrinking is fine (delay times
    /// are pulled in to fit), growing past the allocated capacity is an
    /// error and needs a new `prepare()`.
    pub fn set_max_delay_time(&mut self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(SetupError::InvalidMaxDelayTime(seconds));
        }

        if self.prepared {
            let requested = capacity_for(seconds, self.sample_rate);
            let capacity = self.capacity();
            if requested > capacity {
                return Err(SetupError::CapacityExceeded {
                    requested,
                    capacity,
                });
            }

            let longest = self.seconds_to_samples(seconds);
            for delay in &mut self.delay_samples {
                *delay = (*delay).min(longest);
            }
        }

        self.max_delay_time = seconds;
        Ok(())
    }

    /// Set how far behind the write cursor `channel` reads, in seconds.
    ///
    /// `seconds` must lie in `[0, max_delay_time]`. It is rounded to a
    /// whole number of samples, and a zero-sample delay is treated as one
    /// sample since the loop cannot feed back faster than that.
    pub fn set_delay_time(&mut self, channel: usize, seconds: f64) -> Result<()> {
        if !self.prepared {
            return Err(SetupError::NotPrepared);
        }
        if channel >= self.lines.len() {
            return Err(SetupError::ChannelOutOfRange {
                channel,
                channels: self.lines.len(),
            });
        }
        if !(0.0..=self.max_delay_time).contains(&seconds) {
            return Err(SetupError::DelayTimeOutOfRange {
                seconds,
                max: self.max_delay_time,
            });
        }

        self.delay_samples[channel] = self.seconds_to_samples(seconds);
        Ok(())
    }

    /// Set the feedback coefficient, clamped to `[0, MAX_FEEDBACK]`.
    /// NaN is treated as 0.
    pub fn set_feedback(&mut self, coefficient: f32) {
        self.feedback = if coefficient.is_nan() {
            0.0
        } else {
            coefficient.clamp(0.0, MAX_FEEDBACK)
        };
    }

    /// Set the wet level, clamped to `[0, 1]`. NaN is treated as 0.
    pub fn set_wet_level(&mut self, coefficient: f32) {
        self.wet_level = if coefficient.is_nan() {
            0.0
        } else {
            coefficient.clamp(0.0, 1.0)
        };
    }

    /// Replace every sample of `block` with its delayed, feedback-mixed,
    /// wet-scaled counterpart.
    ///
    /// Channel `i` of the block goes through ring `i`. Channels are
    /// processed independently and each one in time order, so the write
    /// cursors stay in phase from one block to the next. Extra channels
    /// beyond the prepared count are left alone.
    pub fn process<C: AsMut<[f32]>>(&mut self, block: &mut [C]) {
        if !self.prepared {
            return;
        }
        nih_debug_assert!(
            block.len() <= self.lines.len(),
            "block has more channels than the delay was prepared for"
        );

        let feedback = self.feedback;
        let wet_level = self.wet_level;

        for ((channel, line), &delay) in block
            .iter_mut()
            .zip(self.lines.iter_mut())
            .zip(self.delay_samples.iter())
        {
            for sample in channel.as_mut() {
                let delayed = line.read(delay);
                line.write(*sample + feedback * delayed);
                line.advance();
                *sample = wet_level * delayed;
            }
        }
    }

    /// How many samples the echoes keep ringing after the input stops,
    /// down to -60 dB.
    ///
    /// The k-th echo has level `feedback^(k-1)`, so it takes
    /// `log(0.001) / log(feedback)` repeats past the first to drop by
    /// 60 dB, one delay period each.
    pub fn tail_samples(&self) -> u32 {
        let longest = self.delay_samples.iter().copied().max().unwrap_or(0) as f64;

        let periods = if self.feedback > 0.001 {
            // log10(0.001) = -3
            (-3.0 / f64::from(self.feedback).log10()).ceil() + 1.0
        } else {
            1.0
        };

        (periods * longest).min(u32::MAX as f64) as u32
    }

    #[inline]
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.lines.len()
    }

    /// Ring size per channel, in samples. 0 before `prepare()`.
    pub fn capacity(&self) -> usize {
        self.lines.first().map(DelayLine::capacity).unwrap_or(0)
    }

    pub fn delay_samples(&self, channel: usize) -> Option<usize> {
        self.delay_samples.get(channel).copied()
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn wet_level(&self) -> f32 {
        self.wet_level
    }

    /// Total energy currently stored across all rings.
    pub fn energy(&self) -> f64 {
        self.lines.iter().map(DelayLine::energy).sum()
    }

    /// Round to whole samples and keep the result readable: at least one
    /// sample, at most `capacity - 1`.
    fn seconds_to_samples(&self, seconds: f64) -> usize {
        let samples = (seconds * self.sample_rate).round() as usize;
        samples.clamp(1, self.capacity().saturating_sub(1).max(1))
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new()
    }
}

/// Ring size needed to read `seconds` behind the write cursor.
///
/// One slot more than the delay itself: the slot under the write cursor
/// is read as the *oldest* sample, so a ring of `n` reaches back `n - 1`.
fn capacity_for(seconds: f64, sample_rate: f64) -> usize {
    (seconds * sample_rate).ceil() as usize + 1
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// 1 kHz makes sample counts easy to read: 10 ms = 10 samples.
    fn delay_1k(channels: usize, delay_seconds: f64, feedback: f32) -> Delay {
        let mut delay = Delay::new();
        delay.prepare(1000.0, 64, channels).unwrap();
        for ch in 0..channels {
            delay.set_delay_time(ch, delay_seconds).unwrap();
        }
        delay.set_feedback(feedback);
        delay.set_wet_level(1.0);
        delay
    }

    /// An impulse should come back every `d` samples, each echo
    /// `feedback` times the previous one, and nothing in between.
    #[test]
    fn test_echo_spacing_and_decay() {
        let mut delay = delay_1k(1, 0.01, 0.5);

        let mut block = vec![vec![0.0_f32; 64]];
        block[0][0] = 1.0;
        delay.process(&mut block);

        for (i, &out) in block[0].iter().enumerate() {
            let expected = if i > 0 && i % 10 == 0 {
                0.5_f32.powi(i as i32 / 10 - 1)
            } else {
                0.0
            };
            assert!(
                (out - expected).abs() < 1e-6,
                "Sample {i}: expected {expected}, got {out}"
            );
        }
    }

    /// The cursor carries over between blocks, so echoes land in the
    /// right place even when they cross a block boundary.
    #[test]
    fn test_echoes_cross_block_boundaries() {
        let mut delay = delay_1k(1, 0.025, 0.5);

        let mut output = Vec::new();
        for block_idx in 0..4 {
            let mut block = vec![vec![0.0_f32; 16]];
            if block_idx == 0 {
                block[0][0] = 1.0;
            }
            delay.process(&mut block);
            output.extend_from_slice(&block[0]);
        }

        assert!((output[25] - 1.0).abs() < 1e-6);
        assert!((output[50] - 0.5).abs() < 1e-6);
        let others: f32 = output
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 25 && *i != 50)
            .map(|(_, s)| s.abs())
            .sum();
        assert!(others < 1e-6, "Unexpected energy off the echo grid: {others}");
    }

    #[test]
    fn test_wet_level_scales_output_only() {
        let mut delay = delay_1k(1, 0.01, 0.5);
        delay.set_wet_level(0.25);

        let mut block = vec![vec![0.0_f32; 32]];
        block[0][0] = 1.0;
        delay.process(&mut block);

        // The feedback path is unaffected by wet level.
        assert!((block[0][10] - 0.25).abs() < 1e-6);
        assert!((block[0][20] - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut delay = delay_1k(2, 0.01, 0.5);
        delay.set_delay_time(1, 0.005).unwrap();

        let mut block = vec![vec![0.0_f32; 32], vec![0.0_f32; 32]];
        block[0][0] = 1.0;
        block[1][3] = -1.0;
        delay.process(&mut block);

        assert!((block[0][10] - 1.0).abs() < 1e-6);
        assert!((block[1][8] + 1.0).abs() < 1e-6);
        assert!(block[1][10].abs() < 1e-6);
        assert!(block[0][8].abs() < 1e-6);
    }

    #[test]
    fn test_feedback_is_clamped() {
        let mut delay = Delay::new();
        delay.set_feedback(1.5);
        assert_eq!(delay.feedback(), MAX_FEEDBACK);
        delay.set_feedback(-0.2);
        assert_eq!(delay.feedback(), 0.0);
        delay.set_feedback(f32::NAN);
        assert_eq!(delay.feedback(), 0.0);

        delay.set_wet_level(3.0);
        assert_eq!(delay.wet_level(), 1.0);
        delay.set_wet_level(-3.0);
        assert_eq!(delay.wet_level(), 0.0);
    }

    /// Even asking for runaway feedback, the loop gain stays below 1 and
    /// a constant full-scale input settles at 1 / (1 - 0.999) = 1000.
    #[test]
    fn test_output_bounded_over_long_run() {
        let mut delay = delay_1k(1, 0.001, 10.0);
        let bound = 1.0 / (1.0 - MAX_FEEDBACK) + 1.0;

        for _ in 0..2000 {
            let mut block = vec![vec![1.0_f32; 64]];
            delay.process(&mut block);
            for &s in &block[0] {
                assert!(s.is_finite() && s.abs() <= bound, "Runaway gain: {s}");
            }
        }
        assert!(delay.energy().is_finite());
    }

    /// reset() followed by silence must give silence.
    #[test]
    fn test_reset_leaves_no_residue() {
        let mut delay = delay_1k(2, 0.01, 0.9);

        let mut noisy = vec![vec![0.8_f32; 64], vec![-0.3_f32; 64]];
        delay.process(&mut noisy);
        assert!(delay.energy() > 0.0);

        delay.reset();
        assert_eq!(delay.energy(), 0.0);

        for _ in 0..3 {
            let mut silent = vec![vec![0.0_f32; 64], vec![0.0_f32; 64]];
            delay.process(&mut silent);
            assert!(silent.iter().flatten().all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_zero_delay_reads_one_sample_back() {
        let mut delay = delay_1k(1, 0.0, 0.0);
        assert_eq!(delay.delay_samples(0), Some(1));

        let mut block = vec![vec![1.0_f32, 0.0, 0.0]];
        delay.process(&mut block);
        assert_eq!(block[0], vec![0.0, 1.0, 0.0]);
    }

    /// The full maximum delay must be reachable.
    #[test]
    fn test_max_delay_fits_in_ring() {
        let mut delay = delay_1k(1, 1.0, 0.0);
        assert_eq!(delay.capacity(), 1001);
        assert_eq!(delay.delay_samples(0), Some(1000));

        let mut output = Vec::new();
        for block_idx in 0..20 {
            let mut block = vec![vec![0.0_f32; 64]];
            if block_idx == 0 {
                block[0][0] = 1.0;
            }
            delay.process(&mut block);
            output.extend_from_slice(&block[0]);
        }
        assert_eq!(output[1000], 1.0);
        assert_eq!(output.iter().filter(|&&s| s != 0.0).count(), 1);
    }

    #[test]
    fn test_prepare_rejects_bad_config() {
        let mut delay = Delay::new();
        assert_eq!(
            delay.prepare(0.0, 512, 2),
            Err(SetupError::InvalidSampleRate(0.0))
        );
        assert_eq!(
            delay.prepare(48000.0, 0, 2),
            Err(SetupError::InvalidBlockSize(0))
        );
        assert_eq!(
            delay.prepare(48000.0, 512, 0),
            Err(SetupError::InvalidChannelCount(0))
        );
        assert!(!delay.is_prepared());
    }

    #[test]
    fn test_failed_prepare_leaves_engine_unprepared() {
        let mut delay = delay_1k(1, 0.01, 0.5);
        assert!(delay.prepare(-1.0, 64, 1).is_err());
        assert!(!delay.is_prepared());

        let mut block = vec![vec![0.5_f32; 8]];
        delay.process(&mut block);
        assert_eq!(block[0], vec![0.5; 8]);
    }

    #[test]
    fn test_delay_time_validation() {
        let mut delay = Delay::new();
        assert_eq!(delay.set_delay_time(0, 0.4), Err(SetupError::NotPrepared));

        delay.prepare(1000.0, 64, 2).unwrap();
        assert_eq!(
            delay.set_delay_time(2, 0.4),
            Err(SetupError::ChannelOutOfRange {
                channel: 2,
                channels: 2
            })
        );
        assert_eq!(
            delay.set_delay_time(0, 1.5),
            Err(SetupError::DelayTimeOutOfRange {
                seconds: 1.5,
                max: 1.0
            })
        );
        assert!(delay.set_delay_time(0, -0.1).is_err());
        assert_eq!(delay.set_delay_time(1, 0.4), Ok(()));
        assert_eq!(delay.delay_samples(1), Some(400));
    }

    /// Growing the maximum delay past the allocated ring needs a new
    /// prepare(); shrinking it pulls long delays in.
    #[test]
    fn test_max_delay_time_guard() {
        let mut delay = delay_1k(1, 0.8, 0.0);

        assert_eq!(
            delay.set_max_delay_time(2.0),
            Err(SetupError::CapacityExceeded {
                requested: 2001,
                capacity: 1001
            })
        );
        assert_eq!(delay.delay_samples(0), Some(800));

        assert_eq!(delay.set_max_delay_time(0.5), Ok(()));
        assert_eq!(delay.delay_samples(0), Some(500));
        assert!(delay.set_delay_time(0, 0.8).is_err());

        // Before prepare the value is only recorded, then honored.
        let mut fresh = Delay::new();
        fresh.set_max_delay_time(2.0).unwrap();
        fresh.prepare(1000.0, 64, 1).unwrap();
        assert_eq!(fresh.capacity(), 2001);

        assert!(fresh.set_max_delay_time(0.0).is_err());
    }

    #[test]
    fn test_tail_length() {
        let mut delay = delay_1k(2, 0.1, 0.0);
        delay.set_delay_time(1, 0.2).unwrap();
        // No feedback: a single echo, one (longest) delay period.
        assert_eq!(delay.tail_samples(), 200);

        // 0.5^10 < 0.001 <= 0.5^9: ten repeats past the first echo.
        delay.set_feedback(0.5);
        assert_eq!(delay.tail_samples(), 11 * 200);
    }
}
