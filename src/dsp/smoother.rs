//! # Linear Parameter Smoother
//!
//! Flipping the delay toggle changes the wet/dry gain from 0 to 1 (or
//! back). Doing that in a single sample would put a step into the output
//! waveform, which is heard as a click. Instead the gain walks from its
//! current value to the new target in equal steps over a short ramp:
//!
//! ```text
//! target: 0 ──────────┐1────────────────────────
//!                     │
//! gain:   0 ──────────╱‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾‾
//!                     └─ ramp ─┘
//!                     (e.g. 25 ms = 1200 samples @ 48 kHz)
//! ```
//!
//! ## Landing exactly on the target
//!
//! Adding `1/1200` to itself 1200 times in `f32` does not give exactly
//! `1.0`. A smoother that only checks "am I close enough?" can end up one
//! sample late or hover a rounding error away from the target forever.
//! This smoother counts the steps it still has to take; the last one
//! assigns the target directly.

use crate::error::{Result, SetupError};

/// A value that ramps linearly toward a target, one sample at a time.
#[derive(Debug, Clone)]
pub struct LinearSmoother {
    /// Current (smoothed) value.
    current: f32,
    /// Where `current` is heading.
    target: f32,
    /// Per-sample increment: `1 / (ramp_seconds * sample_rate)`.
    step: f32,
    /// `ramp_seconds * sample_rate`. Number of samples a full 0 → 1
    /// ramp takes, before rounding up.
    ramp_samples: f64,
    /// Steps left before `current == target`.
    steps_remaining: u32,
}

impl LinearSmoother {
    /// A smoother sitting at `value` that jumps instantly until
    /// [`setup()`](Self::setup) gives it a ramp.
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 1.0,
            ramp_samples: 1.0,
            steps_remaining: 0,
        }
    }

    /// Configure the ramp length.
    ///
    /// Any ramp in progress is cut short: the smoother snaps to its
    /// target. Fails on a non-positive (or non-finite) sample rate or
    /// ramp time, leaving the previous configuration untouched.
    pub fn setup(&mut self, sample_rate: f64, ramp_seconds: f64) -> Result<()> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(SetupError::InvalidSampleRate(sample_rate));
        }
        if !ramp_seconds.is_finite() || ramp_seconds <= 0.0 {
            return Err(SetupError::InvalidRampTime(ramp_seconds));
        }

        self.ramp_samples = ramp_seconds * sample_rate;
        self.step = (1.0 / self.ramp_samples) as f32;
        self.reset_to(self.target);
        Ok(())
    }

    /// Set both the current and target value. No ramp.
    pub fn reset_to(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.steps_remaining = 0;
    }

    /// Point the smoother at a new target. `current` does not move until
    /// [`next_value()`](Self::next_value) is called.
    ///
    /// Setting the same target again is a no-op, so calling this once per
    /// block with an unchanged toggle does not restart the ramp.
    pub fn set_target(&mut self, value: f32) {
        if value == self.target {
            return;
        }
        self.target = value;

        // A full-scale move (|distance| = 1) takes ceil(ramp_samples)
        // steps; shorter moves, e.g. reversing halfway through a fade,
        // take proportionally fewer.
        let distance = f64::from((value - self.current).abs());
        self.steps_remaining = (distance * self.ramp_samples).ceil() as u32;
        if self.steps_remaining == 0 {
            self.current = value;
        }
    }

    /// Advance by one sample and return the new current value.
    ///
    /// Moves by at most one step and never past the target.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if self.steps_remaining == 0 {
            return self.current;
        }

        self.steps_remaining -= 1;
        self.current = if self.steps_remaining == 0 {
            self.target
        } else if self.target > self.current {
            (self.current + self.step).min(self.target)
        } else {
            (self.current - self.step).max(self.target)
        };
        self.current
    }

    /// The current value without advancing.
    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// The value being ramped toward.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// `true` when no ramp is in progress.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.steps_remaining == 0
    }
}

impl Default for LinearSmoother {
    fn default() -> Self {
        Self::new(0.0)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
