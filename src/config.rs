//! # Fixed Delay Configuration
//!
//! The only control the user gets is the on/off toggle. Everything else
//! about the echo (how long, how loud, how many repeats) is fixed at
//! build time and lives here.
//!
//! | Setting          | Default  | Meaning                                  |
//! |------------------|----------|------------------------------------------|
//! | `max_delay_time` | 1.0 s    | Ring buffer length, per channel          |
//! | `delay_time`     | 0.4 s    | Distance between echoes, every channel   |
//! | `wet_level`      | 1.0      | Gain applied to the delayed signal       |
//! | `feedback`       | 0.75     | Echo-to-echo amplitude ratio             |
//! | `smoothing_time` | 0.025 s  | Length of the enable/bypass crossfade    |
//!
//! Times are `f64` because they are multiplied by the host's sample rate
//! to get sample counts, and `0.025_f32 * 48000` lands just above 1200.

use crate::error::{Result, SetupError};

/// Constants the processor is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayConfig {
    /// Longest delay the ring buffers can hold, in seconds.
    pub max_delay_time: f64,
    /// Delay applied to every channel, in seconds.
    pub delay_time: f64,
    /// Wet gain, `[0, 1]`.
    pub wet_level: f32,
    /// Feedback coefficient. Clamped below 1 by the delay engine.
    pub feedback: f32,
    /// Crossfade ramp duration for the toggle, in seconds.
    pub smoothing_time: f64,
}

impl DelayConfig {
    pub const DEFAULT_MAX_DELAY_TIME: f64 = 1.0;
    pub const DEFAULT_DELAY_TIME: f64 = 0.4;
    pub const DEFAULT_WET_LEVEL: f32 = 1.0;
    pub const DEFAULT_FEEDBACK: f32 = 0.75;
    pub const DEFAULT_SMOOTHING_TIME: f64 = 0.025;

    /// Check the times before any buffers get sized from them.
    ///
    /// Coefficients are not checked here: the delay engine clamps them
    /// into their safe ranges when they are applied.
    pub fn validate(&self) -> Result<()> {
        if !self.max_delay_time.is_finite() || self.max_delay_time <= 0.0 {
            return Err(SetupError::InvalidMaxDelayTime(self.max_delay_time));
        }
        if !self.smoothing_time.is_finite() || self.smoothing_time <= 0.0 {
            return Err(SetupError::InvalidRampTime(self.smoothing_time));
        }
        if !(0.0..=self.max_delay_time).contains(&self.delay_time) {
            return Err(SetupError::DelayTimeOutOfRange {
                seconds: self.delay_time,
                max: self.max_delay_time,
            });
        }
        Ok(())
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            max_delay_time: Self::DEFAULT_MAX_DELAY_TIME,
            delay_time: Self::DEFAULT_DELAY_TIME,
            wet_level: Self::DEFAULT_WET_LEVEL,
            feedback: Self::DEFAULT_FEEDBACK,
            smoothing_time: Self::DEFAULT_SMOOTHING_TIME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = DelayConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.delay_time, 0.4);
        assert_eq!(config.feedback, 0.75);
    }

    #[test]
    fn test_rejects_delay_longer_than_max() {
        let config = DelayConfig {
            delay_time: 1.5,
            ..DelayConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(SetupError::DelayTimeOutOfRange {
                seconds: 1.5,
                max: 1.0
            })
        );
    }

    #[test]
    fn test_rejects_non_positive_times() {
        let config = DelayConfig {
            smoothing_time: 0.0,
            ..DelayConfig::default()
        };
        assert_eq!(config.validate(), Err(SetupError::InvalidRampTime(0.0)));

        let config = DelayConfig {
            max_delay_time: f64::NAN,
            ..DelayConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SetupError::InvalidMaxDelayTime(_))
        ));
    }
}
