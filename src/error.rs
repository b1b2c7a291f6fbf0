//! # Setup Errors
//!
//! Everything that can go wrong with this plugin goes wrong *before*
//! audio starts flowing: a host hands us a nonsense sample rate, a zero
//! block size, or no input channels. Those are reported as a
//! [`SetupError`] from the prepare/configuration calls.
//!
//! The audio path itself (`process_block`) never returns an error and
//! never panics. Real-time code has nobody to report an error to, and
//! unwinding across the host's audio callback would take the DAW down
//! with us.

use thiserror::Error;

/// Result type alias for setup-time operations.
pub type Result<T> = std::result::Result<T, SetupError>;

/// A configuration the DSP core refuses to run with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SetupError {
    #[error("invalid sample rate: {0} Hz (must be finite and > 0)")]
    InvalidSampleRate(f64),

    #[error("invalid maximum block size: {0} samples (must be > 0)")]
    InvalidBlockSize(usize),

    #[error("invalid channel count: {0} (must be > 0)")]
    InvalidChannelCount(usize),

    #[error("invalid smoothing ramp: {0} s (must be finite and > 0)")]
    InvalidRampTime(f64),

    #[error("invalid maximum delay time: {0} s (must be finite and > 0)")]
    InvalidMaxDelayTime(f64),

    #[error("delay time {seconds} s is outside [0, {max}] s")]
    DelayTimeOutOfRange { seconds: f64, max: f64 },

    #[error("channel {channel} does not exist (prepared with {channels} channels)")]
    ChannelOutOfRange { channel: usize, channels: usize },

    /// The maximum delay time was raised after `prepare()`. The ring
    /// buffers are sized once, so this needs a fresh `prepare()`.
    #[error("{requested} samples of delay requested but the ring holds {capacity}; prepare again")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error("the delay has not been prepared")]
    NotPrepared,
}
