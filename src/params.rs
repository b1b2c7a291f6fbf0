//! # Plugin Parameters
//!
//! The plugin exposes exactly one control: the delay on/off toggle. Delay
//! time, feedback and wet level are fixed (see [`crate::config`]).
//!
//! ## Why no smoothing here?
//!
//! nih-plug can smooth float parameters itself, but a `BoolParam` is a
//! hard switch. The crossfade between dry and delayed signal is done by
//! the processor's own [`LinearSmoother`](crate::dsp::smoother::LinearSmoother),
//! which needs just one value per block: the switch position.
//!
//! ## Threads
//!
//! The host's UI and automation threads write the toggle, the audio thread
//! reads it. nih-plug keeps the value in an atomic, so `value()` is a
//! single lock-free load and can never stall the audio thread.

use std::sync::Arc;

use nih_plug::prelude::*;

/// All user-facing parameters for Toggle Delay.
#[derive(Params)]
pub struct ToggleDelayParams {
    /// **Delay Toggle**: on = input goes through the echo, off = dry.
    ///
    /// On by default. Once published, the `"toggle"` ID must never change
    /// or saved sessions lose the setting.
    #[id = "toggle"]
    pub delay_toggle: BoolParam,
}

impl ToggleDelayParams {
    /// The toggle as the crossfade target the processor expects.
    pub fn toggle_value(&self) -> f32 {
        if self.delay_toggle.value() {
            1.0
        } else {
            0.0
        }
    }
}

impl Default for ToggleDelayParams {
    fn default() -> Self {
        Self {
            delay_toggle: BoolParam::new("Delay Toggle", true)
                .with_value_to_string(Arc::new(|enabled| {
                    String::from(if enabled { "On" } else { "Bypassed" })
                })),
        }
    }
}
