//! # Block Processor
//!
//! The glue between the host's audio buffer and the DSP building blocks.
//! Per block it crossfades between the untouched input (dry) and the
//! delay's output (wet), with the crossfade position driven by the
//! on/off toggle through a [`LinearSmoother`]:
//!
//! ```text
//!                ┌──────── × (1 - gain) ─────────────────────┐
//! buffer ────────┤                                           (+)──► buffer
//!                └─► scratch ── × gain ──► [Delay] ──────────┘
//!                                 ▲
//!                  toggle ──► [smoother] (one step per sample)
//! ```
//!
//! `output = dry * (1 - gain) + delay(wet * gain)`
//!
//! The gain is applied *before* the delay, so switching the effect off
//! stops new audio entering the delay line while the echoes already in
//! it keep ringing out. Switching it on fades the input into the line
//! instead of slamming it in.
//!
//! ## Real-time rules
//!
//! [`process_block()`](DelayProcessor::process_block) runs on the audio
//! thread: no locks, no I/O, no logging, and no allocation. The scratch
//! buffer is sized in [`prepare()`](DelayProcessor::prepare) to the
//! largest block the host promised; a smaller block only shortens the
//! active region of each scratch channel, which never reallocates.

use nih_plug::{nih_debug_assert, nih_debug_assert_failure, nih_log};

use crate::config::DelayConfig;
use crate::dsp::delay::Delay;
use crate::dsp::smoother::LinearSmoother;
use crate::error::Result;

/// Toggle-controlled feedback delay for one plugin instance.
#[derive(Debug, Clone)]
pub struct DelayProcessor {
    config: DelayConfig,
    delay: Delay,
    /// Crossfade gain. 0 = fully bypassed, 1 = fully through the delay.
    smoother: LinearSmoother,
    /// Wet copy of the input, one `Vec` per input channel. Capacity is
    /// the maximum block size; length is the current block size.
    scratch: Vec<Vec<f32>>,
    num_input_channels: usize,
    max_block_size: usize,
    prepared: bool,
}

impl DelayProcessor {
    pub fn new(config: DelayConfig) -> Self {
        Self {
            config,
            delay: Delay::new(),
            smoother: LinearSmoother::new(0.0),
            scratch: Vec::new(),
            num_input_channels: 0,
            max_block_size: 0,
            prepared: false,
        }
    }

    /// (Re)initialize everything for a new sample rate, maximum block
    /// size or input channel count.
    ///
    /// All state is rebuilt from the arguments and the [`DelayConfig`]:
    /// the rings are silent, every channel gets the configured delay
    /// time, and the crossfade sits at 0 (bypassed) so an enabled toggle
    /// fades in. On error the processor stays unprepared and
    /// [`process_block()`](Self::process_block) passes audio through.
    pub fn prepare(
        &mut self,
        sample_rate: f64,
        max_block_size: usize,
        num_input_channels: usize,
    ) -> Result<()> {
        self.prepared = false;
        self.config.validate()?;

        self.delay.set_max_delay_time(self.config.max_delay_time)?;
        self.delay
            .prepare(sample_rate, max_block_size, num_input_channels)?;
        self.delay.reset();
        for channel in 0..num_input_channels {
            self.delay.set_delay_time(channel, self.config.delay_time)?;
        }
        self.delay.set_wet_level(self.config.wet_level);
        self.delay.set_feedback(self.config.feedback);

        self.smoother
            .setup(sample_rate, self.config.smoothing_time)?;
        self.smoother.reset_to(0.0);

        self.scratch = (0..num_input_channels)
            .map(|_| Vec::with_capacity(max_block_size))
            .collect();
        self.num_input_channels = num_input_channels;
        self.max_block_size = max_block_size;
        self.prepared = true;

        nih_log!(
            "Delay prepared: {} Hz, {} samples max, {} channel(s), {} samples of ring per channel",
            sample_rate,
            max_block_size,
            num_input_channels,
            self.delay.capacity()
        );

        Ok(())
    }

    /// Silence the delay lines and snap the crossfade back to bypass.
    ///
    /// For transport stop/restart. Call between blocks.
    pub fn reset(&mut self) {
        self.delay.reset();
        self.smoother.reset_to(0.0);
    }

    /// Drop the scratch buffer. The next block after this reallocates it,
    /// so hosts should prepare again before resuming playback.
    pub fn release_resources(&mut self) {
        if !self.scratch.is_empty() {
            nih_log!("Releasing delay scratch buffers");
        }
        self.scratch = Vec::new();
    }

    /// Process one block in place.
    ///
    /// `buffer` holds one slice per output channel, all of the same
    /// length. `toggle` is the delay switch: 1.0 = on, 0.0 = bypassed.
    /// Values in between (or outside `[0, 1]`) are clamped and used as
    /// the crossfade target as-is.
    ///
    /// Channels past the prepared input count are cleared to silence.
    pub fn process_block<C: AsMut<[f32]>>(&mut self, buffer: &mut [C], toggle: f32) {
        if !self.prepared {
            nih_debug_assert_failure!("process_block() called before prepare()");
            return;
        }

        // 1. Outputs with no matching input get silence, not garbage.
        if buffer.len() > self.num_input_channels {
            for channel in &mut buffer[self.num_input_channels..] {
                channel.as_mut().fill(0.0);
            }
        }
        nih_debug_assert!(
            buffer.len() >= self.num_input_channels,
            "channel count changed without prepare()"
        );
        let num_channels = buffer.len().min(self.num_input_channels);
        let num_samples = buffer.first_mut().map_or(0, |c| c.as_mut().len());

        // 2. The toggle is read once per block; the smoother spreads the
        //    change over the ramp.
        let target = if toggle.is_nan() {
            0.0
        } else {
            toggle.clamp(0.0, 1.0)
        };
        self.smoother.set_target(target);

        // 3. Match the scratch buffer to this block. Within the prepared
        //    maximum block size this only moves `len`.
        self.resize_scratch(num_samples);

        // 4. Copy the input into the wet path.
        for (wet, dry) in self.scratch.iter_mut().zip(buffer.iter_mut()) {
            let dry = dry.as_mut();
            nih_debug_assert!(dry.len() == num_samples, "ragged channel lengths");
            let n = dry.len().min(num_samples);
            wet[..n].copy_from_slice(&dry[..n]);
        }

        // 5. Crossfade, one smoother step per sample so the gain moves
        //    continuously through the block.
        for i in 0..num_samples {
            let gain = self.smoother.next_value();
            for (wet, dry) in self.scratch[..num_channels]
                .iter_mut()
                .zip(buffer.iter_mut())
            {
                wet[i] *= gain;
                if let Some(sample) = dry.as_mut().get_mut(i) {
                    *sample *= 1.0 - gain;
                }
            }
        }

        // 6. Run the wet path through the delay.
        self.delay.process(&mut self.scratch[..num_channels]);

        // 7. Sum the echoes onto the (attenuated) dry signal.
        for (wet, dry) in self.scratch.iter().zip(buffer.iter_mut()) {
            for (out, &echo) in dry.as_mut().iter_mut().zip(wet.iter()) {
                *out += echo;
            }
        }
    }

    /// Resize every scratch channel to `num_samples`, zeroing the
    /// contents, if the block length (or channel layout) changed.
    fn resize_scratch(&mut self, num_samples: usize) {
        let layout_matches = self.scratch.len() == self.num_input_channels;
        let length_matches = self.scratch.iter().all(|c| c.len() == num_samples);
        if layout_matches && length_matches {
            return;
        }

        nih_debug_assert!(
            num_samples <= self.max_block_size,
            "block of {} samples exceeds the prepared maximum of {}",
            num_samples,
            self.max_block_size
        );

        self.scratch.resize_with(self.num_input_channels, Vec::new);
        for channel in &mut self.scratch {
            channel.clear();
            channel.resize(num_samples, 0.0);
        }
    }

    /// How long the echoes outlast the input, in samples.
    pub fn tail_samples(&self) -> u32 {
        self.delay.tail_samples()
    }

    /// Current crossfade gain (0 = bypassed, 1 = fully wet path).
    pub fn gain(&self) -> f32 {
        self.smoother.current()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn delay(&self) -> &Delay {
        &self.delay
    }

    pub fn config(&self) -> &DelayConfig {
        &self.config
    }
}

impl Default for DelayProcessor {
    fn default() -> Self {
        Self::new(DelayConfig::default())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
