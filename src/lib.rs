//! # Toggle Delay: An AU/VST3/CLAP Feedback Delay With a Click-Free Switch
//!
//! A feedback delay plugin built with [nih-plug](https://github.com/robbert-vdh/nih-plug).
//! The echo settings are fixed (0.4 s, 75% feedback, full wet level); the
//! only control is an on/off toggle, and flipping it crossfades between
//! the dry and delayed signal over 25 ms instead of switching abruptly.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──┬───────────────────────────────────── × (1 - gain) ───┐
//!         │                                                      │
//!         │              ┌─────────── × feedback ◄──┐            │
//!         │              ▼                          │            │
//!         └─► × gain ──►(+)──► [Ring Buffer, 0.4 s] ┴─► × wet ──►(+)──► Output
//!               ▲
//!               │
//!        [Linear smoother] ◄── Delay Toggle (read once per block)
//! ```
//!
//! ## Layout
//!
//! - [`processor`]: the per-block orchestration ([`DelayProcessor`])
//! - [`dsp`]: smoother, ring buffer and feedback delay engine
//! - [`config`]: the fixed delay constants
//! - [`error`]: setup-time errors
//!
//! The plugin struct below is a thin shell: it turns nih-plug's lifecycle
//! calls into `prepare` / `reset` / `process_block` / `release_resources`
//! on the processor, which knows nothing about plugin formats.

pub mod config;
pub mod dsp;
pub mod error;
mod params;
pub mod processor;

use std::num::NonZeroU32;
use std::sync::Arc;

use nih_plug::prelude::*;

pub use config::DelayConfig;
pub use error::SetupError;
use params::ToggleDelayParams;
pub use processor::DelayProcessor;

/// The main plugin struct.
///
/// Parameters are shared with the host through an `Arc` and may be read
/// from any thread. The processor (delay lines, smoother, scratch
/// buffer) is owned by the audio thread and only touched from
/// `initialize()`, `reset()`, `process()` and `deactivate()`.
struct ToggleDelay {
    params: Arc<ToggleDelayParams>,
    processor: DelayProcessor,
}

impl Default for ToggleDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(ToggleDelayParams::default()),
            // Unprepared until the host tells us the sample rate and
            // channel layout in initialize().
            processor: DelayProcessor::new(DelayConfig::default()),
        }
    }
}

impl Plugin for ToggleDelay {
    const NAME: &'static str = "Toggle Delay";
    const VENDOR: &'static str = "Toggle Delay Developers";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Input and output channel counts always match. Stereo first since
    // most DAW tracks are stereo.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // The toggle is read once per block and the crossfade is smoothed
    // internally, so splitting blocks at automation points buys nothing.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Called when the plugin is loaded and whenever the sample rate,
    /// maximum block size or channel layout changes.
    ///
    /// Returning `false` tells the host this configuration is unusable.
    /// That happens when the processor rejects it (e.g. a zero sample
    /// rate), rather than running on made-up defaults.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let num_channels = audio_io_layout
            .main_input_channels
            .map(|c| c.get() as usize)
            .unwrap_or(0);

        match self.processor.prepare(
            f64::from(buffer_config.sample_rate),
            buffer_config.max_buffer_size as usize,
            num_channels,
        ) {
            Ok(()) => true,
            Err(err) => {
                nih_error!("Refusing audio configuration: {}", err);
                false
            }
        }
    }

    /// Called when playback stops or restarts. Clears the delay lines
    /// so old echoes don't burst out when the user presses play again.
    fn reset(&mut self) {
        self.processor.reset();
    }

    /// Per-block processing. Everything happens in
    /// [`DelayProcessor::process_block`]; this only fetches the toggle.
    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let toggle = self.params.toggle_value();
        self.processor.process_block(buffer.as_slice(), toggle);

        // Echoes keep ringing after the input (or the toggle) goes quiet;
        // tell the host how long to keep calling us.
        ProcessStatus::Tail(self.processor.tail_samples())
    }

    fn deactivate(&mut self) {
        self.processor.release_resources();
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for ToggleDelay {
    const CLAP_ID: &'static str = "com.toggle-delay.toggle-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A feedback delay with a click-free on/off toggle");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for ToggleDelay {
    // `*b"..."` turns a 16-character ASCII literal into the `[u8; 16]`
    // class ID VST3 requires.
    const VST3_CLASS_ID: [u8; 16] = *b"TgglDelayPlug001";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// nih_export_clap! exports the `clap_entry` symbol for CLAP hosts.
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts.
// clap_wrapper::export_auv2! re-exports the CLAP entry point as an
// Audio Unit for Logic Pro.

nih_export_clap!(ToggleDelay);
nih_export_vst3!(ToggleDelay);

clap_wrapper::export_auv2!();
