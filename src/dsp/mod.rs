//! # DSP (Digital Signal Processing) Primitives
//!
//! The building blocks the [`processor`](crate::processor) wires together:
//!
//! - **`smoother`**: A linear ramp that turns the on/off toggle into a
//!   click-free crossfade gain.
//!
//! - **`delay_line`**: A ring buffer that stores past audio samples and
//!   retrieves them a fixed number of samples later.
//!
//! - **`delay`**: One delay line per channel plus the feedback and
//!   wet-level math that turns storage into echoes.

pub mod delay;
pub mod delay_line;
pub mod smoother;
