//! Audio engine, loop mixer and analysis taps.
//!
//! Sections talk to sound only through the [`AudioEngine`] trait. Two
//! engines implement it: [`CpalEngine`] plays through the default output
//! device, [`OfflineEngine`] renders on demand for bouncing and tests.

mod analysis;
mod engine;
mod loader;
mod mixer;
mod offline;
mod system;

// Re-export public types
pub use analysis::{blackman_window, rms, AmplitudeTap, SpectrumTap};
pub use engine::{AudioEngine, RampToken, SoundId};
pub use loader::{load_wav, SoundBuffer};
pub use mixer::{GainRamp, Mixer};
pub use offline::OfflineEngine;
pub use system::CpalEngine;
