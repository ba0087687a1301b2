//! The engine seam between sections and whatever produces sound.

use std::path::Path;

use crate::error::Result;
use crate::params::AnalysisConfig;
use crate::section::SectionKey;

/// Handle to a sound loaded by an engine
///
/// Cheap to copy; the engine owns the sample data for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundId(usize);

impl SoundId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Identifies the command that scheduled a gain ramp
///
/// Handed back by [`AudioEngine::drain_completed_ramps`] once the ramp
/// reaches its target. The generation lets the owner tell whether a newer
/// command has superseded it in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampToken {
    pub key: SectionKey,
    pub generation: u64,
}

/// Fire-and-forget audio engine commands
///
/// Commands never block and never wait for ramps; completions are polled.
pub trait AudioEngine {
    /// Decode a sound asset and keep it resident
    fn load_sound(&mut self, path: &Path) -> Result<SoundId>;

    /// Tap settings the engine's history was sized for
    fn analysis_config(&self) -> &AnalysisConfig;

    /// Whether the engine is producing output
    fn is_running(&self) -> bool;

    /// Start (or restart) output after a suspension
    fn resume(&mut self) -> Result<()>;

    /// Begin looped playback from the start of the sound
    fn play_loop(&mut self, sound: SoundId);

    /// Halt playback and rewind
    fn stop(&mut self, sound: SoundId);

    fn is_playing(&self, sound: SoundId) -> bool;

    /// Ramp the sound's own gain linearly to `target` over `ramp_secs`
    ///
    /// Supersedes any ramp in flight on that sound, starting from its
    /// current value. The superseded ramp never completes.
    fn ramp_gain(
        &mut self,
        sound: SoundId,
        target: f32,
        ramp_secs: f32,
        on_complete: Option<RampToken>,
    );

    /// Ramp the master gain linearly to `target` over `ramp_secs`
    fn ramp_master(&mut self, target: f32, ramp_secs: f32);

    /// Copy the most recent post-gain samples of a sound into `out`
    ///
    /// Oldest first; zero-filled where no history exists yet.
    fn read_recent(&self, sound: SoundId, out: &mut [f32]);

    /// Take every ramp completion that fired since the last call
    fn drain_completed_ramps(&mut self) -> Vec<RampToken>;
}
