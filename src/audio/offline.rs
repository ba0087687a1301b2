//! Engine that renders on demand instead of on a device clock.
//!
//! Used for bouncing a stage to a WAV file and for deterministic tests.
//! Like a device engine it starts suspended; rendering while suspended
//! yields silence and does not advance time.

use std::path::Path;

use super::engine::{AudioEngine, RampToken, SoundId};
use super::loader::load_wav;
use super::mixer::Mixer;
use crate::error::Result;
use crate::params::{AnalysisConfig, EngineConfig};

pub struct OfflineEngine {
    mixer: Mixer,
    sample_rate: u32,
    analysis: AnalysisConfig,
    running: bool,
}

impl OfflineEngine {
    pub fn new(sample_rate: u32, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            mixer: Mixer::new(sample_rate as f32, config.history_len),
            sample_rate,
            analysis: config.analysis.clone(),
            running: false,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Register in-memory mono samples as a sound
    pub fn add_sound(&mut self, samples: Vec<f32>, sample_rate: u32) -> SoundId {
        self.mixer.add_voice(samples.into(), sample_rate)
    }

    /// Render mono output; silence while suspended
    pub fn render(&mut self, out: &mut [f32]) {
        if self.running {
            self.mixer.render(out, 1);
        } else {
            out.fill(0.0);
        }
    }

    /// Render `secs` of output and discard it
    pub fn advance_secs(&mut self, secs: f32) {
        let frames = (secs.max(0.0) * self.sample_rate as f32).round() as usize;
        let mut scratch = vec![0.0; frames];
        self.render(&mut scratch);
    }

    pub fn voice_gain(&self, sound: SoundId) -> f32 {
        self.mixer.voice_gain(sound)
    }

    pub fn master_gain(&self) -> f32 {
        self.mixer.master_gain()
    }
}

impl AudioEngine for OfflineEngine {
    fn load_sound(&mut self, path: &Path) -> Result<SoundId> {
        let sound = load_wav(path)?;
        Ok(self.mixer.add_voice(sound.samples, sound.sample_rate))
    }

    fn analysis_config(&self) -> &AnalysisConfig {
        &self.analysis
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn resume(&mut self) -> Result<()> {
        self.running = true;
        Ok(())
    }

    fn play_loop(&mut self, sound: SoundId) {
        self.mixer.play_loop(sound);
    }

    fn stop(&mut self, sound: SoundId) {
        self.mixer.stop(sound);
    }

    fn is_playing(&self, sound: SoundId) -> bool {
        self.mixer.is_playing(sound)
    }

    fn ramp_gain(
        &mut self,
        sound: SoundId,
        target: f32,
        ramp_secs: f32,
        on_complete: Option<RampToken>,
    ) {
        self.mixer.ramp_gain(sound, target, ramp_secs, on_complete);
    }

    fn ramp_master(&mut self, target: f32, ramp_secs: f32) {
        self.mixer.ramp_master(target, ramp_secs);
    }

    fn read_recent(&self, sound: SoundId, out: &mut [f32]) {
        self.mixer.read_recent(sound, out);
    }

    fn drain_completed_ramps(&mut self) -> Vec<RampToken> {
        self.mixer.drain_completed()
    }
}
