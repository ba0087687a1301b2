//! Master gain with mute / unmute ramps.
//!
//! The bus tracks the gain it last asked for and never reads it back from
//! the engine, so an unmute restores exactly the value in force before the
//! mute even while a ramp is still running.

use crate::audio::AudioEngine;
use crate::params::audio_constants::{DEFAULT_MASTER_GAIN, MASTER_MUTE_RAMP_SECS};

#[derive(Debug, Clone)]
pub struct MasterBus {
    /// Gain currently commanded (ramp target), in [0, 1]
    gain: f32,
    /// Last non-zero gain, restored on unmute
    restore_gain: f32,
}

impl Default for MasterBus {
    fn default() -> Self {
        Self::new(DEFAULT_MASTER_GAIN)
    }
}

impl MasterBus {
    pub fn new(gain: f32) -> Self {
        let gain = gain.clamp(0.0, 1.0);
        Self {
            gain,
            restore_gain: if gain > 0.0 { gain } else { DEFAULT_MASTER_GAIN },
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn is_muted(&self) -> bool {
        self.gain <= 0.0
    }

    /// Apply the commanded gain immediately
    pub fn attach(&self, engine: &mut dyn AudioEngine) {
        engine.ramp_master(self.gain, 0.0);
    }

    pub fn toggle_mute(&mut self, engine: &mut dyn AudioEngine) {
        if self.gain > 0.0 {
            self.restore_gain = self.gain;
            self.gain = 0.0;
        } else {
            self.gain = self.restore_gain;
        }
        engine.ramp_master(self.gain, MASTER_MUTE_RAMP_SECS);
        tracing::debug!(gain = self.gain, muted = self.is_muted(), "master gain");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::OfflineEngine;
    use crate::params::EngineConfig;

    fn running_engine() -> OfflineEngine {
        let mut engine = OfflineEngine::new(1000, &EngineConfig::default()).unwrap();
        engine.resume().unwrap();
        engine
    }

    #[test]
    fn test_default_gain() {
        let bus = MasterBus::default();
        assert_eq!(bus.gain(), 0.9);
        assert!(!bus.is_muted());
    }

    #[test]
    fn test_attach_sets_gain_immediately() {
        let mut engine = running_engine();
        MasterBus::new(0.6).attach(&mut engine);
        assert_eq!(engine.master_gain(), 0.6);
    }

    #[test]
    fn test_mute_round_trip_restores_exact_gain() {
        let mut engine = running_engine();
        let mut bus = MasterBus::new(0.65);
        bus.attach(&mut engine);

        bus.toggle_mute(&mut engine);
        assert!(bus.is_muted());
        engine.advance_secs(0.15);
        assert!(engine.master_gain() > 0.0 && engine.master_gain() < 0.65);
        engine.advance_secs(0.15);
        assert_eq!(engine.master_gain(), 0.0);

        bus.toggle_mute(&mut engine);
        assert_eq!(bus.gain(), 0.65);
        engine.advance_secs(0.3);
        assert_eq!(engine.master_gain(), 0.65);
    }

    #[test]
    fn test_unmute_mid_ramp_targets_previous_gain() {
        let mut engine = running_engine();
        let mut bus = MasterBus::default();
        bus.attach(&mut engine);

        bus.toggle_mute(&mut engine);
        engine.advance_secs(0.1);
        bus.toggle_mute(&mut engine);
        engine.advance_secs(0.3);
        assert_eq!(engine.master_gain(), 0.9);
    }

    #[test]
    fn test_starting_muted_unmutes_to_default() {
        let mut engine = running_engine();
        let mut bus = MasterBus::new(0.0);
        bus.attach(&mut engine);
        assert!(bus.is_muted());

        bus.toggle_mute(&mut engine);
        assert_eq!(bus.gain(), DEFAULT_MASTER_GAIN);
    }
}
