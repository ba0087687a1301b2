//! One loop-bound section: playback state machine plus analysis smoothing.
//!
//! A section is either inactive or active. `start` fades its loop in,
//! `stop` fades it out and halts the loop once the fade completes. Every
//! effective command bumps the section's generation; a fade completion
//! carrying an older generation is stale and ignored, so a loop restarted
//! mid-fade keeps playing.

use glam::Vec2;

use crate::audio::{AmplitudeTap, AudioEngine, RampToken, SoundId, SpectrumTap};
use crate::error::Result;
use crate::params::audio_constants::{
    EQUALIZER_BANDS, PULSE_SMOOTHING, SECTION_FADE_SECS, SECTION_FULL_GAIN, SPECTRUM_BYTE_MAX,
};
use crate::params::{AnalysisConfig, Color, SectionDescriptor};

/// Position of a section in its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionKey(usize);

impl SectionKey {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Axis-aligned rectangle (top-left position + size)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub position: Vec2,
    pub size: Vec2,
}

impl Geometry {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    /// Strict interior test: points on an edge are outside
    pub fn contains(&self, point: Vec2) -> bool {
        let far = self.position + self.size;
        point.x > self.position.x && point.x < far.x && point.y > self.position.y && point.y < far.y
    }
}

/// Everything the renderer needs from a section, refreshed each frame
#[derive(Debug, Clone, Copy)]
pub struct SectionView<'a> {
    pub geometry: Geometry,
    pub base_color: Color,
    pub active_color: Color,
    pub is_active: bool,
    pub pulse: f32,
    pub equalizer: &'a [f32; EQUALIZER_BANDS],
}

pub struct AudioSection {
    key: SectionKey,
    id: String,
    name: String,
    genre: String,
    geometry: Geometry,
    base_color: Color,
    active_color: Color,
    sound: SoundId,

    is_active: bool,
    generation: u64,

    amplitude: AmplitudeTap,
    spectrum: SpectrumTap,
    pulse: f32,
    equalizer: [f32; EQUALIZER_BANDS],
}

impl AudioSection {
    /// Build a section from a validated descriptor bound to a loaded sound
    pub fn new(
        key: SectionKey,
        descriptor: &SectionDescriptor,
        sound: SoundId,
        analysis: &AnalysisConfig,
    ) -> Result<Self> {
        descriptor.validate()?;
        Ok(Self {
            key,
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            genre: descriptor.genre.clone(),
            geometry: Geometry::new(descriptor.x, descriptor.y, descriptor.w, descriptor.h),
            base_color: descriptor.base_color,
            active_color: descriptor.active_color,
            sound,
            is_active: false,
            generation: 0,
            amplitude: AmplitudeTap::new(analysis),
            spectrum: SpectrumTap::new(analysis),
            pulse: 0.0,
            equalizer: [0.0; EQUALIZER_BANDS],
        })
    }

    pub fn key(&self) -> SectionKey {
        self.key
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn sound(&self) -> SoundId {
        self.sound
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pulse(&self) -> f32 {
        self.pulse
    }

    pub fn equalizer(&self) -> &[f32; EQUALIZER_BANDS] {
        &self.equalizer
    }

    pub fn amplitude_tap(&self) -> &AmplitudeTap {
        &self.amplitude
    }

    pub fn spectrum_tap(&self) -> &SpectrumTap {
        &self.spectrum
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        self.geometry.contains(Vec2::new(px, py))
    }

    pub fn toggle(&mut self, engine: &mut dyn AudioEngine) {
        if self.is_active {
            self.stop(engine);
        } else {
            self.start(engine);
        }
    }

    /// Fade the loop in, resuming a suspended engine first
    pub fn start(&mut self, engine: &mut dyn AudioEngine) {
        if !engine.is_running() {
            if let Err(err) = engine.resume() {
                tracing::warn!(section = %self.id, %err, "starting on a suspended engine");
            }
        }
        if self.is_active {
            tracing::trace!(section = %self.id, "already active");
            return;
        }

        self.is_active = true;
        self.generation += 1;

        if !engine.is_playing(self.sound) {
            engine.play_loop(self.sound);
        }
        engine.ramp_gain(self.sound, SECTION_FULL_GAIN, SECTION_FADE_SECS, None);
        self.amplitude.set_input(self.sound);
        self.spectrum.set_input(self.sound);

        tracing::debug!(section = %self.id, generation = self.generation, "started");
    }

    /// Fade the loop out; the loop halts when the fade completes
    pub fn stop(&mut self, engine: &mut dyn AudioEngine) {
        if !self.is_active {
            tracing::trace!(section = %self.id, "already inactive");
            return;
        }

        self.is_active = false;
        self.generation += 1;

        let token = RampToken {
            key: self.key,
            generation: self.generation,
        };
        engine.ramp_gain(self.sound, 0.0, SECTION_FADE_SECS, Some(token));

        tracing::debug!(section = %self.id, generation = self.generation, "stopping");
    }

    /// Handle a finished fade-out; returns whether the loop was halted
    pub fn on_ramp_complete(&mut self, generation: u64, engine: &mut dyn AudioEngine) -> bool {
        if generation != self.generation || self.is_active {
            tracing::debug!(
                section = %self.id,
                stale = generation,
                current = self.generation,
                "stale fade completion ignored"
            );
            return false;
        }
        engine.stop(self.sound);
        tracing::debug!(section = %self.id, "loop halted");
        true
    }

    /// Per-frame refresh of pulse and equalizer from the taps
    pub fn update(&mut self, engine: &dyn AudioEngine) {
        let level = self.amplitude.level(engine);
        let spectrum = self.spectrum.analyze(engine);
        self.apply_analysis(level, &spectrum);
    }

    /// Fold one analysis frame into the visual state
    pub fn apply_analysis(&mut self, level: f32, spectrum: &[f32]) {
        self.pulse = smooth_pulse(self.pulse, level);
        self.equalizer = equalizer_from_spectrum(spectrum);
    }

    pub fn view(&self) -> SectionView<'_> {
        SectionView {
            geometry: self.geometry,
            base_color: self.base_color,
            active_color: self.active_color,
            is_active: self.is_active,
            pulse: self.pulse,
            equalizer: &self.equalizer,
        }
    }
}

/// One exponential smoothing step toward `level` (clamped to [0, 1])
///
/// Non-finite inputs read as silence, so the result always stays in [0, 1].
pub fn smooth_pulse(pulse: f32, level: f32) -> f32 {
    let pulse = unit_or_zero(pulse);
    let level = unit_or_zero(level);
    pulse * (1.0 - PULSE_SMOOTHING) + level * PULSE_SMOOTHING
}

/// First bins of a byte-scaled spectrum normalized to [0, 1]
///
/// Missing and non-finite bins read as zero.
pub fn equalizer_from_spectrum(spectrum: &[f32]) -> [f32; EQUALIZER_BANDS] {
    let mut bands = [0.0; EQUALIZER_BANDS];
    for (band, &raw) in bands.iter_mut().zip(spectrum) {
        *band = unit_or_zero(raw / SPECTRUM_BYTE_MAX);
    }
    bands
}

fn unit_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::OfflineEngine;
    use crate::params::{EngineConfig, StageConfig};

    const RATE: u32 = 1000;

    fn setup(samples: Vec<f32>) -> (OfflineEngine, AudioSection) {
        let mut engine = OfflineEngine::new(RATE, &EngineConfig::default()).unwrap();
        let sound = engine.add_sound(samples, RATE);
        let config = StageConfig::default();
        let section = AudioSection::new(
            SectionKey::new(0),
            &config.sections[0],
            sound,
            &AnalysisConfig::default(),
        )
        .unwrap();
        (engine, section)
    }

    #[test]
    fn test_contains_excludes_edges() {
        let (_, section) = setup(vec![0.0; 4]);
        // Sax Corner: x 60..320, y 80..240
        assert!(section.contains(75.0, 95.0));
        assert!(section.contains(319.9, 239.9));
        assert!(!section.contains(60.0, 100.0));
        assert!(!section.contains(320.0, 100.0));
        assert!(!section.contains(100.0, 80.0));
        assert!(!section.contains(100.0, 240.0));
        assert!(!section.contains(10.0, 10.0));
    }

    #[test]
    fn test_start_resumes_and_fades_in() {
        let (mut engine, mut section) = setup(vec![0.5; 64]);
        assert!(!engine.is_running());

        section.start(&mut engine);
        assert!(engine.is_running());
        assert!(section.is_active());
        assert!(engine.is_playing(section.sound()));
        assert_eq!(section.amplitude_tap().input(), Some(section.sound()));
        assert_eq!(section.spectrum_tap().input(), Some(section.sound()));

        engine.advance_secs(0.2);
        assert!((engine.voice_gain(section.sound()) - 0.5).abs() < 1e-3);
        engine.advance_secs(0.2);
        assert_eq!(engine.voice_gain(section.sound()), 1.0);
    }

    #[test]
    fn test_start_and_stop_are_idempotent() {
        let (mut engine, mut section) = setup(vec![0.5; 64]);

        section.stop(&mut engine);
        assert_eq!(section.generation(), 0);

        section.start(&mut engine);
        section.start(&mut engine);
        assert_eq!(section.generation(), 1);

        section.stop(&mut engine);
        section.stop(&mut engine);
        assert_eq!(section.generation(), 2);
        assert!(!section.is_active());
    }

    #[test]
    fn test_stop_halts_loop_after_fade() {
        let (mut engine, mut section) = setup(vec![0.5; 64]);
        section.start(&mut engine);
        engine.advance_secs(0.5);

        section.stop(&mut engine);
        assert!(engine.is_playing(section.sound()));

        engine.advance_secs(0.4);
        let tokens = engine.drain_completed_ramps();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].key, section.key());

        assert!(section.on_ramp_complete(tokens[0].generation, &mut engine));
        assert!(!engine.is_playing(section.sound()));
    }

    #[test]
    fn test_stale_completion_does_not_halt_restarted_loop() {
        let (mut engine, mut section) = setup(vec![0.5; 64]);
        section.start(&mut engine);
        engine.advance_secs(0.5);

        section.stop(&mut engine);
        engine.advance_secs(0.5);
        let tokens = engine.drain_completed_ramps();

        // Restarted before the completion was handled
        section.start(&mut engine);
        assert!(!section.on_ramp_complete(tokens[0].generation, &mut engine));
        assert!(section.is_active());
        assert!(engine.is_playing(section.sound()));
    }

    #[test]
    fn test_restart_mid_fade_supersedes_fade_out() {
        let (mut engine, mut section) = setup(vec![0.5; 64]);
        section.start(&mut engine);
        engine.advance_secs(0.5);

        section.stop(&mut engine);
        engine.advance_secs(0.2);
        section.start(&mut engine);
        engine.advance_secs(0.5);

        assert!(engine.drain_completed_ramps().is_empty());
        assert!(engine.is_playing(section.sound()));
        assert_eq!(engine.voice_gain(section.sound()), 1.0);
    }

    #[test]
    fn test_double_toggle_restores_state_without_duplicate_taps() {
        let (mut engine, mut section) = setup(vec![0.5; 64]);
        section.toggle(&mut engine);
        section.toggle(&mut engine);
        assert!(!section.is_active());

        section.toggle(&mut engine);
        assert!(section.is_active());
        assert_eq!(section.amplitude_tap().input(), Some(section.sound()));
        assert_eq!(section.spectrum_tap().input(), Some(section.sound()));
    }

    #[test]
    fn test_pulse_follows_constant_level() {
        let (mut engine, mut section) = setup(vec![1.0; 64]);
        section.start(&mut engine);
        engine.advance_secs(3.0);

        for _ in 0..10 {
            section.update(&engine);
        }
        let expected = 1.0 - 0.8f32.powi(10);
        assert!((section.pulse() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_update_without_taps_decays_pulse() {
        let (engine, mut section) = setup(vec![1.0; 64]);
        section.apply_analysis(1.0, &[255.0; 32]);
        assert!((section.pulse() - 0.2).abs() < 1e-6);
        assert_eq!(section.equalizer(), &[1.0; EQUALIZER_BANDS]);

        section.update(&engine);
        assert!((section.pulse() - 0.16).abs() < 1e-6);
        assert_eq!(section.equalizer(), &[0.0; EQUALIZER_BANDS]);
    }

    #[test]
    fn test_equalizer_from_spectrum() {
        let spectrum: Vec<f32> = (0..32).map(|i| i as f32 * 8.0).collect();
        let bands = equalizer_from_spectrum(&spectrum);
        assert_eq!(bands[0], 0.0);
        assert!((bands[15] - 120.0 / 255.0).abs() < 1e-6);

        let short = equalizer_from_spectrum(&[255.0, 510.0]);
        assert_eq!(short[0], 1.0);
        assert_eq!(short[1], 1.0);
        assert_eq!(short[2], 0.0);
    }

    #[test]
    fn test_non_finite_analysis_reads_as_silence() {
        assert!((smooth_pulse(0.5, f32::NAN) - 0.4).abs() < 1e-6);
        assert_eq!(smooth_pulse(f32::NAN, 1.0), PULSE_SMOOTHING);
        assert_eq!(smooth_pulse(0.0, f32::INFINITY), 0.0);

        let mut spectrum = [128.0; 32];
        spectrum[0] = f32::NAN;
        spectrum[1] = f32::INFINITY;
        spectrum[2] = f32::NEG_INFINITY;
        let bands = equalizer_from_spectrum(&spectrum);
        assert_eq!(bands[..3], [0.0, 0.0, 0.0]);
        assert!((bands[3] - 128.0 / 255.0).abs() < 1e-6);

        let (_, mut section) = setup(vec![0.0; 4]);
        section.apply_analysis(f32::NAN, &spectrum);
        assert_eq!(section.pulse(), 0.0);
        assert!(section.equalizer().iter().all(|b| (0.0..=1.0).contains(b)));
    }

    #[test]
    fn test_view_reflects_state() {
        let (mut engine, mut section) = setup(vec![0.5; 64]);
        section.start(&mut engine);
        let view = section.view();
        assert!(view.is_active);
        assert_eq!(view.geometry, Geometry::new(60.0, 80.0, 260.0, 160.0));
    }
}
