//! Property-based tests for section state, analysis smoothing and the master bus.
//!
//! Uses proptest to check invariants over arbitrary levels, spectra, pointer
//! positions and command sequences.

use proptest::prelude::*;

use loopstage::audio::{AudioEngine, OfflineEngine};
use loopstage::master::MasterBus;
use loopstage::params::{AnalysisConfig, EngineConfig, StageConfig};
use loopstage::registry::SectionRegistry;
use loopstage::section::{equalizer_from_spectrum, smooth_pulse, Geometry};
use loopstage::stage::{Command, Stage};

const RATE: u32 = 1000;

fn stage() -> Stage<OfflineEngine> {
    let mut engine = OfflineEngine::new(RATE, &EngineConfig::default()).unwrap();
    let mut registry = SectionRegistry::new();
    for descriptor in &StageConfig::default().sections {
        let sound = engine.add_sound(vec![0.3; 16], RATE);
        registry
            .push(descriptor, sound, &AnalysisConfig::default())
            .unwrap();
    }
    Stage::new(engine, registry, MasterBus::default())
}

/// Finite values mixed with NaN and infinities
fn any_level(range: std::ops::Range<f32>) -> impl Strategy<Value = f32> {
    prop_oneof![
        4 => range,
        1 => Just(f32::NAN),
        1 => Just(f32::INFINITY),
        1 => Just(f32::NEG_INFINITY),
    ]
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        (0.0f32..960.0, 0.0f32..540.0).prop_map(|(x, y)| Command::Press { x, y }),
        Just(Command::ToggleAll),
        Just(Command::ResetAll),
        Just(Command::ToggleMute),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Pulse stays in [0, 1] for any sequence of levels, even out of range ones.
    #[test]
    fn pulse_stays_bounded(levels in prop::collection::vec(-2.0f32..3.0, 1..64)) {
        let mut pulse = 0.0;
        for level in levels {
            pulse = smooth_pulse(pulse, level);
            prop_assert!((0.0..=1.0).contains(&pulse), "pulse {} out of range", pulse);
        }
    }

    /// Non-finite analysis input never leaves the pulse or equalizer range.
    #[test]
    fn non_finite_input_stays_bounded(
        levels in prop::collection::vec(any_level(-2.0..3.0), 1..64),
        spectrum in prop::collection::vec(any_level(-100.0..400.0), 32),
    ) {
        let mut pulse = 0.0;
        for level in levels {
            pulse = smooth_pulse(pulse, level);
            prop_assert!((0.0..=1.0).contains(&pulse), "pulse {} out of range", pulse);
        }
        for band in equalizer_from_spectrum(&spectrum) {
            prop_assert!((0.0..=1.0).contains(&band), "band {} out of range", band);
        }
    }

    /// Under a constant level the pulse closes 20% of the gap each step.
    #[test]
    fn pulse_converges_geometrically(level in 0.0f32..=1.0, steps in 1i32..40) {
        let mut pulse = 0.0;
        for _ in 0..steps {
            pulse = smooth_pulse(pulse, level);
        }
        let expected = level * (1.0 - 0.8f32.powi(steps));
        prop_assert!((pulse - expected).abs() < 1e-4, "{} vs {}", pulse, expected);
    }

    /// The equalizer always has 16 bands in [0, 1] taken from the first bins.
    #[test]
    fn equalizer_bands_are_normalized(spectrum in prop::array::uniform32(0.0f32..=255.0)) {
        let bands = equalizer_from_spectrum(&spectrum);
        prop_assert_eq!(bands.len(), 16);
        for (i, &band) in bands.iter().enumerate() {
            prop_assert!((0.0..=1.0).contains(&band));
            prop_assert!((band - spectrum[i] / 255.0).abs() < 1e-6);
        }
    }

    /// Points on the boundary are outside; points strictly inside are inside.
    #[test]
    fn hit_test_is_strict(
        x in -500.0f32..500.0,
        y in -500.0f32..500.0,
        w in 1.0f32..400.0,
        h in 1.0f32..400.0,
        tx in 0.01f32..0.99,
        ty in 0.01f32..0.99,
    ) {
        let geometry = Geometry::new(x, y, w, h);
        let edge = glam::Vec2::new(x, y + h * ty);
        prop_assert!(!geometry.contains(edge));
        prop_assert!(!geometry.contains(glam::Vec2::new(x + w, y + h * ty)));
        prop_assert!(!geometry.contains(glam::Vec2::new(x + w * tx, y)));
        prop_assert!(!geometry.contains(glam::Vec2::new(x + w * tx, y + h)));

        let inside = glam::Vec2::new(x + w * tx, y + h * ty);
        if inside.x > x && inside.x < x + w && inside.y > y && inside.y < y + h {
            prop_assert!(geometry.contains(inside));
        }
    }

    /// Toggle-all ends with every section active or every section inactive,
    /// reset-all always ends with none active.
    #[test]
    fn bulk_commands_leave_uniform_state(commands in prop::collection::vec(command(), 0..24)) {
        let mut stage = stage();
        for command in commands {
            stage.apply(command);
            stage.engine_mut().advance_secs(0.05);
            stage.tick();
        }

        let was_active = stage.registry().any_active();
        stage.apply(Command::ToggleAll);
        let states: Vec<bool> = stage.registry().iter().map(|s| s.is_active()).collect();
        if was_active {
            prop_assert!(states.iter().all(|&active| !active));
        } else {
            prop_assert!(states.iter().all(|&active| active));
        }

        stage.apply(Command::ResetAll);
        prop_assert!(!stage.registry().any_active());
    }

    /// Active sections always have their loop playing.
    #[test]
    fn active_sections_are_playing(commands in prop::collection::vec(command(), 0..24)) {
        let mut stage = stage();
        for command in commands {
            stage.apply(command);
            stage.engine_mut().advance_secs(0.1);
            stage.tick();
            for section in stage.registry().iter() {
                if section.is_active() {
                    prop_assert!(stage.engine().is_playing(section.sound()));
                }
            }
        }
    }

    /// Muting twice restores the exact gain in force before the first mute.
    #[test]
    fn mute_round_trip_restores_gain(gain in 0.01f32..=1.0, wait in 0.0f32..0.5) {
        let mut engine = OfflineEngine::new(RATE, &EngineConfig::default()).unwrap();
        engine.resume().unwrap();
        let mut bus = MasterBus::new(gain);
        bus.attach(&mut engine);

        bus.toggle_mute(&mut engine);
        prop_assert!(bus.is_muted());
        engine.advance_secs(wait);
        bus.toggle_mute(&mut engine);
        prop_assert_eq!(bus.gain(), gain);

        engine.advance_secs(0.35);
        prop_assert!((engine.master_gain() - gain).abs() < 1e-6);
    }
}
