//! Amplitude and spectrum taps.
//!
//! A tap is connected to at most one sound at a time and pulls that sound's
//! recent output from the engine whenever it is read. The spectrum tap
//! follows browser analyser semantics: Blackman window, magnitude smoothing
//! over time, decibel scaling into byte values.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::engine::{AudioEngine, SoundId};
use crate::params::audio_constants::{SPECTRUM_BINS, SPECTRUM_BYTE_MAX};
use crate::params::AnalysisConfig;

/// RMS level tap
pub struct AmplitudeTap {
    input: Option<SoundId>,
    buffer: Vec<f32>,
}

impl AmplitudeTap {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            input: None,
            buffer: vec![0.0; config.amplitude_window.max(1)],
        }
    }

    /// Connect to a sound (reconnecting to the same sound is a no-op)
    pub fn set_input(&mut self, sound: SoundId) {
        self.input = Some(sound);
    }

    pub fn input(&self) -> Option<SoundId> {
        self.input
    }

    /// Current level in [0, 1]; 0 when unconnected
    pub fn level(&mut self, engine: &dyn AudioEngine) -> f32 {
        let Some(sound) = self.input else {
            return 0.0;
        };
        engine.read_recent(sound, &mut self.buffer);
        rms(&self.buffer)
    }
}

/// Byte-scaled magnitude spectrum tap
pub struct SpectrumTap {
    input: Option<SoundId>,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    samples: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    smoothed: [f32; SPECTRUM_BINS],
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
}

impl SpectrumTap {
    pub fn new(config: &AnalysisConfig) -> Self {
        let size = config.fft_size();
        let mut planner = FftPlanner::new();

        Self {
            input: None,
            fft: planner.plan_fft_forward(size),
            window: (0..size).map(|i| blackman_window(i, size)).collect(),
            samples: vec![0.0; size],
            scratch: vec![Complex::new(0.0, 0.0); size],
            smoothed: [0.0; SPECTRUM_BINS],
            smoothing: config.spectrum_smoothing,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
        }
    }

    /// Connect to a sound; switching sounds clears the smoothing history
    pub fn set_input(&mut self, sound: SoundId) {
        if self.input != Some(sound) {
            self.input = Some(sound);
            self.smoothed = [0.0; SPECTRUM_BINS];
        }
    }

    pub fn input(&self) -> Option<SoundId> {
        self.input
    }

    /// Current spectrum, each bin in [0, 255]; all zeros when unconnected
    pub fn analyze(&mut self, engine: &dyn AudioEngine) -> [f32; SPECTRUM_BINS] {
        let Some(sound) = self.input else {
            return [0.0; SPECTRUM_BINS];
        };
        engine.read_recent(sound, &mut self.samples);
        self.process()
    }

    fn process(&mut self) -> [f32; SPECTRUM_BINS] {
        for ((slot, &sample), &w) in self
            .scratch
            .iter_mut()
            .zip(&self.samples)
            .zip(&self.window)
        {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let scale = 1.0 / self.samples.len() as f32;
        let mut bytes = [0.0; SPECTRUM_BINS];
        for (k, byte) in bytes.iter_mut().enumerate() {
            let magnitude = self.scratch[k].norm() * scale;
            self.smoothed[k] =
                self.smoothing * self.smoothed[k] + (1.0 - self.smoothing) * magnitude;
            *byte = self.to_byte(self.smoothed[k]);
        }
        bytes
    }

    fn to_byte(&self, magnitude: f32) -> f32 {
        if magnitude <= 0.0 {
            return 0.0;
        }
        let decibels = 20.0 * magnitude.log10();
        let range = self.max_decibels - self.min_decibels;
        (SPECTRUM_BYTE_MAX * (decibels - self.min_decibels) / range)
            .floor()
            .clamp(0.0, SPECTRUM_BYTE_MAX)
    }
}

/// Root-mean-square of a block, clamped to [0, 1]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt().clamp(0.0, 1.0)
}

/// Blackman window (periodic form, as used by analyser nodes)
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let alpha = 0.16;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    let x = index as f32 / size as f32;
    a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
}
