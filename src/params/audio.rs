//! Audio analysis and engine configuration and constants.

use crate::error::{Result, StageError};

/// Audio constants (compile-time, shared by sections and the master bus)
pub mod audio_constants {
    /// Pulse smoothing factor per tick (weight of the new level)
    pub const PULSE_SMOOTHING: f32 = 0.2;

    /// Raw spectrum bins produced by a spectrum tap
    pub const SPECTRUM_BINS: usize = 32;

    /// Equalizer bands kept per section (first bins of the raw spectrum)
    pub const EQUALIZER_BANDS: usize = 16;

    /// Upper bound of a byte-scaled spectrum magnitude
    pub const SPECTRUM_BYTE_MAX: f32 = 255.0;

    /// Section fade-in / fade-out duration (seconds)
    pub const SECTION_FADE_SECS: f32 = 0.4;

    /// Section gain when fully faded in
    pub const SECTION_FULL_GAIN: f32 = 1.0;

    /// Master mute / unmute ramp duration (seconds)
    pub const MASTER_MUTE_RAMP_SECS: f32 = 0.3;

    /// Master gain at startup
    pub const DEFAULT_MASTER_GAIN: f32 = 0.9;
}

/// Analysis tap configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Samples averaged by the amplitude tap (RMS window)
    pub amplitude_window: usize,

    /// Temporal smoothing of spectrum magnitudes (0 = none, <1)
    /// Browser analyser default used by the loops: 0.8
    pub spectrum_smoothing: f32,

    /// Magnitude mapped to byte value 0 (dBFS)
    pub min_decibels: f32,

    /// Magnitude mapped to byte value 255 (dBFS)
    pub max_decibels: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            amplitude_window: 1024,
            spectrum_smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalysisConfig {
    /// FFT window size (two input samples per output bin)
    pub fn fft_size(&self) -> usize {
        audio_constants::SPECTRUM_BINS * 2
    }

    /// Validate configuration (window non-empty, smoothing in range, etc.)
    pub fn validate(&self) -> Result<()> {
        if self.amplitude_window == 0 {
            return Err(StageError::InvalidAnalysis(
                "amplitude window must be > 0".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.spectrum_smoothing) {
            return Err(StageError::InvalidAnalysis(format!(
                "spectrum smoothing must be in [0, 1), got {}",
                self.spectrum_smoothing
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(StageError::InvalidAnalysis(format!(
                "min decibels ({}) must be below max decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }
}

/// Output engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Recent post-gain samples kept per voice for the analysis taps
    /// Must cover the largest tap window
    pub history_len: usize,

    /// Preferred output buffer size in frames (device default if `None`)
    pub buffer_frames: Option<u32>,

    /// Analysis settings handed to every section's taps
    pub analysis: AnalysisConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_len: 2048,
            buffer_frames: None,
            analysis: AnalysisConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validate configuration (history must cover both tap windows)
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        let needed = self.analysis.amplitude_window.max(self.analysis.fft_size());
        if self.history_len < needed {
            return Err(StageError::InvalidAnalysis(format!(
                "history of {} samples is shorter than the {} needed by the taps",
                self.history_len, needed
            )));
        }
        Ok(())
    }
}
