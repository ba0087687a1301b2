//! Window, scene layout and recording configuration.

use std::path::PathBuf;

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (logical pixels)
    pub window_width: u32,

    /// Window height (logical pixels)
    pub window_height: u32,

    /// Clear color, grey level 0..=255
    pub background_level: u8,

    /// Panel corner radius (logical pixels)
    pub panel_corner_radius: f32,

    /// Brightness added to the panel blue channel at full pulse (0..=255 scale)
    pub pulse_brightness_boost: f32,

    /// Number of ambient light ellipses along the bottom of the window
    pub ambient_lights: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 960,
            window_height: 540,
            background_level: 18,
            panel_corner_radius: 12.0,
            pulse_brightness_boost: 80.0,
            ambient_lights: 6,
        }
    }
}

/// Offline bounce configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output WAV path
    pub output_path: PathBuf,

    /// Output sample rate (Hz)
    pub sample_rate: u32,

    /// Stage ticks per second (matches the interactive frame rate)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32, output_path: impl Into<PathBuf>) -> Self {
        Self {
            duration_secs,
            output_path: output_path.into(),
            sample_rate: 44_100,
            fps: 60,
        }
    }

    /// Total number of stage ticks to run
    pub fn total_frames(&self) -> usize {
        (self.duration_secs.max(0.0) * self.fps as f32).ceil() as usize
    }

    /// Samples rendered between two ticks
    pub fn samples_per_frame(&self) -> usize {
        (self.sample_rate / self.fps.max(1)) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_frame_math() {
        let config = RecordingConfig::new(2.5, "bounce.wav");
        assert_eq!(config.total_frames(), 150);
        assert_eq!(config.samples_per_frame(), 735);

        let empty = RecordingConfig::new(-1.0, "bounce.wav");
        assert_eq!(empty.total_frames(), 0);
    }
}
