//! Offline bounce: drive a stage without a window and write the mix to WAV.
//!
//! Every section is started at time zero, the stage ticks at the recording
//! frame rate, and the mono master output is written as 32-bit float.

use std::path::Path;

use crate::audio::OfflineEngine;
use crate::error::{Result, StageError};
use crate::params::{EngineConfig, RecordingConfig};
use crate::stage::{Command, Stage};

/// Summary of a finished bounce
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BounceStats {
    pub frames: usize,
    pub samples: usize,
    pub peak: f32,
}

/// Render `recording.duration_secs` of the stage into a WAV file
///
/// The stage must not have been started yet; the bounce resumes the
/// engine itself by starting every section.
pub fn bounce(
    stage: &mut Stage<OfflineEngine>,
    recording: &RecordingConfig,
) -> Result<BounceStats> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: stage.engine().sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let path = recording.output_path.as_path();
    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| write_error(path, e))?;

    stage.apply(Command::ToggleAll);

    let total_frames = recording.total_frames();
    let mut block = vec![0.0f32; recording.samples_per_frame()];
    let mut stats = BounceStats {
        frames: 0,
        samples: 0,
        peak: 0.0,
    };

    for _ in 0..total_frames {
        stage.engine_mut().render(&mut block);
        for &sample in &block {
            writer
                .write_sample(sample)
                .map_err(|e| write_error(path, e))?;
            stats.peak = stats.peak.max(sample.abs());
        }
        stats.samples += block.len();
        stage.tick();
        stats.frames += 1;
    }

    writer.finalize().map_err(|e| write_error(path, e))?;
    stage.shutdown();

    tracing::info!(
        path = %path.display(),
        frames = stats.frames,
        samples = stats.samples,
        peak = stats.peak,
        "bounce written"
    );
    Ok(stats)
}

/// Offline engine matching a recording's sample rate
pub fn offline_engine(
    recording: &RecordingConfig,
    config: &EngineConfig,
) -> Result<OfflineEngine> {
    OfflineEngine::new(recording.sample_rate, config)
}

fn write_error(path: &Path, source: hound::Error) -> StageError {
    StageError::WriteAudio {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::master::MasterBus;
    use crate::params::{AnalysisConfig, StageConfig};
    use crate::registry::SectionRegistry;

    fn stage(recording: &RecordingConfig) -> Stage<OfflineEngine> {
        let mut engine = offline_engine(recording, &EngineConfig::default()).unwrap();
        let mut registry = SectionRegistry::new();
        for descriptor in &StageConfig::default().sections {
            let sound = engine.add_sound(vec![0.25; 441], recording.sample_rate);
            registry
                .push(descriptor, sound, &AnalysisConfig::default())
                .unwrap();
        }
        Stage::new(engine, registry, MasterBus::default())
    }

    #[test]
    fn test_bounce_writes_mono_float_wav() {
        let dir = tempfile::tempdir().unwrap();
        let recording = RecordingConfig::new(1.0, dir.path().join("bounce.wav"));
        let mut stage = stage(&recording);

        let stats = bounce(&mut stage, &recording).unwrap();
        assert_eq!(stats.frames, 60);
        assert_eq!(stats.samples, 60 * 735);
        assert!(stats.peak > 0.0 && stats.peak <= 1.0);

        let reader = hound::WavReader::open(&recording.output_path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        assert_eq!(reader.len() as usize, stats.samples);

        // Bounce leaves the stage stopped
        assert!(!stage.registry().any_active());
    }

    #[test]
    fn test_bounce_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let recording = RecordingConfig::new(0.1, dir.path().join("missing/bounce.wav"));
        let mut stage = stage(&recording);

        let result = bounce(&mut stage, &recording);
        assert!(matches!(result, Err(StageError::WriteAudio { .. })));
    }
}
