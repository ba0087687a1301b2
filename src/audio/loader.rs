//! WAV asset loading.

use hound::{SampleFormat, WavReader};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, StageError};

/// Decoded mono sound resident in memory
#[derive(Debug, Clone)]
pub struct SoundBuffer {
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
}

impl SoundBuffer {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decode a WAV file into mono f32 samples
///
/// Multi-channel files are mixed down by averaging channels. Integer PCM
/// is scaled to [-1, 1). Float files containing NaN or infinite samples are
/// rejected. Any failure names the asset.
pub fn load_wav(path: &Path) -> Result<SoundBuffer> {
    let asset_error = |source: hound::Error| StageError::AssetLoad {
        path: path.to_path_buf(),
        source,
    };

    let reader = WavReader::open(path).map_err(asset_error)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(asset_error)?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(asset_error)?
        }
    };

    if samples.iter().any(|s| !s.is_finite()) {
        return Err(asset_error(hound::Error::FormatError(
            "non-finite sample in float data",
        )));
    }

    let mono: Vec<f32> = if channels > 1 {
        samples
            .chunks(channels)
            .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    if mono.is_empty() || spec.sample_rate == 0 {
        return Err(StageError::EmptyAsset {
            path: path.to_path_buf(),
        });
    }

    Ok(SoundBuffer {
        samples: mono.into(),
        sample_rate: spec.sample_rate,
    })
}
