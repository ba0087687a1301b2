//! Device-backed engine: a cpal output stream driving the loop mixer.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::engine::{AudioEngine, RampToken, SoundId};
use super::loader::load_wav;
use super::mixer::Mixer;
use crate::error::{Result, StageError};
use crate::params::{AnalysisConfig, EngineConfig};

/// Audio engine playing through the default output device
///
/// The stream is built paused: the engine reports itself suspended until
/// the first [`AudioEngine::resume`].
pub struct CpalEngine {
    /// Mixer shared with the output callback
    mixer: Arc<Mutex<Mixer>>,

    /// Audio output stream (kept alive)
    stream: cpal::Stream,

    /// Tap settings validated against the mixer history
    analysis: AnalysisConfig,

    running: bool,
}

impl CpalEngine {
    /// Open the default output device with the given configuration
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        // Setup audio output device
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(StageError::NoDevice)?;

        let supported = device
            .default_output_config()
            .map_err(|e| StageError::Stream(format!("failed to get output config: {}", e)))?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(StageError::Stream(format!(
                "unsupported sample format {:?}",
                supported.sample_format()
            )));
        }

        let mut stream_config: cpal::StreamConfig = supported.into();
        if let Some(frames) = config.buffer_frames {
            stream_config.buffer_size = cpal::BufferSize::Fixed(frames);
        }
        let channels = stream_config.channels as usize;

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate = stream_config.sample_rate.0,
            channels,
            "audio output"
        );

        let mixer = Arc::new(Mutex::new(Mixer::new(
            stream_config.sample_rate.0 as f32,
            config.history_len,
        )));
        let mixer_callback = Arc::clone(&mixer);

        // Build audio output stream
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut mixer = mixer_callback
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    mixer.render(data, channels);
                },
                |err| tracing::warn!(%err, "audio stream error"),
                None,
            )
            .map_err(|e| StageError::Stream(format!("failed to build output stream: {}", e)))?;

        // Some hosts start streams eagerly
        if let Err(e) = stream.pause() {
            tracing::debug!(error = %e, "output stream could not be paused at startup");
        }

        Ok(Self {
            mixer,
            stream,
            analysis: config.analysis.clone(),
            running: false,
        })
    }

    fn mixer(&self) -> MutexGuard<'_, Mixer> {
        self.mixer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioEngine for CpalEngine {
    fn load_sound(&mut self, path: &Path) -> Result<SoundId> {
        let sound = load_wav(path)?;
        tracing::info!(
            path = %path.display(),
            sample_rate = sound.sample_rate,
            secs = sound.duration_secs(),
            "loaded sound"
        );
        Ok(self.mixer().add_voice(sound.samples, sound.sample_rate))
    }

    fn analysis_config(&self) -> &AnalysisConfig {
        &self.analysis
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn resume(&mut self) -> Result<()> {
        self.stream
            .play()
            .map_err(|e| StageError::EngineSuspended(e.to_string()))?;
        self.running = true;
        tracing::info!("audio output resumed");
        Ok(())
    }

    fn play_loop(&mut self, sound: SoundId) {
        self.mixer().play_loop(sound);
    }

    fn stop(&mut self, sound: SoundId) {
        self.mixer().stop(sound);
    }

    fn is_playing(&self, sound: SoundId) -> bool {
        self.mixer().is_playing(sound)
    }

    fn ramp_gain(
        &mut self,
        sound: SoundId,
        target: f32,
        ramp_secs: f32,
        on_complete: Option<RampToken>,
    ) {
        self.mixer()
            .ramp_gain(sound, target, ramp_secs, on_complete);
    }

    fn ramp_master(&mut self, target: f32, ramp_secs: f32) {
        self.mixer().ramp_master(target, ramp_secs);
    }

    fn read_recent(&self, sound: SoundId, out: &mut [f32]) {
        self.mixer().read_recent(sound, out);
    }

    fn drain_completed_ramps(&mut self) -> Vec<RampToken> {
        self.mixer().drain_completed()
    }
}
