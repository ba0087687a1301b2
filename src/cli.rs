//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::error::Result;
use crate::params::{RecordingConfig, StageConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Loopstage")]
#[command(about = "Interactive multi-track loop player", long_about = None)]
pub struct Args {
    /// Stage layout file (TOML); the built-in three-section stage when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory that section sound paths are resolved against
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub asset_root: PathBuf,

    /// Bounce the stage to a WAV file instead of opening a window
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Bounce length (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "10")]
    pub duration: f32,
}

impl Args {
    /// Load the stage layout from `--config`, or the built-in default
    pub fn load_stage_config(&self) -> Result<StageConfig> {
        match &self.config {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading stage config");
                StageConfig::load(path)
            }
            None => Ok(StageConfig::default()),
        }
    }

    /// Create recording configuration if bounce mode is enabled
    pub fn create_recording_config(&self) -> Option<RecordingConfig> {
        self.record
            .as_ref()
            .map(|path| RecordingConfig::new(self.duration, path))
    }
}
