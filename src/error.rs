//! Error types shared by the engine, configuration and rendering layers.

use std::path::PathBuf;

/// Errors raised while building or driving a stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// A sound asset was missing or could not be decoded.
    #[error("failed to load sound asset '{path}': {source}")]
    AssetLoad {
        /// Path of the asset that failed to load.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: hound::Error,
    },

    /// A sound asset decoded to zero frames.
    #[error("sound asset '{path}' contains no audio frames")]
    EmptyAsset {
        /// Path of the empty asset.
        path: PathBuf,
    },

    /// A rendered bounce could not be written.
    #[error("failed to write audio '{path}': {source}")]
    WriteAudio {
        /// Destination path.
        path: PathBuf,
        /// Underlying encoder error.
        #[source]
        source: hound::Error,
    },

    /// The engine was suspended and could not be resumed.
    #[error("audio engine is suspended: {0}")]
    EngineSuspended(String),

    /// No audio output device is available.
    #[error("no audio output device found")]
    NoDevice,

    /// Audio stream setup or runtime failure.
    #[error("audio stream error: {0}")]
    Stream(String),

    /// Configuration file could not be read.
    #[error("failed to read config '{path}': {source}")]
    ReadConfig {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for a stage.
    #[error("failed to parse config: {0}")]
    ParseConfig(#[from] toml::de::Error),

    /// A section descriptor failed validation.
    #[error("invalid section '{id}': {reason}")]
    InvalidSection {
        /// Identifier of the offending section (may be empty).
        id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A color string was not `#rrggbb`.
    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),

    /// Analysis parameters are out of range.
    #[error("invalid analysis config: {0}")]
    InvalidAnalysis(String),

    /// GPU surface, adapter or device setup failed.
    #[error("render setup failed: {0}")]
    Render(String),
}

impl StageError {
    /// Create an invalid section error.
    pub fn invalid_section(id: impl Into<String>, reason: impl Into<String>) -> Self {
        StageError::InvalidSection {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience result type for stage operations.
pub type Result<T> = std::result::Result<T, StageError>;
