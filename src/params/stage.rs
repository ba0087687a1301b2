//! Stage layout: master gain and the static per-section descriptors.
//!
//! Descriptors are construction-time only. They are read from TOML
//! (or taken from [`StageConfig::default`]) and validated once before
//! any section is built:
//!
//! ```toml
//! master_gain = 0.9
//!
//! [[sections]]
//! id = "jazz1"
//! name = "Sax Corner"
//! genre = "Jazz"
//! x = 60.0
//! y = 80.0
//! w = 260.0
//! h = 160.0
//! base_color = "#2b3a67"
//! active_color = "#3f64a0"
//! sound = "assets/audio/jazz_loop.wav"
//! ```

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::audio::audio_constants::DEFAULT_MASTER_GAIN;
use crate::error::{Result, StageError};

/// Opaque sRGB display color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Color {
    type Err = StageError;

    /// Parse `#rrggbb` (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || StageError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl TryFrom<String> for Color {
    type Error = StageError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Static configuration of one section
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionDescriptor {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Display genre
    pub genre: String,

    /// Left edge (logical pixels)
    pub x: f32,

    /// Top edge (logical pixels)
    pub y: f32,

    /// Width (logical pixels, > 0)
    pub w: f32,

    /// Height (logical pixels, > 0)
    pub h: f32,

    /// Panel color while inactive
    pub base_color: Color,

    /// Panel color while active
    pub active_color: Color,

    /// Loop asset, relative to the asset root unless absolute
    pub sound: PathBuf,
}

impl SectionDescriptor {
    /// Validate geometry and references
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(StageError::invalid_section(&self.id, "id must not be empty"));
        }
        if !(self.x.is_finite() && self.y.is_finite()) {
            return Err(StageError::invalid_section(
                &self.id,
                "position must be finite",
            ));
        }
        if !(self.w.is_finite() && self.h.is_finite() && self.w > 0.0 && self.h > 0.0) {
            return Err(StageError::invalid_section(
                &self.id,
                format!("size must be positive, got {}x{}", self.w, self.h),
            ));
        }
        if self.sound.as_os_str().is_empty() {
            return Err(StageError::invalid_section(
                &self.id,
                "sound path must not be empty",
            ));
        }
        Ok(())
    }

    /// Sound path resolved against `asset_root`
    pub fn sound_path(&self, asset_root: &Path) -> PathBuf {
        if self.sound.is_absolute() {
            self.sound.clone()
        } else {
            asset_root.join(&self.sound)
        }
    }
}

/// Whole-stage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    /// Master gain at startup, in [0, 1]
    #[serde(default = "default_master_gain")]
    pub master_gain: f32,

    /// Sections in render and hit-test priority order
    pub sections: Vec<SectionDescriptor>,
}

fn default_master_gain() -> f32 {
    DEFAULT_MASTER_GAIN
}

impl Default for StageConfig {
    fn default() -> Self {
        let section = |id: &str,
                       name: &str,
                       genre: &str,
                       x: f32,
                       base: Color,
                       active: Color,
                       sound: &str| SectionDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            genre: genre.to_string(),
            x,
            y: 80.0,
            w: 260.0,
            h: 160.0,
            base_color: base,
            active_color: active,
            sound: PathBuf::from(sound),
        };

        Self {
            master_gain: DEFAULT_MASTER_GAIN,
            sections: vec![
                section(
                    "jazz1",
                    "Sax Corner",
                    "Jazz",
                    60.0,
                    Color::rgb(0x2b, 0x3a, 0x67),
                    Color::rgb(0x3f, 0x64, 0xa0),
                    "assets/audio/jazz_loop.wav",
                ),
                section(
                    "rock1",
                    "Amp Row",
                    "Rock",
                    360.0,
                    Color::rgb(0x4b, 0x2e, 0x2e),
                    Color::rgb(0x7a, 0x3f, 0x3f),
                    "assets/audio/rock_loop.wav",
                ),
                section(
                    "edm1",
                    "Synth Table",
                    "EDM",
                    660.0,
                    Color::rgb(0x1c, 0x3b, 0x2a),
                    Color::rgb(0x2e, 0x7a, 0x59),
                    "assets/audio/edm_loop.wav",
                ),
            ],
        }
    }
}

impl StageConfig {
    /// Read and validate a TOML stage file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| StageError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a TOML stage description
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate gain range, every descriptor and id uniqueness
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.master_gain) {
            return Err(StageError::invalid_section(
                "",
                format!("master gain must be in [0, 1], got {}", self.master_gain),
            ));
        }
        if self.sections.is_empty() {
            return Err(StageError::invalid_section("", "no sections configured"));
        }

        let mut seen = HashSet::new();
        for descriptor in &self.sections {
            descriptor.validate()?;
            if !seen.insert(descriptor.id.as_str()) {
                return Err(StageError::invalid_section(
                    &descriptor.id,
                    "duplicate section id",
                ));
            }
        }
        Ok(())
    }
}
