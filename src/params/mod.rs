//! Parameter definitions with units and documented semantics.
//!
//! All tunable numbers are collected here with:
//! - Units (seconds, logical pixels, dBFS)
//! - Documented ranges and meanings
//! - Validation at construction time

mod audio;
mod render;
mod stage;

// Re-export all types
pub use audio::{audio_constants, AnalysisConfig, EngineConfig};
pub use render::{RecordingConfig, RenderConfig};
pub use stage::{Color, SectionDescriptor, StageConfig};
