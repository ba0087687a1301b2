//! Loopstage library - Interactive multi-track audio loop player

pub mod audio;
pub mod bounce;
pub mod cli;
pub mod error;
pub mod input;
pub mod master;
pub mod params;
pub mod registry;
pub mod rendering;
pub mod section;
pub mod stage;
