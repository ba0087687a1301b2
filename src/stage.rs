//! The playable stage: engine, sections and master bus under one owner.

use std::path::Path;

use crate::audio::AudioEngine;
use crate::error::Result;
use crate::master::MasterBus;
use crate::params::StageConfig;
use crate::registry::SectionRegistry;
use crate::section::SectionView;

/// A user command, already resolved from raw input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Pointer press at logical coordinates
    Press { x: f32, y: f32 },
    /// Start everything, or stop everything if anything plays
    ToggleAll,
    /// Stop everything
    ResetAll,
    /// Mute or unmute the master bus
    ToggleMute,
}

pub struct Stage<E: AudioEngine> {
    engine: E,
    registry: SectionRegistry,
    master: MasterBus,
}

impl<E: AudioEngine> Stage<E> {
    /// Assemble a stage and apply the master gain to the engine
    pub fn new(mut engine: E, registry: SectionRegistry, master: MasterBus) -> Self {
        master.attach(&mut engine);
        Self {
            engine,
            registry,
            master,
        }
    }

    /// Load every section's sound and build the stage
    ///
    /// Taps use the engine's analysis settings, so their windows always fit
    /// the engine's sample history. Any asset that fails to load aborts
    /// construction.
    pub fn build(mut engine: E, config: &StageConfig, asset_root: &Path) -> Result<Self> {
        config.validate()?;
        let analysis = engine.analysis_config().clone();

        let mut registry = SectionRegistry::new();
        for descriptor in &config.sections {
            let sound = engine.load_sound(&descriptor.sound_path(asset_root))?;
            registry.push(descriptor, sound, &analysis)?;
        }

        let stage = Self::new(engine, registry, MasterBus::new(config.master_gain));
        tracing::info!(
            sections = stage.registry.len(),
            master_gain = stage.master.gain(),
            "stage ready"
        );
        Ok(stage)
    }

    pub fn apply(&mut self, command: Command) {
        tracing::debug!(?command, "command");
        match command {
            Command::Press { x, y } => {
                self.registry.dispatch(x, y, &mut self.engine);
            }
            Command::ToggleAll => self.registry.toggle_all(&mut self.engine),
            Command::ResetAll => self.registry.reset_all(&mut self.engine),
            Command::ToggleMute => self.master.toggle_mute(&mut self.engine),
        }
    }

    /// Per-frame work: settle finished fades, then refresh analysis
    pub fn tick(&mut self) {
        for token in self.engine.drain_completed_ramps() {
            self.registry.complete_ramp(token, &mut self.engine);
        }
        self.registry.update(&self.engine);
    }

    pub fn views(&self) -> impl Iterator<Item = SectionView<'_>> {
        self.registry.iter().map(|section| section.view())
    }

    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    pub fn master(&self) -> &MasterBus {
        &self.master
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Stop every section before teardown
    pub fn shutdown(&mut self) {
        self.registry.reset_all(&mut self.engine);
        tracing::info!("stage stopped");
    }
}
