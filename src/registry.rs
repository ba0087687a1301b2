//! Ordered owner of every section.
//!
//! Insertion order is render order and hit-test priority. Sections are
//! never removed once registered.

use crate::audio::{AudioEngine, RampToken, SoundId};
use crate::error::Result;
use crate::params::{AnalysisConfig, SectionDescriptor};
use crate::section::{AudioSection, SectionKey};

#[derive(Default)]
pub struct SectionRegistry {
    sections: Vec<AudioSection>,
}

impl SectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and append a section bound to `sound`
    pub fn push(
        &mut self,
        descriptor: &SectionDescriptor,
        sound: SoundId,
        analysis: &AnalysisConfig,
    ) -> Result<SectionKey> {
        let key = SectionKey::new(self.sections.len());
        let section = AudioSection::new(key, descriptor, sound, analysis)?;
        tracing::info!(
            section = %section.id(),
            name = %section.name(),
            genre = %section.genre(),
            "section ready"
        );
        self.sections.push(section);
        Ok(key)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AudioSection> {
        self.sections.iter()
    }

    pub fn get(&self, key: SectionKey) -> Option<&AudioSection> {
        self.sections.get(key.index())
    }

    pub fn find(&self, id: &str) -> Option<&AudioSection> {
        self.sections.iter().find(|section| section.id() == id)
    }

    pub fn any_active(&self) -> bool {
        self.sections.iter().any(AudioSection::is_active)
    }

    /// First section (in order) strictly containing the point
    pub fn hit_test(&self, px: f32, py: f32) -> Option<&AudioSection> {
        self.sections.iter().find(|section| section.contains(px, py))
    }

    /// Toggle the section under the pointer, if any
    pub fn dispatch(
        &mut self,
        px: f32,
        py: f32,
        engine: &mut dyn AudioEngine,
    ) -> Option<SectionKey> {
        let section = self
            .sections
            .iter_mut()
            .find(|section| section.contains(px, py))?;
        section.toggle(engine);
        Some(section.key())
    }

    /// Stop everything if anything is active, otherwise start everything
    pub fn toggle_all(&mut self, engine: &mut dyn AudioEngine) {
        // Decided once, before any section changes
        if self.any_active() {
            self.reset_all(engine);
        } else {
            for section in &mut self.sections {
                section.start(engine);
            }
        }
    }

    pub fn reset_all(&mut self, engine: &mut dyn AudioEngine) {
        for section in &mut self.sections {
            section.stop(engine);
        }
    }

    /// Route a finished fade to its section; returns whether a loop halted
    pub fn complete_ramp(&mut self, token: RampToken, engine: &mut dyn AudioEngine) -> bool {
        match self.sections.get_mut(token.key.index()) {
            Some(section) => section.on_ramp_complete(token.generation, engine),
            None => {
                tracing::warn!(key = token.key.index(), "fade completion for unknown section");
                false
            }
        }
    }

    /// Refresh every section's analysis, in order
    pub fn update(&mut self, engine: &dyn AudioEngine) {
        for section in &mut self.sections {
            section.update(engine);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::OfflineEngine;
    use crate::params::{EngineConfig, StageConfig};

    fn setup() -> (OfflineEngine, SectionRegistry) {
        let mut engine = OfflineEngine::new(1000, &EngineConfig::default()).unwrap();
        let mut registry = SectionRegistry::new();
        for descriptor in &StageConfig::default().sections {
            let sound = engine.add_sound(vec![0.5; 32], 1000);
            registry
                .push(descriptor, sound, &AnalysisConfig::default())
                .unwrap();
        }
        (engine, registry)
    }

    fn active_flags(registry: &SectionRegistry) -> Vec<bool> {
        registry.iter().map(AudioSection::is_active).collect()
    }

    #[test]
    fn test_keys_follow_insertion_order() {
        let (_, registry) = setup();
        assert_eq!(registry.len(), 3);
        for (i, section) in registry.iter().enumerate() {
            assert_eq!(section.key().index(), i);
        }
        assert_eq!(registry.find("rock1").unwrap().name(), "Amp Row");
        assert!(registry.find("nope").is_none());
    }

    #[test]
    fn test_hit_test_resolves_sections() {
        let (_, registry) = setup();
        assert_eq!(registry.hit_test(400.0, 100.0).unwrap().id(), "rock1");
        assert!(registry.hit_test(340.0, 100.0).is_none());
        assert!(registry.hit_test(360.0, 100.0).is_none());
    }

    #[test]
    fn test_first_hit_wins_on_overlap() {
        let mut engine = OfflineEngine::new(1000, &EngineConfig::default()).unwrap();
        let mut registry = SectionRegistry::new();
        let mut descriptors = StageConfig::default().sections;
        descriptors[1].x = descriptors[0].x;
        for descriptor in &descriptors[..2] {
            let sound = engine.add_sound(vec![0.5; 32], 1000);
            registry
                .push(descriptor, sound, &AnalysisConfig::default())
                .unwrap();
        }

        let key = registry.dispatch(100.0, 100.0, &mut engine);
        assert_eq!(key, Some(SectionKey::new(0)));
        assert_eq!(active_flags(&registry), vec![true, false]);
    }

    #[test]
    fn test_dispatch_miss_is_noop() {
        let (mut engine, mut registry) = setup();
        assert_eq!(registry.dispatch(5.0, 5.0, &mut engine), None);
        assert_eq!(active_flags(&registry), vec![false; 3]);
    }

    #[test]
    fn test_toggle_all() {
        let (mut engine, mut registry) = setup();
        registry.toggle_all(&mut engine);
        assert_eq!(active_flags(&registry), vec![true; 3]);

        registry.toggle_all(&mut engine);
        assert_eq!(active_flags(&registry), vec![false; 3]);

        // One active section is enough to stop everything
        registry.dispatch(700.0, 100.0, &mut engine);
        registry.toggle_all(&mut engine);
        assert_eq!(active_flags(&registry), vec![false; 3]);
    }

    #[test]
    fn test_reset_all() {
        let (mut engine, mut registry) = setup();
        registry.dispatch(100.0, 100.0, &mut engine);
        registry.dispatch(700.0, 100.0, &mut engine);
        registry.reset_all(&mut engine);
        assert!(!registry.any_active());
    }

    #[test]
    fn test_complete_ramp_routes_by_key() {
        let (mut engine, mut registry) = setup();
        registry.toggle_all(&mut engine);
        engine.advance_secs(0.5);
        registry.dispatch(400.0, 100.0, &mut engine);
        engine.advance_secs(0.5);

        let tokens = engine.drain_completed_ramps();
        assert_eq!(tokens.len(), 1);
        assert!(registry.complete_ramp(tokens[0], &mut engine));

        let rock = registry.find("rock1").unwrap().sound();
        let jazz = registry.find("jazz1").unwrap().sound();
        assert!(!engine.is_playing(rock));
        assert!(engine.is_playing(jazz));

        let unknown = RampToken {
            key: SectionKey::new(9),
            generation: 1,
        };
        assert!(!registry.complete_ramp(unknown, &mut engine));
    }
}
