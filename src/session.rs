use indexmap::IndexMap;

use crate::assign::ReplacementRegistry;
use crate::core::model::{CanonicalEntity, EntityKey};

/// Everything accumulated across the documents of one run.
///
/// Entities keep their commit order; linking and export rely on it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    entities: IndexMap<EntityKey, CanonicalEntity>,
    registry: ReplacementRegistry,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    pub fn get(&self, key: &EntityKey) -> Option<&CanonicalEntity> {
        self.entities.get(key)
    }

    pub fn entities(&self) -> impl Iterator<Item = &CanonicalEntity> {
        self.entities.values()
    }

    pub fn registry(&self) -> &ReplacementRegistry {
        &self.registry
    }

    /// `(original, replacement)` pairs of entities that carry a replacement.
    pub fn replacement_pairs(&self) -> Vec<(&str, &str)> {
        self.entities
            .values()
            .filter_map(|e| Some((e.text.as_str(), e.replacement.as_deref()?)))
            .collect()
    }

    pub fn reset(&mut self) {
        self.entities.clear();
        self.registry.clear();
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ReplacementRegistry {
        &mut self.registry
    }

    pub(crate) fn get_mut(&mut self, key: &EntityKey) -> Option<&mut CanonicalEntity> {
        self.entities.get_mut(key)
    }

    /// Commits a new entity; an existing key is left untouched.
    pub(crate) fn commit(&mut self, entity: CanonicalEntity) -> bool {
        let key = entity.key();
        if self.entities.contains_key(&key) {
            return false;
        }
        self.registry.reserve_original(&entity.text);
        self.entities.insert(key, entity);
        true
    }

    /// Drops entities matching `predicate`, keeping the order of the rest.
    pub(crate) fn remove_where(&mut self, predicate: impl Fn(&CanonicalEntity) -> bool) -> usize {
        let before = self.entities.len();
        self.entities.retain(|_, entity| !predicate(entity));
        before - self.entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::label::EntityLabel;
    use pretty_assertions::assert_eq;

    fn entity(text: &str, replacement: Option<&str>) -> CanonicalEntity {
        CanonicalEntity {
            text: text.to_string(),
            label: EntityLabel::Location,
            confidence: Some(0.9),
            origins: vec!["test".to_string()],
            replacement: replacement.map(str::to_string),
            similarity_score: None,
            similarity_with: None,
        }
    }

    #[test]
    fn commit_keeps_first_entity_per_key() {
        let mut session = Session::new();
        assert!(session.commit(entity("Helsinki", Some("^espoo"))));
        assert!(!session.commit(entity("Helsinki", Some("^vantaa"))));
        assert_eq!(session.len(), 1);
        assert_eq!(session.replacement_pairs(), vec![("Helsinki", "^espoo")]);
        assert!(session.registry().is_taken("Helsinki"));
    }

    #[test]
    fn removal_preserves_order() {
        let mut session = Session::new();
        for text in ["Oulu", "Kemi", "Pori"] {
            session.commit(entity(text, None));
        }
        assert_eq!(session.remove_where(|e| e.text == "Kemi"), 1);
        let texts: Vec<&str> = session.entities().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Oulu", "Pori"]);
    }

    #[test]
    fn reset_clears_entities_and_registry() {
        let mut session = Session::new();
        session.commit(entity("Oulu", Some("^kemi")));
        session.registry_mut().register("^kemi");
        session.reset();
        assert!(session.is_empty());
        assert!(session.registry().is_empty());
    }
}
