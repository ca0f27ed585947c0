use std::collections::{HashMap, HashSet};

use crate::core::label::EntityLabel;

const SENTINEL_PREFIX: &str = "^pseudonymized_var";

/// Session-wide record of issued replacement values.
///
/// Also remembers every original surface text committed to the session so
/// that no strategy hands out a value that is itself sensitive text.
#[derive(Debug, Clone, Default)]
pub struct ReplacementRegistry {
    issued: HashSet<String>,
    originals: HashSet<String>,
    counters: HashMap<EntityLabel, usize>,
    sentinel_seq: usize,
}

impl ReplacementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    pub fn is_issued(&self, value: &str) -> bool {
        self.issued.contains(value)
    }

    pub fn is_original(&self, value: &str) -> bool {
        self.originals.contains(value)
    }

    /// Issued already, or equal to a committed original text.
    pub fn is_taken(&self, value: &str) -> bool {
        self.issued.contains(value) || self.originals.contains(value)
    }

    /// Records an issued value; false if it was already present.
    pub fn register(&mut self, value: &str) -> bool {
        self.issued.insert(value.to_string())
    }

    pub fn reserve_original(&mut self, text: &str) {
        self.originals.insert(text.to_string());
    }

    /// Advances the per-label counter and returns its new value.
    pub fn bump_counter(&mut self, label: EntityLabel) -> usize {
        let counter = self.counters.entry(label).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Unique fallback value, registered before it is returned.
    pub fn next_sentinel(&mut self) -> String {
        loop {
            self.sentinel_seq += 1;
            let candidate = format!("{SENTINEL_PREFIX}_{}", self.sentinel_seq);
            if !self.is_taken(&candidate) {
                self.register(&candidate);
                return candidate;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sentinels_never_repeat() {
        let mut registry = ReplacementRegistry::new();
        registry.register("^pseudonymized_var_2");
        let first = registry.next_sentinel();
        let second = registry.next_sentinel();
        assert_eq!(first, "^pseudonymized_var_1");
        assert_eq!(second, "^pseudonymized_var_3");
        assert!(registry.is_issued(&first) && registry.is_issued(&second));
    }

    #[test]
    fn counters_are_per_label() {
        let mut registry = ReplacementRegistry::new();
        assert_eq!(registry.bump_counter(EntityLabel::Person), 1);
        assert_eq!(registry.bump_counter(EntityLabel::Person), 2);
        assert_eq!(registry.bump_counter(EntityLabel::Location), 1);
        assert_eq!(registry.bump_counter(EntityLabel::Url), 1);
    }

    #[test]
    fn originals_count_as_taken_but_not_issued() {
        let mut registry = ReplacementRegistry::new();
        registry.reserve_original("Helsinki");
        assert!(registry.is_taken("Helsinki"));
        assert!(!registry.is_issued("Helsinki"));
        assert!(registry.register("^espoo"));
        assert!(!registry.register("^espoo"));
        assert_eq!(registry.len(), 1);
    }
}
