use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::assign::registry::ReplacementRegistry;
use crate::assign::vocabulary::{
    ascii_fold, BUSINESS_WORDS, CITIES, COMPANY_SUFFIXES, EMAIL_DOMAINS, FIRST_NAMES, LAST_NAMES,
    PHONE_PREFIXES, STREET_WORDS, URL_TLDS,
};
use crate::assign::ReplacementStrategy;
use crate::config::StrategyKind;
use crate::core::label::EntityLabel;
use crate::core::model::CanonicalEntity;
use crate::error::{PseudoError, Result};

/// Draws equal to the original text tolerated before falling back to a sentinel.
pub const MAX_ORIGINAL_RETRIES: usize = 50;

// Consecutive registry collisions after which draws get a numeric tail.
const COLLISION_BUDGET: usize = 500;

const MARKER: char = '^';

/// Realistic Finnish fake values, lower-cased and prefixed with `^`.
#[derive(Debug, Clone)]
pub struct SyntheticStrategy {
    rng: StdRng,
}

impl SyntheticStrategy {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn pick(&mut self, pool: &[&'static str]) -> &'static str {
        pool[self.rng.gen_range(0..pool.len())]
    }

    fn person(&mut self) -> String {
        format!("{} {}", self.pick(FIRST_NAMES), self.pick(LAST_NAMES))
    }

    fn location(&mut self) -> String {
        if self.rng.gen_bool(0.7) {
            self.pick(CITIES).to_string()
        } else {
            format!(
                "{}katu {}, {}",
                self.pick(STREET_WORDS),
                self.rng.gen_range(1..120),
                self.pick(CITIES)
            )
        }
    }

    fn company(&mut self) -> String {
        let base = match self.rng.gen_range(0..3) {
            0 => self.pick(LAST_NAMES).to_string(),
            1 => format!("{}-{}", self.pick(LAST_NAMES), self.pick(LAST_NAMES)),
            _ => format!("{} {}", self.pick(BUSINESS_WORDS), self.pick(LAST_NAMES)),
        };
        if COMPANY_SUFFIXES.iter().any(|suffix| base.ends_with(suffix)) {
            base
        } else {
            format!("{base} {}", self.pick(COMPANY_SUFFIXES))
        }
    }

    fn email(&mut self) -> String {
        let first = ascii_fold(self.pick(FIRST_NAMES));
        let last = ascii_fold(self.pick(LAST_NAMES));
        format!("{first}.{last}@{}", self.pick(EMAIL_DOMAINS))
    }

    fn phone(&mut self) -> String {
        let prefix = self.pick(PHONE_PREFIXES);
        let middle = self.rng.gen_range(100..1000);
        let tail = self.rng.gen_range(1000..10000);
        if self.rng.gen_bool(0.5) {
            format!("{prefix} {middle} {tail}")
        } else {
            format!("+358 {} {middle} {tail}", &prefix[1..])
        }
    }

    fn url(&mut self) -> String {
        let host = ascii_fold(self.pick(LAST_NAMES));
        format!("https://www.{host}.{}/", self.pick(URL_TLDS))
    }

    /// One raw draw for `label`; `None` when the label has no generator.
    pub fn draw(&mut self, label: EntityLabel) -> Option<String> {
        let value = match label {
            EntityLabel::Person => self.person(),
            EntityLabel::Location => self.location(),
            EntityLabel::Organization => self.company(),
            EntityLabel::EmailAddress => self.email(),
            EntityLabel::PhoneNumber => self.phone(),
            EntityLabel::Url => self.url(),
            EntityLabel::Nrp => return None,
        };
        Some(value)
    }
}

impl ReplacementStrategy for SyntheticStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Synthetic
    }

    fn replacement_for(
        &mut self,
        entity: &CanonicalEntity,
        registry: &mut ReplacementRegistry,
    ) -> Result<String> {
        let mut same_as_original = 0;
        let mut collisions = 0;
        loop {
            let draw = self
                .draw(entity.label)
                .ok_or(PseudoError::UnsupportedLabel(entity.label))?;

            if draw.eq_ignore_ascii_case(&entity.text) {
                same_as_original += 1;
                if same_as_original >= MAX_ORIGINAL_RETRIES {
                    debug!(entity = %entity.uid(), "generator kept returning the original, using sentinel");
                    return Ok(registry.next_sentinel());
                }
                continue;
            }

            let mut candidate = format!("{MARKER}{}", draw.to_lowercase());
            if collisions >= COLLISION_BUDGET {
                candidate = format!("{candidate} {}", collisions - COLLISION_BUDGET + 2);
            }
            if candidate == entity.text || registry.is_taken(&candidate) {
                collisions += 1;
                continue;
            }
            registry.register(&candidate);
            return Ok(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entity(text: &str, label: EntityLabel) -> CanonicalEntity {
        CanonicalEntity {
            text: text.to_string(),
            label,
            confidence: Some(0.9),
            origins: vec!["test".to_string()],
            replacement: None,
            similarity_score: None,
            similarity_with: None,
        }
    }

    #[test]
    fn values_are_marked_and_lowercased() {
        let mut strategy = SyntheticStrategy::new(Some(7));
        let mut registry = ReplacementRegistry::new();
        for label in [
            EntityLabel::Person,
            EntityLabel::Location,
            EntityLabel::Organization,
            EntityLabel::EmailAddress,
            EntityLabel::PhoneNumber,
            EntityLabel::Url,
        ] {
            let value = strategy
                .replacement_for(&entity("Alkuperäinen", label), &mut registry)
                .unwrap();
            assert!(value.starts_with('^'), "{value}");
            assert_eq!(value, value.to_lowercase());
            assert!(registry.is_issued(&value));
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SyntheticStrategy::new(Some(42));
        let mut b = SyntheticStrategy::new(Some(42));
        let left: Vec<_> = (0..10).map(|_| a.draw(EntityLabel::Person)).collect();
        let right: Vec<_> = (0..10).map(|_| b.draw(EntityLabel::Person)).collect();
        assert_eq!(left, right);
    }

    #[test]
    fn companies_end_with_a_known_suffix() {
        let mut strategy = SyntheticStrategy::new(Some(3));
        for _ in 0..50 {
            let company = strategy.draw(EntityLabel::Organization).unwrap();
            assert!(
                COMPANY_SUFFIXES.iter().any(|s| company.ends_with(s)),
                "{company}"
            );
        }
    }

    #[test]
    fn nrp_has_no_generator() {
        let mut strategy = SyntheticStrategy::new(Some(1));
        let mut registry = ReplacementRegistry::new();
        let err = strategy
            .replacement_for(&entity("suomalainen", EntityLabel::Nrp), &mut registry)
            .unwrap_err();
        assert!(matches!(err, PseudoError::UnsupportedLabel(EntityLabel::Nrp)));
        assert!(registry.is_empty());
    }

    #[test]
    fn never_reissues_a_value_even_when_pool_is_exhausted() {
        let mut strategy = SyntheticStrategy::new(Some(11));
        let mut registry = ReplacementRegistry::new();
        let mut seen = std::collections::HashSet::new();
        for i in 0..(CITIES.len() * 3) {
            let value = strategy
                .replacement_for(&entity(&format!("Paikka{i}"), EntityLabel::Location), &mut registry)
                .unwrap();
            assert!(seen.insert(value));
        }
    }
}
