use std::collections::BTreeMap;

use crate::config::RedactConfig;
use crate::consolidate::normalize::normalize_text;
use crate::core::label::EntityLabel;
use crate::core::model::DetectedSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    LabelNotRedacted,
    Excluded,
    LowConfidence,
    TooShort,
}

/// Filters applied to every candidate span before it may become an entity.
#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    pub redact_labels: Vec<EntityLabel>,
    pub confidence_threshold: f32,
    pub min_length: usize,
    // normalized form -> text as configured
    exclusions: BTreeMap<String, String>,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::from_config(&RedactConfig::default())
    }
}

impl AdmissionPolicy {
    pub fn from_config(config: &RedactConfig) -> Self {
        let mut policy = Self {
            redact_labels: config.redact_labels.clone(),
            confidence_threshold: config.confidence_threshold,
            min_length: config.min_length,
            exclusions: BTreeMap::new(),
        };
        policy.add_exclusions(&config.exclusions);
        policy
    }

    pub fn add_exclusions<S: AsRef<str>>(&mut self, words: &[S]) {
        for word in words {
            let normalized = normalize_text(word.as_ref());
            if !normalized.is_empty() {
                self.exclusions
                    .insert(normalized, word.as_ref().trim().to_string());
            }
        }
    }

    pub fn replace_exclusions<S: AsRef<str>>(&mut self, words: &[S]) {
        self.exclusions.clear();
        self.add_exclusions(words);
    }

    /// Configured exclusion words, ordered by their normalized form.
    pub fn exclusions(&self) -> impl Iterator<Item = &str> {
        self.exclusions.values().map(String::as_str)
    }

    pub fn is_excluded(&self, text: &str) -> bool {
        self.exclusions.contains_key(&normalize_text(text))
    }

    /// Why `span` is not admitted, or `None` when it passes every filter.
    pub fn rejection(&self, span: &DetectedSpan) -> Option<Rejection> {
        if !self.redact_labels.contains(&span.label) {
            return Some(Rejection::LabelNotRedacted);
        }
        if self.is_excluded(&span.text) {
            return Some(Rejection::Excluded);
        }
        if let Some(score) = span.confidence {
            if score <= self.confidence_threshold {
                return Some(Rejection::LowConfidence);
            }
        }
        if span.text.trim().chars().count() < self.min_length {
            return Some(Rejection::TooShort);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span(text: &str, label: EntityLabel, confidence: Option<f32>) -> DetectedSpan {
        DetectedSpan {
            text: text.to_string(),
            label,
            start: 0,
            end: text.chars().count(),
            confidence,
            origin: "test".to_string(),
        }
    }

    #[test]
    fn applies_each_filter() {
        let mut policy = AdmissionPolicy::default();
        policy.add_exclusions(&["Suomen Pankki"]);

        assert_eq!(
            policy.rejection(&span("Helsinki", EntityLabel::Location, Some(0.9))),
            None
        );
        assert_eq!(
            policy.rejection(&span("https://x.fi", EntityLabel::Url, Some(0.9))),
            Some(Rejection::LabelNotRedacted)
        );
        assert_eq!(
            policy.rejection(&span("suomen-pankki", EntityLabel::Organization, Some(0.9))),
            Some(Rejection::Excluded)
        );
        assert_eq!(
            policy.rejection(&span("Helsinki", EntityLabel::Location, Some(0.5))),
            Some(Rejection::LowConfidence)
        );
        assert_eq!(
            policy.rejection(&span("Oy", EntityLabel::Organization, Some(0.9))),
            Some(Rejection::TooShort)
        );
    }

    #[test]
    fn missing_confidence_is_admitted() {
        let policy = AdmissionPolicy::default();
        assert_eq!(
            policy.rejection(&span("Tampere", EntityLabel::Location, None)),
            None
        );
    }

    #[test]
    fn min_length_counts_characters() {
        let policy = AdmissionPolicy::default();
        assert_eq!(policy.rejection(&span("Åänä", EntityLabel::Person, None)), None);
        assert_eq!(
            policy.rejection(&span(" Äkä ", EntityLabel::Person, None)),
            Some(Rejection::TooShort)
        );
    }

    #[test]
    fn replacing_exclusions_drops_old_words() {
        let mut policy = AdmissionPolicy::default();
        policy.add_exclusions(&["Kela"]);
        policy.replace_exclusions(&["Yle"]);
        assert!(!policy.is_excluded("Kela"));
        assert!(policy.is_excluded("YLE"));
        assert_eq!(policy.exclusions().collect::<Vec<_>>(), vec!["Yle"]);
    }
}
