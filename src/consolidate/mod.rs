pub mod admission;
pub mod link;
pub mod normalize;
pub mod similarity;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::assign::ReplacementAssigner;
use crate::config::RedactConfig;
use crate::core::model::{CanonicalEntity, DetectedSpan, EntityKey};
use crate::error::PseudoError;
use crate::session::Session;

pub use admission::{AdmissionPolicy, Rejection};
pub use link::LinkReport;
pub use normalize::normalize_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionUpdate {
    Add,
    Replace,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FoldReport {
    pub candidates: usize,
    pub rejected: usize,
    pub added: usize,
    pub already_known: usize,
    /// Candidates whose text is itself an issued replacement.
    pub already_redacted: usize,
    /// Entities dropped because no replacement could be produced for them.
    pub unassignable: usize,
}

/// Turns raw detector spans into the session's canonical entity set.
#[derive(Debug, Clone)]
pub struct Consolidator {
    policy: AdmissionPolicy,
    similarity_threshold: f32,
}

impl Consolidator {
    pub fn new(policy: AdmissionPolicy, similarity_threshold: f32) -> Self {
        Self {
            policy,
            similarity_threshold,
        }
    }

    pub fn from_config(config: &RedactConfig) -> Self {
        Self::new(
            AdmissionPolicy::from_config(config),
            config.similarity_threshold,
        )
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Admitted spans, one per identity key, longest surface text first.
    ///
    /// The first admitted span for a key wins; later duplicates only add
    /// their detector origin.
    pub fn candidates(&self, spans: Vec<DetectedSpan>) -> Vec<CanonicalEntity> {
        self.admit(spans).0
    }

    fn admit(&self, mut spans: Vec<DetectedSpan>) -> (Vec<CanonicalEntity>, usize) {
        spans.sort_by_key(|span| std::cmp::Reverse(span.text.trim().chars().count()));

        let mut rejected = 0;
        let mut admitted: IndexMap<EntityKey, CanonicalEntity> = IndexMap::new();
        for span in &spans {
            if let Some(reason) = self.policy.rejection(span) {
                debug!(text = %span.text, label = %span.label, ?reason, "span rejected");
                rejected += 1;
                continue;
            }
            admitted
                .entry(span.key())
                .and_modify(|entity| merge_origins(entity, &[span.origin.clone()]))
                .or_insert_with(|| CanonicalEntity::from_span(span));
        }
        (admitted.into_values().collect(), rejected)
    }

    /// Admits `spans` and commits every new entity with a fresh replacement.
    ///
    /// Keys already in the session keep their replacement. Folding the same
    /// spans again leaves the session unchanged.
    pub fn fold(
        &self,
        session: &mut Session,
        assigner: &mut ReplacementAssigner,
        spans: Vec<DetectedSpan>,
    ) -> FoldReport {
        let mut report = FoldReport {
            candidates: spans.len(),
            ..FoldReport::default()
        };
        let (entities, rejected) = self.admit(spans);
        report.rejected = rejected;

        // Reserve every new original first so no assignment below can hand
        // out a text that a later candidate still has to replace.
        for entity in &entities {
            let registry = session.registry_mut();
            if !registry.is_issued(&entity.text) {
                registry.reserve_original(&entity.text);
            }
        }

        for mut entity in entities {
            let key = entity.key();
            if let Some(existing) = session.get_mut(&key) {
                merge_origins(existing, &entity.origins);
                report.already_known += 1;
                continue;
            }
            if session.registry().is_issued(&entity.text) {
                debug!(entity = %entity.text, "text is an issued replacement, skipping");
                report.already_redacted += 1;
                continue;
            }
            match assigner.assign(&entity, session.registry_mut()) {
                Ok(value) => {
                    entity.replacement = Some(value);
                    session.commit(entity);
                    report.added += 1;
                }
                Err(PseudoError::UnsupportedLabel(label)) => {
                    warn!(entity = %entity.text, %label, "no replacement available for label, skipping");
                    report.unassignable += 1;
                }
                Err(err) => {
                    warn!(entity = %entity.text, error = %err, "replacement failed, skipping");
                    report.unassignable += 1;
                }
            }
        }
        report
    }

    pub fn link(&self, session: &mut Session) -> LinkReport {
        link::link_similar(session, self.similarity_threshold)
    }

    /// Updates the exclusion list and drops committed entities it now covers.
    pub fn update_exclusions<S: AsRef<str>>(
        &mut self,
        session: &mut Session,
        words: &[S],
        mode: ExclusionUpdate,
    ) -> usize {
        match mode {
            ExclusionUpdate::Add => self.policy.add_exclusions(words),
            ExclusionUpdate::Replace => self.policy.replace_exclusions(words),
        }
        let policy = &self.policy;
        let removed = session.remove_where(|entity| policy.is_excluded(&entity.text));
        if removed > 0 {
            debug!(removed, "entities dropped by exclusion update");
        }
        removed
    }
}

fn merge_origins(entity: &mut CanonicalEntity, origins: &[String]) {
    for origin in origins {
        if !entity.origins.contains(origin) {
            entity.origins.push(origin.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategyKind;
    use crate::core::label::EntityLabel;
    use pretty_assertions::assert_eq;

    fn span(text: &str, label: EntityLabel, confidence: Option<f32>, origin: &str) -> DetectedSpan {
        DetectedSpan {
            text: text.to_string(),
            label,
            start: 0,
            end: text.chars().count(),
            confidence,
            origin: origin.to_string(),
        }
    }

    fn setup() -> (Consolidator, Session, ReplacementAssigner) {
        (
            Consolidator::from_config(&RedactConfig::default()),
            Session::new(),
            ReplacementAssigner::new(StrategyKind::Counter, None),
        )
    }

    #[test]
    fn candidates_are_longest_first_and_deduplicated() {
        let (consolidator, _, _) = setup();
        let entities = consolidator.candidates(vec![
            span("Turku", EntityLabel::Location, Some(0.9), "a"),
            span("Matti Meikäläinen", EntityLabel::Person, Some(0.9), "a"),
            span("Turku ", EntityLabel::Location, Some(0.8), "b"),
        ]);
        let texts: Vec<&str> = entities.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Matti Meikäläinen", "Turku"]);
        assert_eq!(entities[1].origins, vec!["a", "b"]);
        assert_eq!(entities[1].confidence, Some(0.9));
    }

    #[test]
    fn low_confidence_duplicate_does_not_block_admission() {
        let (consolidator, mut session, mut assigner) = setup();
        let report = consolidator.fold(
            &mut session,
            &mut assigner,
            vec![
                span("Helsinki", EntityLabel::Location, Some(0.9), "a"),
                span("Helsinki", EntityLabel::Location, Some(0.4), "b"),
            ],
        );
        assert_eq!(session.len(), 1);
        assert_eq!(report.added, 1);
        assert_eq!(report.rejected, 1);
        let entity = session.entities().next().unwrap();
        assert_eq!(entity.origins, vec!["a"]);
    }

    #[test]
    fn folding_twice_is_idempotent() {
        let (consolidator, mut session, mut assigner) = setup();
        let spans = vec![
            span("Liisa Laine", EntityLabel::Person, Some(0.9), "a"),
            span("Kesko Oyj", EntityLabel::Organization, None, "b"),
        ];
        consolidator.fold(&mut session, &mut assigner, spans.clone());
        let first: Vec<CanonicalEntity> = session.entities().cloned().collect();
        let report = consolidator.fold(&mut session, &mut assigner, spans);
        let second: Vec<CanonicalEntity> = session.entities().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(report.already_known, 2);
        assert_eq!(report.added, 0);
    }

    #[test]
    fn issued_replacement_is_not_redetected() {
        let (consolidator, mut session, mut assigner) = setup();
        consolidator.fold(
            &mut session,
            &mut assigner,
            vec![span("Helsinki", EntityLabel::Location, None, "a")],
        );
        let report = consolidator.fold(
            &mut session,
            &mut assigner,
            vec![span("sijainti_1", EntityLabel::Location, None, "a")],
        );
        assert_eq!(report.already_redacted, 1);
        assert_eq!(report.added, 0);
        assert_eq!(session.replacement_pairs(), vec![("Helsinki", "sijainti_1")]);
    }

    #[test]
    fn new_originals_are_reserved_before_assignment() {
        let (consolidator, mut session, mut assigner) = setup();
        consolidator.fold(
            &mut session,
            &mut assigner,
            vec![
                span("Matti Meikäläinen", EntityLabel::Person, None, "a"),
                span("henkilö_1", EntityLabel::Person, None, "a"),
            ],
        );
        assert_eq!(
            session.replacement_pairs(),
            vec![("Matti Meikäläinen", "henkilö_2"), ("henkilö_1", "henkilö_3")]
        );
    }

    #[test]
    fn unsupported_label_is_skipped_not_fatal() {
        let config = RedactConfig {
            redact_labels: vec![EntityLabel::Nrp, EntityLabel::Person],
            ..RedactConfig::default()
        };
        let consolidator = Consolidator::from_config(&config);
        let mut session = Session::new();
        let mut assigner = ReplacementAssigner::new(StrategyKind::Synthetic, Some(1));
        let report = consolidator.fold(
            &mut session,
            &mut assigner,
            vec![
                span("suomalaiset", EntityLabel::Nrp, Some(0.9), "a"),
                span("Aino Aalto", EntityLabel::Person, Some(0.9), "a"),
            ],
        );
        assert_eq!(report.unassignable, 1);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn exclusion_update_removes_committed_entities() {
        let (mut consolidator, mut session, mut assigner) = setup();
        consolidator.fold(
            &mut session,
            &mut assigner,
            vec![
                span("Kansaneläkelaitos", EntityLabel::Organization, None, "a"),
                span("Tampere", EntityLabel::Location, None, "a"),
            ],
        );
        let removed = consolidator.update_exclusions(
            &mut session,
            &["kansaneläkelaitos"],
            ExclusionUpdate::Add,
        );
        assert_eq!(removed, 1);
        assert_eq!(session.len(), 1);

        consolidator.update_exclusions(&mut session, &["Tampere"], ExclusionUpdate::Replace);
        assert!(session.is_empty());
        assert!(!consolidator.policy().is_excluded("Kansaneläkelaitos"));
    }
}
