use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::consolidate::normalize::normalize_text;
use crate::consolidate::similarity::similarity;
use crate::core::model::EntityKey;
use crate::session::Session;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkReport {
    /// Groups of two or more entities that share a replacement.
    pub clusters: usize,
    /// Entities whose replacement changed in this pass.
    pub relinked: usize,
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    // The smaller index becomes the root, so roots are earliest-committed.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[child] = root;
        }
    }
}

/// Gives near-duplicate entities of the same label one shared replacement.
///
/// Pairs scoring at least `threshold` are joined transitively; each group
/// adopts the replacement of its earliest-committed member. Aliases record
/// the score and text of their best match.
pub fn link_similar(session: &mut Session, threshold: f32) -> LinkReport {
    let snapshot: Vec<(EntityKey, String, Option<String>)> = session
        .entities()
        .map(|e| (e.key(), normalize_text(&e.text), e.replacement.clone()))
        .collect();

    let mut sets = DisjointSet::new(snapshot.len());
    let mut best: Vec<Option<(f32, usize)>> = vec![None; snapshot.len()];

    for i in 0..snapshot.len() {
        for j in (i + 1)..snapshot.len() {
            if snapshot[i].0.label != snapshot[j].0.label {
                continue;
            }
            let score = similarity(&snapshot[i].1, &snapshot[j].1);
            if score < threshold {
                continue;
            }
            sets.union(i, j);
            for (me, other) in [(i, j), (j, i)] {
                if best[me].map_or(true, |(s, _)| score > s) {
                    best[me] = Some((score, other));
                }
            }
        }
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..snapshot.len() {
        groups.entry(sets.find(i)).or_default().push(i);
    }

    let mut report = LinkReport::default();
    for (root, members) in groups.into_iter().filter(|(_, m)| m.len() > 1) {
        report.clusters += 1;
        let Some(shared) = snapshot[root].2.clone() else {
            continue;
        };
        for &member in members.iter().filter(|&&m| m != root) {
            let Some((score, with)) = best[member] else {
                continue;
            };
            let Some(entity) = session.get_mut(&snapshot[member].0) else {
                continue;
            };
            if entity.replacement.as_deref() != Some(shared.as_str()) {
                report.relinked += 1;
                debug!(entity = %entity.uid(), replacement = %shared, score, "linked similar entity");
            }
            entity.replacement = Some(shared.clone());
            entity.similarity_score = Some(score);
            entity.similarity_with = Some(snapshot[with].0.text.clone());
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::label::EntityLabel;
    use crate::core::model::CanonicalEntity;
    use pretty_assertions::assert_eq;

    fn commit(session: &mut Session, text: &str, label: EntityLabel, replacement: &str) {
        session.commit(CanonicalEntity {
            text: text.to_string(),
            label,
            confidence: Some(0.9),
            origins: vec!["test".to_string()],
            replacement: Some(replacement.to_string()),
            similarity_score: None,
            similarity_with: None,
        });
    }

    fn replacement(session: &Session, text: &str, label: EntityLabel) -> String {
        session
            .get(&EntityKey::new(text, label))
            .and_then(|e| e.replacement.clone())
            .unwrap()
    }

    #[test]
    fn spacing_variants_share_the_first_replacement() {
        let mut session = Session::new();
        commit(&mut session, "ACME Oy", EntityLabel::Organization, "^r1");
        commit(&mut session, "ACME  Oy", EntityLabel::Organization, "^r2");
        let report = link_similar(&mut session, 75.0);
        assert_eq!(report, LinkReport { clusters: 1, relinked: 1 });
        assert_eq!(replacement(&session, "ACME  Oy", EntityLabel::Organization), "^r1");
        let alias = session
            .get(&EntityKey::new("ACME  Oy", EntityLabel::Organization))
            .unwrap();
        assert_eq!(alias.similarity_score, Some(100.0));
        assert_eq!(alias.similarity_with.as_deref(), Some("ACME Oy"));
        assert!(!session
            .get(&EntityKey::new("ACME Oy", EntityLabel::Organization))
            .unwrap()
            .is_linked());
    }

    #[test]
    fn never_links_across_labels() {
        let mut session = Session::new();
        commit(&mut session, "Nokia", EntityLabel::Location, "^r1");
        commit(&mut session, "Nokia Oyj", EntityLabel::Organization, "^r2");
        let report = link_similar(&mut session, 50.0);
        assert_eq!(report.clusters, 0);
        assert_eq!(replacement(&session, "Nokia Oyj", EntityLabel::Organization), "^r2");
    }

    #[test]
    fn chains_are_transitive() {
        let mut session = Session::new();
        commit(&mut session, "Meikäläinen", EntityLabel::Person, "^a");
        commit(&mut session, "Kalle Pekkanen", EntityLabel::Person, "^b");
        commit(&mut session, "Meikälainen", EntityLabel::Person, "^c");
        commit(&mut session, "Meikalainen", EntityLabel::Person, "^d");
        link_similar(&mut session, 90.0);
        assert_eq!(replacement(&session, "Meikälainen", EntityLabel::Person), "^a");
        assert_eq!(replacement(&session, "Meikalainen", EntityLabel::Person), "^a");
        assert_eq!(replacement(&session, "Kalle Pekkanen", EntityLabel::Person), "^b");
    }

    #[test]
    fn second_pass_changes_nothing() {
        let mut session = Session::new();
        commit(&mut session, "ACME Oy", EntityLabel::Organization, "^r1");
        commit(&mut session, "ACME-Oy", EntityLabel::Organization, "^r2");
        link_similar(&mut session, 75.0);
        let again = link_similar(&mut session, 75.0);
        assert_eq!(again.relinked, 0);
        assert_eq!(again.clusters, 1);
    }
}
