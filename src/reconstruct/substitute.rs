use std::collections::{BTreeMap, HashMap};

use regex::{Captures, Regex};
use serde::Serialize;
use tracing::debug;

use crate::core::model::Document;
use crate::error::Result;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedReplacement {
    pub original: String,
    pub replacement: String,
    pub count: usize,
}

/// Single-pass replacement of entity surface texts.
///
/// All originals go into one alternation, longest first, so a longer entity
/// always wins over an entity it contains.
#[derive(Debug, Clone)]
pub struct Substitution {
    regex: Option<Regex>,
    table: HashMap<String, String>,
}

impl Substitution {
    pub fn new<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut table: HashMap<String, String> = HashMap::new();
        for (original, replacement) in pairs {
            if original.is_empty() {
                continue;
            }
            if let Some(previous) = table.insert(original.to_string(), replacement.to_string()) {
                if previous != replacement {
                    debug!(%original, %previous, %replacement, "surface text shared by several entities, last replacement wins");
                }
            }
        }

        let mut originals: Vec<&String> = table.keys().collect();
        originals.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

        let regex = if originals.is_empty() {
            None
        } else {
            let alternation = originals
                .iter()
                .map(|o| regex::escape(o))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&alternation)?)
        };
        Ok(Self { regex, table })
    }

    pub fn from_session(session: &Session) -> Result<Self> {
        Self::new(session.replacement_pairs())
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn apply(&self, text: &str) -> String {
        self.apply_counting(text, &mut BTreeMap::new())
    }

    fn apply_counting(&self, text: &str, counts: &mut BTreeMap<String, usize>) -> String {
        let Some(regex) = &self.regex else {
            return text.to_string();
        };
        regex
            .replace_all(text, |caps: &Captures| {
                let original = &caps[0];
                *counts.entry(original.to_string()).or_insert(0) += 1;
                self.table
                    .get(original)
                    .cloned()
                    .unwrap_or_else(|| original.to_string())
            })
            .into_owned()
    }

    /// Rewrites every text run of `document` in place.
    pub fn apply_document(&self, document: &mut Document) -> Vec<AppliedReplacement> {
        let mut counts = BTreeMap::new();
        for run in document.text_runs_mut() {
            run.text = self.apply_counting(&run.text, &mut counts);
        }
        counts
            .into_iter()
            .filter_map(|(original, count)| {
                let replacement = self.table.get(&original)?.clone();
                Some(AppliedReplacement {
                    original,
                    replacement,
                    count,
                })
            })
            .collect()
    }
}

/// Replaces entity occurrences in `text`; a pure convenience over [`Substitution`].
pub fn substitute<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    text: &str,
) -> Result<String> {
    Ok(Substitution::new(pairs)?.apply(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;
    use crate::core::model::{ContentItem, Page, TextRun};
    use pretty_assertions::assert_eq;

    #[test]
    fn replaces_full_name_without_touching_parts() {
        let out = substitute(
            [("Matti Meikäläinen", "^antti virtanen"), ("Matti", "^pekka")],
            "Matti Meikäläinen allekirjoitti sopimuksen.",
        )
        .unwrap();
        assert_eq!(out, "^antti virtanen allekirjoitti sopimuksen.");
    }

    #[test]
    fn shorter_entity_still_replaced_on_its_own() {
        let out = substitute(
            [("Matti Meikäläinen", "^antti virtanen"), ("Matti", "^pekka")],
            "Matti soitti. Matti Meikäläinen ei.",
        )
        .unwrap();
        assert_eq!(out, "^pekka soitti. ^antti virtanen ei.");
    }

    #[test]
    fn shared_surface_text_keeps_last_replacement() {
        let substitution =
            Substitution::new([("Nokia", "^kemi"), ("Nokia", "^acme oy")]).unwrap();
        assert_eq!(substitution.len(), 1);
        assert_eq!(substitution.apply("Nokia kasvoi."), "^acme oy kasvoi.");
    }

    #[test]
    fn empty_set_leaves_text_untouched() {
        let substitution = Substitution::new(std::iter::empty()).unwrap();
        assert!(substitution.is_empty());
        assert_eq!(substitution.apply("a.b*c"), "a.b*c");
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let out = substitute([("www.acme.fi", "^r1")], "katso wwwXacmeXfi ja www.acme.fi").unwrap();
        assert_eq!(out, "katso wwwXacmeXfi ja ^r1");
    }

    #[test]
    fn reports_applied_pairs_per_document() {
        let run = |text: &str| {
            ContentItem::Text(TextRun {
                text: text.to_string(),
                font: String::new(),
                size: 10.0,
                bbox: BBox::new(0.0, 0.0, 1.0, 1.0),
            })
        };
        let mut page = Page::new(0, None);
        page.content = vec![run("Helsinki ja Turku"), run("Helsinki")];
        let mut doc = Document { pages: vec![page] };
        let substitution =
            Substitution::new([("Helsinki", "^espoo"), ("Tampere", "^pori")]).unwrap();

        let applied = substitution.apply_document(&mut doc);
        assert_eq!(
            applied,
            vec![AppliedReplacement {
                original: "Helsinki".to_string(),
                replacement: "^espoo".to_string(),
                count: 2,
            }]
        );
        assert_eq!(doc.plain_text(), "^espoo ja Turku\n^espoo");
    }
}
