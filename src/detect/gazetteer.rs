use std::collections::HashMap;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::core::label::EntityLabel;
use crate::core::model::DetectedSpan;
use crate::detect::{char_offset, Detector};
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct GazetteerRow {
    word: String,
    entity_type: EntityLabel,
}

/// Dictionary recognizer over known surface forms.
///
/// Matching is case-insensitive on word boundaries; the reported span keeps
/// the casing found in the chunk. No confidence is produced.
#[derive(Debug, Clone)]
pub struct GazetteerDetector {
    entries: HashMap<String, EntityLabel>,
    regex: Option<Regex>,
}

impl GazetteerDetector {
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, EntityLabel)>,
        S: AsRef<str>,
    {
        let entries: HashMap<String, EntityLabel> = entries
            .into_iter()
            .map(|(word, label)| (word.as_ref().trim().to_lowercase(), label))
            .filter(|(word, _)| !word.is_empty())
            .collect();

        let mut words: Vec<&String> = entries.keys().collect();
        words.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));

        let regex = if words.is_empty() {
            None
        } else {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            Some(
                RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
                    .case_insensitive(true)
                    .build()?,
            )
        };

        Ok(Self { entries, regex })
    }

    /// Loads `word,entity_type` rows.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            let row: GazetteerRow = row?;
            rows.push((row.word, row.entity_type));
        }
        Self::new(rows)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Detector for GazetteerDetector {
    fn name(&self) -> &str {
        "gazetteer"
    }

    fn detect(&self, chunk: &str, labels: &[EntityLabel]) -> Vec<DetectedSpan> {
        let Some(regex) = &self.regex else {
            return Vec::new();
        };
        regex
            .find_iter(chunk)
            .filter_map(|mat| {
                let label = *self.entries.get(&mat.as_str().to_lowercase())?;
                if !labels.contains(&label) {
                    return None;
                }
                let start = char_offset(chunk, mat.start());
                Some(DetectedSpan {
                    text: mat.as_str().to_string(),
                    label,
                    start,
                    end: start + mat.as_str().chars().count(),
                    confidence: None,
                    origin: self.name().to_string(),
                })
            })
            .collect()
    }
}
