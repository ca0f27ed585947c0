use regex::Regex;

use crate::core::label::EntityLabel;
use crate::core::model::DetectedSpan;
use crate::detect::{char_offset, Detector};
use crate::error::Result;

const EMAIL_PATTERN: &str = r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b";

// Finnish mobile and landline numbers, domestic or +358.
const PHONE_PATTERN: &str = r"(?:\+358[\s-]?|\b0)\d{1,3}[\s-]?\d{3,4}[\s-]?\d{3,4}\b";

const URL_PATTERN: &str = r#"(?i)\b(?:https?://|www\.)[^\s<>"']+"#;

#[derive(Debug, Clone)]
struct PatternRule {
    label: EntityLabel,
    regex: Regex,
    score: f32,
}

/// Rule-based recognizer for structured identifiers.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    rules: Vec<PatternRule>,
}

impl PatternDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rules: vec![
                PatternRule {
                    label: EntityLabel::EmailAddress,
                    regex: Regex::new(EMAIL_PATTERN)?,
                    score: 1.0,
                },
                PatternRule {
                    label: EntityLabel::PhoneNumber,
                    regex: Regex::new(PHONE_PATTERN)?,
                    score: 0.75,
                },
                PatternRule {
                    label: EntityLabel::Url,
                    regex: Regex::new(URL_PATTERN)?,
                    score: 0.6,
                },
            ],
        })
    }

    /// Adds a custom rule after the built-in ones.
    pub fn with_rule(mut self, label: EntityLabel, pattern: &str, score: f32) -> Result<Self> {
        self.rules.push(PatternRule {
            label,
            regex: Regex::new(pattern)?,
            score,
        });
        Ok(self)
    }
}

impl Detector for PatternDetector {
    fn name(&self) -> &str {
        "pattern"
    }

    fn detect(&self, chunk: &str, labels: &[EntityLabel]) -> Vec<DetectedSpan> {
        let mut spans = Vec::new();
        for rule in self.rules.iter().filter(|r| labels.contains(&r.label)) {
            for mat in rule.regex.find_iter(chunk) {
                let mut text = mat.as_str();
                if rule.label == EntityLabel::Url {
                    text = text.trim_end_matches(['.', ',', ';', ':', ')', '!', '?']);
                }
                if text.is_empty() {
                    continue;
                }
                let start = char_offset(chunk, mat.start());
                spans.push(DetectedSpan {
                    text: text.to_string(),
                    label: rule.label,
                    start,
                    end: start + text.chars().count(),
                    confidence: Some(rule.score),
                    origin: self.name().to_string(),
                });
            }
        }
        spans.sort_by_key(|s| (s.start, s.end));
        spans
    }
}
