pub mod bridge;
pub mod gazetteer;
pub mod pattern;

use tracing::debug;

use crate::config::DetectorConfig;
use crate::core::label::EntityLabel;
use crate::core::model::DetectedSpan;
use crate::error::Result;

pub use bridge::ModelBridge;
pub use gazetteer::GazetteerDetector;
pub use pattern::PatternDetector;

/// A recognizer producing labeled spans for one text chunk.
///
/// Implementations swallow their own failures and return an empty list so
/// that one broken detector never blocks the others.
pub trait Detector {
    fn name(&self) -> &str;

    fn detect(&self, chunk: &str, labels: &[EntityLabel]) -> Vec<DetectedSpan>;
}

#[derive(Default)]
pub struct DetectorSet {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, detector: impl Detector + 'static) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    pub fn from_config(config: &DetectorConfig) -> Result<Self> {
        let mut set = Self::new();
        if config.patterns {
            set = set.with(PatternDetector::new()?);
        }
        if let Some(path) = &config.gazetteer {
            set = set.with(GazetteerDetector::from_csv(path)?);
        }
        if let Some(model) = &config.model {
            set = set.with(ModelBridge::from_config(model));
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Concatenated output of every detector, in detector order.
    pub fn detect_all(&self, chunk: &str, labels: &[EntityLabel]) -> Vec<DetectedSpan> {
        let mut spans = Vec::new();
        for detector in &self.detectors {
            let found = detector.detect(chunk, labels);
            debug!(detector = detector.name(), count = found.len(), "detector finished");
            spans.extend(found);
        }
        spans
    }
}

/// Character offset of a byte index inside `text`.
pub(crate) fn char_offset(text: &str, byte_idx: usize) -> usize {
    text[..byte_idx].chars().count()
}

/// Substring by character offsets; `None` when out of range or empty.
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start >= end {
        return None;
    }
    let mut indices = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    let byte_start = indices.nth(start)?;
    let byte_end = indices.nth(end - start - 1)?;
    Some(&text[byte_start..byte_end])
}
