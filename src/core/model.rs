use serde::{Deserialize, Serialize};

use crate::core::geometry::{BBox, Orientation, PageSize};
use crate::core::label::EntityLabel;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<PageSize>,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text(TextRun),
    Image(ImageItem),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextRun {
    pub text: String,
    #[serde(default)]
    pub font: String,
    pub size: f32,
    pub bbox: BBox,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageItem {
    pub bbox: BBox,
    #[serde(default)]
    pub data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

impl Page {
    pub fn new(index: usize, size: Option<PageSize>) -> Self {
        let orientation = size
            .map(|s| Orientation::of(s.width, s.height))
            .unwrap_or_default();
        Self {
            index,
            size,
            orientation,
            content: Vec::new(),
        }
    }

    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.content.iter().filter_map(|item| match item {
            ContentItem::Text(run) => Some(run),
            ContentItem::Image(_) => None,
        })
    }
}

impl Document {
    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.pages.iter().flat_map(|page| page.text_runs())
    }

    pub fn text_runs_mut(&mut self) -> impl Iterator<Item = &mut TextRun> {
        self.pages
            .iter_mut()
            .flat_map(|page| page.content.iter_mut())
            .filter_map(|item| match item {
                ContentItem::Text(run) => Some(run),
                ContentItem::Image(_) => None,
            })
    }

    /// Character count of all text runs, untrimmed.
    pub fn text_len(&self) -> usize {
        self.text_runs().map(|run| run.text.chars().count()).sum()
    }

    /// Trimmed run texts joined by newlines, in reading order.
    ///
    /// A vertical gap wider than a line between consecutive runs of a page
    /// becomes a blank line, so paragraphs survive.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        let mut first = true;
        for page in &self.pages {
            let mut prev: Option<&TextRun> = None;
            for run in page.text_runs() {
                if !first {
                    out.push('\n');
                }
                first = false;
                if prev.is_some_and(|p| starts_paragraph(p, run)) {
                    out.push('\n');
                }
                out.push_str(run.text.trim());
                prev = Some(run);
            }
        }
        out
    }
}

fn starts_paragraph(prev: &TextRun, next: &TextRun) -> bool {
    if !prev.bbox.is_well_formed() || !next.bbox.is_well_formed() {
        return false;
    }
    next.bbox.y0 - prev.bbox.y1 > prev.size
}

/// One labeled span reported by a detector for a text chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedSpan {
    pub text: String,
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
    pub confidence: Option<f32>,
    pub origin: String,
}

impl DetectedSpan {
    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.text, self.label)
    }
}

/// Identity of a canonical entity: trimmed surface text plus label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub text: String,
    pub label: EntityLabel,
}

impl EntityKey {
    pub fn new(text: &str, label: EntityLabel) -> Self {
        Self {
            text: text.trim().to_string(),
            label,
        }
    }

    pub fn uid(&self) -> String {
        format!("{}{}", self.text, self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    pub text: String,
    pub label: EntityLabel,
    pub confidence: Option<f32>,
    pub origins: Vec<String>,
    pub replacement: Option<String>,
    #[serde(default)]
    pub similarity_score: Option<f32>,
    #[serde(default)]
    pub similarity_with: Option<String>,
}

impl CanonicalEntity {
    pub fn from_span(span: &DetectedSpan) -> Self {
        Self {
            text: span.text.trim().to_string(),
            label: span.label,
            confidence: span.confidence,
            origins: vec![span.origin.clone()],
            replacement: None,
            similarity_score: None,
            similarity_with: None,
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::new(&self.text, self.label)
    }

    pub fn uid(&self) -> String {
        self.key().uid()
    }

    /// True when the replacement was copied from another entity by linking.
    pub fn is_linked(&self) -> bool {
        self.similarity_with.is_some()
    }
}
