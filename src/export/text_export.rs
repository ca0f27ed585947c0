use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::Document;
use crate::export::Exporter;
use crate::reconstruct::OUTPUT_PREFIX;

// UTF-8 read as Latin-1, as left behind by some extractors.
const MOJIBAKE: [(&str, &str); 6] = [
    ("Ã¤", "ä"),
    ("Ã¶", "ö"),
    ("Ã„", "Ä"),
    ("Ã–", "Ö"),
    ("Ã¥", "å"),
    ("Ã…", "Å"),
];

pub fn repair_mojibake(text: &str) -> String {
    MOJIBAKE
        .iter()
        .fold(text.to_string(), |acc, (broken, fixed)| acc.replace(broken, fixed))
}

/// Writes the redacted text as `auto_anom_<stem>.txt`, one page after another.
#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn format_document(document: &Document) -> String {
        let mut full_text = String::new();
        for page in &document.pages {
            for run in page.text_runs() {
                let text = run.text.trim();
                if !text.is_empty() {
                    full_text.push_str(&repair_mojibake(text));
                    full_text.push('\n');
                }
            }
            full_text.push('\n');
        }
        full_text
    }
}

impl Exporter for TextExporter {
    fn export(&self, stem: &str, document: &Document) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!("{OUTPUT_PREFIX}{stem}.txt"));
        fs::write(&path, Self::format_document(document))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;
    use crate::core::model::{ContentItem, Page, TextRun};
    use pretty_assertions::assert_eq;

    #[test]
    fn repairs_latin1_misreads() {
        assert_eq!(repair_mojibake("HÃ¤meenlinna ja Ã–lands"), "Hämeenlinna ja Ölands");
        assert_eq!(repair_mojibake("ennallaan"), "ennallaan");
    }

    #[test]
    fn pages_are_separated_by_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let page = |index: usize, text: &str| {
            let mut page = Page::new(index, None);
            page.content.push(ContentItem::Text(TextRun {
                text: text.to_string(),
                font: String::new(),
                size: 10.0,
                bbox: BBox::new(0.0, 0.0, 1.0, 1.0),
            }));
            page
        };
        let document = Document {
            pages: vec![page(0, "  ensimmäinen "), page(1, "toinen")],
        };
        let path = TextExporter::new(dir.path().to_path_buf())
            .export("muistio", &document)
            .unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "ensimmäinen\n\ntoinen\n\n");
    }
}
