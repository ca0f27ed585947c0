use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::core::geometry::{BBox, Orientation, PageSize};
use crate::core::model::{ContentItem, Document, Page, TextRun};
use crate::error::{PseudoError, Result};

/// Documents with less extractable text than this need OCR first.
pub const MIN_TEXT_CHARS: usize = 10;

const TXT_FONT: &str = "Helvetica";
const TXT_FONT_SIZE: f32 = 11.0;
const TXT_LINE_HEIGHT: f32 = 14.0;
const TXT_MARGIN: f32 = 56.7;

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub document: Document,
    pub needs_ocr: bool,
}

impl LoadedDocument {
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }
}

/// Reads a `.json` layout or a `.txt` file into a [`Document`].
///
/// Run texts are NFC-composed so detection and substitution see the same
/// code points.
pub fn read_document(path: &Path) -> Result<LoadedDocument> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mut document = match extension.as_str() {
        "json" => read_layout(path)?,
        "txt" => read_plain_text(path)?,
        _ => {
            return Err(PseudoError::UnsupportedDocument {
                path: path.to_path_buf(),
                extension,
            })
        }
    };

    for run in document.text_runs_mut() {
        run.text = run.text.nfc().collect();
    }

    let text_chars = document.plain_text().trim().chars().count();
    let needs_ocr = text_chars < MIN_TEXT_CHARS;
    debug!(
        path = %path.display(),
        pages = document.pages.len(),
        text_chars,
        needs_ocr,
        "document loaded"
    );

    Ok(LoadedDocument {
        path: path.to_path_buf(),
        document,
        needs_ocr,
    })
}

fn read_layout(path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| PseudoError::UnreadableDocument {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}

fn read_plain_text(path: &Path) -> Result<Document> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(layout_lines(text.lines()))
}

/// Lays lines out top to bottom on A4 pages, one run per non-empty line.
pub fn layout_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Document {
    let size = PageSize::a4(Orientation::Portrait);
    let lines_per_page = ((size.height - 2.0 * TXT_MARGIN) / TXT_LINE_HEIGHT).floor() as usize;

    let mut pages = vec![Page::new(0, Some(size))];
    let mut row = 0;
    for line in lines {
        if row == lines_per_page {
            pages.push(Page::new(pages.len(), Some(size)));
            row = 0;
        }
        let trimmed = line.trim_end();
        if !trimmed.is_empty() {
            let y0 = TXT_MARGIN + row as f32 * TXT_LINE_HEIGHT;
            let width = trimmed.chars().count() as f32 * TXT_FONT_SIZE * 0.5;
            if let Some(page) = pages.last_mut() {
                page.content.push(ContentItem::Text(TextRun {
                    text: trimmed.to_string(),
                    font: TXT_FONT.to_string(),
                    size: TXT_FONT_SIZE,
                    bbox: BBox::new(TXT_MARGIN, y0, TXT_MARGIN + width, y0 + TXT_FONT_SIZE),
                }));
            }
        }
        row += 1;
    }
    Document { pages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_json_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "sopimus.json",
            r#"{"pages":[{"index":0,"size":[842,595],"orientation":"landscape","content":[
                {"type":"text","text":"Matti Meikäläinen allekirjoitti","font":"Arial","size":10,"bbox":[10,20,200,30]}
            ]}]}"#,
        );
        let loaded = read_document(&path).unwrap();
        assert!(!loaded.needs_ocr);
        assert_eq!(loaded.stem(), "sopimus");
        assert_eq!(loaded.document.pages[0].orientation, Orientation::Landscape);
        assert_eq!(
            loaded.document.plain_text(),
            "Matti Meikäläinen allekirjoitti"
        );
    }

    #[test]
    fn text_files_become_line_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "muistio.txt", "Hei Liisa\n\nTerveisin Matti\n");
        let loaded = read_document(&path).unwrap();
        let runs: Vec<&TextRun> = loaded.document.text_runs().collect();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].text, "Terveisin Matti");
        assert!(runs[1].bbox.y0 > runs[0].bbox.y0);
    }

    #[test]
    fn long_text_paginates() {
        let text = "rivi\n".repeat(120);
        let doc = layout_lines(text.lines());
        assert!(doc.pages.len() >= 2);
        assert_eq!(doc.pages[1].index, 1);
        assert_eq!(doc.text_runs().count(), 120);
    }

    #[test]
    fn short_documents_need_ocr() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "skannaus.txt", "  x \n");
        assert!(read_document(&path).unwrap().needs_ocr);
    }

    #[test]
    fn decomposed_text_is_composed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "nfd.txt", "Ha\u{0308}meenlinna on kaupunki");
        let loaded = read_document(&path).unwrap();
        assert!(loaded.document.plain_text().starts_with("Hämeenlinna"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = read_document(Path::new("kuva.png")).unwrap_err();
        assert!(matches!(err, PseudoError::UnsupportedDocument { .. }));
    }

    #[test]
    fn malformed_layout_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "rikki.json", "{\"pages\": [");
        let err = read_document(&path).unwrap_err();
        assert!(matches!(err, PseudoError::UnreadableDocument { .. }));
    }
}
