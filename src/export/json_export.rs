use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::Document;
use crate::export::Exporter;
use crate::reconstruct::OUTPUT_PREFIX;

/// Writes the redacted layout as `auto_anom_<stem>.json`.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl Exporter for JsonExporter {
    fn export(&self, stem: &str, document: &Document) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!("{OUTPUT_PREFIX}{stem}.json"));
        let data = serde_json::to_string_pretty(document)?;
        fs::write(&path, data)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{BBox, PageSize};
    use crate::core::model::{ContentItem, Page, TextRun};
    use pretty_assertions::assert_eq;

    #[test]
    fn layout_survives_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut page = Page::new(0, Some(PageSize::new(595.0, 842.0)));
        page.content.push(ContentItem::Text(TextRun {
            text: "^aino aalto".to_string(),
            font: "Helvetica".to_string(),
            size: 11.0,
            bbox: BBox::new(1.0, 2.0, 3.0, 4.0),
        }));
        let document = Document { pages: vec![page] };

        let path = JsonExporter::new(dir.path().to_path_buf())
            .export("kirje", &document)
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "auto_anom_kirje.json");
        let back: Document = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, document);
    }
}
