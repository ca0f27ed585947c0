pub mod canvas;
pub mod pdf;
pub mod substitute;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::geometry::PageSize;
use crate::core::model::{ContentItem, Document, ImageItem, TextRun};
use crate::error::Result;

pub use canvas::Canvas;
pub use pdf::PdfCanvas;
pub use substitute::{AppliedReplacement, Substitution};

pub const OUTPUT_PREFIX: &str = "auto_anom_";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageWarning {
    pub page: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconstructionReport {
    pub output: PathBuf,
    pub pages: usize,
    pub runs_drawn: usize,
    pub images_drawn: usize,
    pub applied: Vec<AppliedReplacement>,
    pub warnings: Vec<PageWarning>,
}

#[derive(Debug, Clone)]
pub struct RedactedDocument {
    pub document: Document,
    pub report: ReconstructionReport,
}

/// `auto_anom_<stem>.pdf` inside `output_dir`, whatever the input extension.
pub fn output_path(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir.join(format!("{OUTPUT_PREFIX}{stem}.pdf"))
}

/// Rewrites a document's text and re-emits it page by page.
#[derive(Debug, Clone)]
pub struct Reconstructor {
    output_dir: PathBuf,
}

impl Reconstructor {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn reconstruct(
        &self,
        document: &Document,
        stem: &str,
        substitution: &Substitution,
    ) -> Result<RedactedDocument> {
        let mut redacted = document.clone();
        let applied = substitution.apply_document(&mut redacted);

        let output = output_path(&self.output_dir, stem);
        let mut canvas = PdfCanvas::new();
        let mut report = render(&redacted, &mut canvas)?;
        canvas.save(&output)?;

        report.output = output;
        report.applied = applied;
        debug!(
            output = %report.output.display(),
            pages = report.pages,
            warnings = report.warnings.len(),
            "document reconstructed"
        );
        Ok(RedactedDocument {
            document: redacted,
            report,
        })
    }
}

/// Draws every page of `document` onto `canvas`.
///
/// Malformed runs and undecodable images are skipped with a page warning.
pub fn render<C: Canvas>(document: &Document, canvas: &mut C) -> Result<ReconstructionReport> {
    let mut report = ReconstructionReport::default();
    for page in &document.pages {
        let size = PageSize::or_default(page.size, page.orientation);
        canvas.begin_page(size);
        for item in &page.content {
            let outcome = match item {
                ContentItem::Text(run) => draw_run(canvas, run, size).map(|drawn| {
                    if drawn {
                        report.runs_drawn += 1;
                    }
                }),
                ContentItem::Image(image) => draw_image(canvas, image, size).map(|()| {
                    report.images_drawn += 1;
                }),
            };
            if let Err(message) = outcome {
                warn!(page = page.index, %message, "skipping page item");
                report.warnings.push(PageWarning {
                    page: page.index,
                    message,
                });
            }
        }
        canvas.end_page()?;
        report.pages += 1;
    }
    Ok(report)
}

fn draw_run<C: Canvas>(
    canvas: &mut C,
    run: &TextRun,
    page: PageSize,
) -> std::result::Result<bool, String> {
    if run.text.trim().is_empty() {
        return Ok(false);
    }
    if !run.bbox.is_well_formed() {
        return Err(format!("text run has malformed geometry: {:?}", run.bbox));
    }
    if !run.size.is_finite() || run.size <= 0.0 {
        return Err(format!("text run has invalid font size {}", run.size));
    }
    canvas.draw_text(&run.text, run.bbox.x0, page.height - run.bbox.y1, run.size);
    Ok(true)
}

fn draw_image<C: Canvas>(
    canvas: &mut C,
    item: &ImageItem,
    page: PageSize,
) -> std::result::Result<(), String> {
    if !item.bbox.is_well_formed() {
        return Err(format!("image has malformed geometry: {:?}", item.bbox));
    }
    let decoded = image::load_from_memory(&item.data)
        .map_err(|err| format!("image could not be decoded: {err}"))?
        .to_rgb8();
    canvas.draw_image(
        &decoded,
        item.bbox.x0,
        page.height - item.bbox.y1,
        item.bbox.width(),
        item.bbox.height(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{BBox, Orientation, A4_HEIGHT, A4_WIDTH};
    use crate::core::model::Page;
    use image::RgbImage;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        pages: Vec<PageSize>,
        texts: Vec<(String, f32, f32, f32)>,
        images: Vec<(u32, f32, f32, f32, f32)>,
    }

    impl Canvas for Recorder {
        fn begin_page(&mut self, size: PageSize) {
            self.pages.push(size);
        }

        fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: f32) {
            self.texts.push((text.to_string(), x, y, font_size));
        }

        fn draw_image(&mut self, image: &RgbImage, x: f32, y: f32, width: f32, height: f32) {
            self.images.push((image.width(), x, y, width, height));
        }

        fn end_page(&mut self) -> Result<()> {
            Ok(())
        }

        fn save(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn text(text: &str, bbox: BBox, size: f32) -> ContentItem {
        ContentItem::Text(TextRun {
            text: text.to_string(),
            font: "Arial".to_string(),
            size,
            bbox,
        })
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(RgbImage::new(3, 2))
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn text_is_drawn_from_page_top() {
        let mut page = Page::new(0, Some(PageSize::new(600.0, 800.0)));
        page.content.push(text("Hei", BBox::new(50.0, 100.0, 80.0, 112.0), 12.0));
        let mut canvas = Recorder::default();
        let report = render(&Document { pages: vec![page] }, &mut canvas).unwrap();
        assert_eq!(canvas.texts, vec![("Hei".to_string(), 50.0, 688.0, 12.0)]);
        assert_eq!(report.runs_drawn, 1);
    }

    #[test]
    fn missing_size_falls_back_to_a4_by_orientation() {
        let mut landscape = Page::new(1, None);
        landscape.orientation = Orientation::Landscape;
        let doc = Document {
            pages: vec![Page::new(0, None), landscape],
        };
        let mut canvas = Recorder::default();
        render(&doc, &mut canvas).unwrap();
        assert_eq!(
            canvas.pages,
            vec![
                PageSize::new(A4_WIDTH, A4_HEIGHT),
                PageSize::new(A4_HEIGHT, A4_WIDTH)
            ]
        );
    }

    #[test]
    fn bad_items_become_page_warnings() {
        let mut page = Page::new(0, None);
        page.content = vec![
            text("rikki", BBox::new(10.0, 20.0, 5.0, 30.0), 10.0),
            text("nolla", BBox::new(0.0, 0.0, 5.0, 5.0), 0.0),
            ContentItem::Image(ImageItem {
                bbox: BBox::new(0.0, 0.0, 10.0, 10.0),
                data: vec![0, 1, 2, 3],
                extension: Some("png".to_string()),
            }),
            ContentItem::Image(ImageItem {
                bbox: BBox::new(10.0, 10.0, 40.0, 30.0),
                data: png_bytes(),
                extension: Some("png".to_string()),
            }),
            text("ehjä", BBox::new(0.0, 0.0, 5.0, 5.0), 9.0),
        ];
        let mut canvas = Recorder::default();
        let report = render(&Document { pages: vec![page] }, &mut canvas).unwrap();
        assert_eq!(report.warnings.len(), 3);
        assert!(report.warnings.iter().all(|w| w.page == 0));
        assert_eq!(report.runs_drawn, 1);
        assert_eq!(report.images_drawn, 1);
        assert_eq!(canvas.images, vec![(3, 10.0, A4_HEIGHT - 30.0, 30.0, 20.0)]);
    }

    #[test]
    fn reconstruct_writes_prefixed_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let mut page = Page::new(0, None);
        page.content.push(text(
            "Matti Meikäläinen allekirjoitti sopimuksen.",
            BBox::new(56.0, 60.0, 300.0, 71.0),
            11.0,
        ));
        let doc = Document { pages: vec![page] };
        let substitution =
            Substitution::new([("Matti Meikäläinen", "^antti virtanen")]).unwrap();

        let redacted = Reconstructor::new(dir.path().to_path_buf())
            .reconstruct(&doc, "sopimus", &substitution)
            .unwrap();

        assert_eq!(redacted.report.output, dir.path().join("auto_anom_sopimus.pdf"));
        assert!(redacted.report.output.exists());
        assert_eq!(
            redacted.document.plain_text(),
            "^antti virtanen allekirjoitti sopimuksen."
        );
        assert_eq!(redacted.report.applied.len(), 1);
    }
}
