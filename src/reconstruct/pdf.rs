use std::path::Path;

use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::core::geometry::PageSize;
use crate::error::Result;
use crate::reconstruct::canvas::Canvas;

const FONT_NAME: &str = "F1";

struct OpenPage {
    size: PageSize,
    operations: Vec<Operation>,
    xobjects: Dictionary,
}

/// Writes pages into a fresh PDF with the Helvetica base font.
pub struct PdfCanvas {
    doc: Document,
    pages_id: ObjectId,
    font_id: ObjectId,
    kids: Vec<Object>,
    current: Option<OpenPage>,
    image_seq: usize,
}

impl Default for PdfCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfCanvas {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        Self {
            doc,
            pages_id,
            font_id,
            kids: Vec::new(),
            current: None,
            image_seq: 0,
        }
    }
}

/// WinAnsi bytes for `text`; characters outside the encoding become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            'Š' => 0x8A,
            'š' => 0x9A,
            'Ž' => 0x8E,
            'ž' => 0x9E,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

impl Canvas for PdfCanvas {
    fn begin_page(&mut self, size: PageSize) {
        self.current = Some(OpenPage {
            size,
            operations: Vec::new(),
            xobjects: Dictionary::new(),
        });
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: f32) {
        let Some(page) = self.current.as_mut() else {
            return;
        };
        page.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![FONT_NAME.into(), font_size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn draw_image(&mut self, image: &RgbImage, x: f32, y: f32, width: f32, height: f32) {
        if self.current.is_none() {
            return;
        }
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width() as i64,
                "Height" => image.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            image.as_raw().clone(),
        );
        let image_id = self.doc.add_object(stream);
        self.image_seq += 1;
        let name = format!("Im{}", self.image_seq);

        if let Some(page) = self.current.as_mut() {
            page.xobjects.set(name.as_bytes().to_vec(), image_id);
            page.operations.extend([
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![width.into(), 0.into(), 0.into(), height.into(), x.into(), y.into()],
                ),
                Operation::new("Do", vec![Object::Name(name.into_bytes())]),
                Operation::new("Q", vec![]),
            ]);
        }
    }

    fn end_page(&mut self) -> Result<()> {
        let Some(page) = self.current.take() else {
            return Ok(());
        };
        let content = Content {
            operations: page.operations,
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let mut resources = dictionary! {
            "Font" => dictionary! { FONT_NAME => self.font_id },
        };
        if !page.xobjects.is_empty() {
            resources.set("XObject", page.xobjects);
        }

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), page.size.width.into(), page.size.height.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        self.end_page()?;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids.clone(),
            "Count" => self.kids.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();
        self.doc.save(path)?;
        Ok(())
    }
}
