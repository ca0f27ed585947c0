use std::path::Path;

use image::RgbImage;

use crate::core::geometry::PageSize;
use crate::error::Result;

/// A page-oriented drawing surface in PDF user space (origin bottom-left).
pub trait Canvas {
    fn begin_page(&mut self, size: PageSize);

    fn draw_text(&mut self, text: &str, x: f32, y: f32, font_size: f32);

    fn draw_image(&mut self, image: &RgbImage, x: f32, y: f32, width: f32, height: f32);

    fn end_page(&mut self) -> Result<()>;

    fn save(&mut self, path: &Path) -> Result<()>;
}
