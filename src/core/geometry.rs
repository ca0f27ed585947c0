use serde::{Deserialize, Serialize};

/// A4 in PDF points.
pub const A4_WIDTH: f32 = 595.2756;
pub const A4_HEIGHT: f32 = 841.8898;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }

    /// Finite coordinates with a non-inverted extent.
    pub fn is_well_formed(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.x1 >= self.x0
            && self.y1 >= self.y0
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn of(width: f32, height: f32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn a4(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Portrait => Self::new(A4_WIDTH, A4_HEIGHT),
            Orientation::Landscape => Self::new(A4_HEIGHT, A4_WIDTH),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Recorded size if usable, otherwise A4 in the recorded orientation.
    pub fn or_default(size: Option<PageSize>, orientation: Orientation) -> Self {
        match size {
            Some(size) if size.is_valid() => size,
            _ => Self::a4(orientation),
        }
    }
}

impl From<[f32; 2]> for PageSize {
    fn from(v: [f32; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<PageSize> for [f32; 2] {
    fn from(s: PageSize) -> Self {
        [s.width, s.height]
    }
}
