//! Page layout calculations
//!
//! All rectangles use PDF user space: points, origin at the bottom-left of the
//! page, y growing upward.

use serde::{Deserialize, Serialize};

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }

    /// Restrict the length to `[min, max]` millimeters; a NaN or infinite
    /// length becomes `fallback`
    pub fn clamp_mm(self, min: f64, max: f64, fallback: Length) -> Self {
        if self.0.is_finite() {
            Length(self.0.clamp(min, max))
        } else {
            fallback
        }
    }
}

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0),
            height: Length::from_mm(297.0),
        }
    }

    /// Swap width and height for landscape output
    pub fn oriented(self, orientation: Orientation) -> Self {
        match orientation {
            Orientation::Portrait => self,
            Orientation::Landscape => Self {
                width: self.height,
                height: self.width,
            },
        }
    }
}

/// Margins for page content
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Margins {
    /// Create margins with same value on all sides
    pub fn uniform(margin: Length) -> Self {
        Self {
            top: margin,
            right: margin,
            bottom: margin,
            left: margin,
        }
    }

    /// Clamp every side to `[min, max]` millimeters. Sides that are not a
    /// finite number fall back to the default margin.
    pub fn clamped(&self, min: f64, max: f64) -> Self {
        let fallback = Margins::default();
        Self {
            top: self.top.clamp_mm(min, max, fallback.top),
            right: self.right.clamp_mm(min, max, fallback.right),
            bottom: self.bottom.clamp_mm(min, max, fallback.bottom),
            left: self.left.clamp_mm(min, max, fallback.left),
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(Length::from_mm(20.0))
    }
}

/// Number of image slots on one output page.
///
/// Only 1×1, 1 column × 2 rows and 2×2 grids exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ImagesPerPage {
    #[default]
    One,
    Two,
    Four,
}

impl ImagesPerPage {
    pub fn count(self) -> usize {
        match self {
            ImagesPerPage::One => 1,
            ImagesPerPage::Two => 2,
            ImagesPerPage::Four => 4,
        }
    }

    /// Grid shape as `(cols, rows)`
    pub fn grid(self) -> (usize, usize) {
        match self {
            ImagesPerPage::One => (1, 1),
            ImagesPerPage::Two => (1, 2),
            ImagesPerPage::Four => (2, 2),
        }
    }
}

impl TryFrom<u8> for ImagesPerPage {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(ImagesPerPage::One),
            2 => Ok(ImagesPerPage::Two),
            4 => Ok(ImagesPerPage::Four),
            other => Err(format!("images per page must be 1, 2 or 4 (got {})", other)),
        }
    }
}

impl From<ImagesPerPage> for u8 {
    fn from(value: ImagesPerPage) -> Self {
        value.count() as u8
    }
}

/// Axis-aligned rectangle in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Grow the rectangle by `amount` on every side
    pub fn outset(&self, amount: f64) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + 2.0 * amount,
            height: self.height + 2.0 * amount,
        }
    }
}

/// Calculate the rectangle occupied by slot `slot_index` on a page.
///
/// The gap between columns is the right margin and the gap between rows is
/// the bottom margin; there is no separate gutter setting. Margins larger
/// than the page produce zero or negative sizes, which are returned as-is.
pub fn slot_rect(
    page: &PageDimensions,
    margins: &Margins,
    images_per_page: ImagesPerPage,
    slot_index: usize,
) -> Rect {
    let (cols, rows) = images_per_page.grid();
    let (top, right, bottom, left) = (
        margins.top.pt(),
        margins.right.pt(),
        margins.bottom.pt(),
        margins.left.pt(),
    );
    let page_height = page.height.pt();

    let content_width = page.width.pt() - left - right;
    let content_height = page_height - top - bottom;

    let slot_width = (content_width - (cols - 1) as f64 * right) / cols as f64;
    let slot_height = (content_height - (rows - 1) as f64 * bottom) / rows as f64;

    let row = slot_index / cols;
    let col = slot_index % cols;

    Rect {
        x: left + col as f64 * (slot_width + right),
        y: page_height - top - (row + 1) as f64 * slot_height - row as f64 * bottom,
        width: slot_width,
        height: slot_height,
    }
}

/// Final draw rectangles for one image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedImage {
    /// Where the image itself is drawn
    pub image: Rect,
    /// Stroke rectangle around the image, when a border is requested
    pub border: Option<Rect>,
}

/// Scale an image into `target` preserving its aspect ratio, centred.
///
/// The border (if any) grows outward from the fitted box and never shrinks
/// the image, so a wide border may extend past the slot.
pub fn fit_image(
    natural_width: u32,
    natural_height: u32,
    target: &Rect,
    border_width: Option<f64>,
) -> FittedImage {
    let aspect_ratio = natural_width as f64 / natural_height as f64;

    let (width, height) = if target.width / target.height > aspect_ratio {
        (target.height * aspect_ratio, target.height)
    } else {
        (target.width, target.width / aspect_ratio)
    };

    let image = Rect {
        x: target.x + (target.width - width) / 2.0,
        y: target.y + (target.height - height) / 2.0,
        width,
        height,
    };

    FittedImage {
        image,
        border: border_width.map(|w| image.outset(w)),
    }
}
