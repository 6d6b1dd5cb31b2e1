//! Layout options for a merge run

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::{ImagesPerPage, Margins, Orientation};

/// Allowed margin range in millimeters
pub const MARGIN_RANGE_MM: (f64, f64) = (0.0, 100.0);

/// Allowed border stroke width range in points
pub const BORDER_WIDTH_RANGE: (f64, f64) = (0.1, 10.0);

/// 8-bit RGB colour, written as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Components scaled to the 0..=1 range used by PDF colour operators
    pub fn unit(&self) -> (f64, f64, f64) {
        (
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        )
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::Config(format!("Invalid colour '{}', expected #rrggbb", s)));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::Config(format!("Invalid colour '{}'", s)))
        };
        Ok(Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Border drawn around each placed image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Border {
    pub enabled: bool,
    /// Stroke width in points
    pub width: f64,
    pub color: Rgb,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 1.0,
            color: Rgb::BLACK,
        }
    }
}

impl Border {
    /// Stroke width when the border is on
    pub fn active_width(&self) -> Option<f64> {
        self.enabled.then_some(self.width)
    }
}

/// Everything the assembler needs to know about page layout
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub images_per_page: ImagesPerPage,
    pub orientation: Orientation,
    /// Page margins in millimeters
    pub margins: Margins,
    pub border: Border,
}

impl LayoutOptions {
    /// Load a layout preset from a JSON file; missing fields take defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Config(format!("Failed to parse layout options: {}", e)))?;
        options.check_finite()?;
        Ok(options)
    }

    /// Reject margins or a border width that are NaN or infinite
    pub fn check_finite(&self) -> Result<()> {
        let margins = &self.margins;
        let values = [
            ("top margin", margins.top.mm()),
            ("right margin", margins.right.mm()),
            ("bottom margin", margins.bottom.mm()),
            ("left margin", margins.left.mm()),
            ("border width", self.border.width),
        ];
        match values.iter().find(|(_, value)| !value.is_finite()) {
            Some((what, value)) => Err(Error::Config(format!(
                "{} must be a finite number, got {}",
                what, value
            ))),
            None => Ok(()),
        }
    }

    /// Copy with margins and border width forced into their allowed ranges.
    /// Non-finite values are replaced by their defaults.
    pub fn clamped(&self) -> Self {
        let (min_margin, max_margin) = MARGIN_RANGE_MM;
        let (min_width, max_width) = BORDER_WIDTH_RANGE;
        let width = if self.border.width.is_finite() {
            self.border.width.clamp(min_width, max_width)
        } else {
            Border::default().width
        };
        Self {
            margins: self.margins.clamped(min_margin, max_margin),
            border: Border {
                width,
                ..self.border
            },
            ..*self
        }
    }
}
