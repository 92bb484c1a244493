//! # Media
//!
//! Paper types, paper sizes, feed types and margins.
//!
//! All lengths are in points (1/72 inch).

use serde::{Deserialize, Serialize};

/// Density factor used when no paper type has been chosen.
pub const DEFAULT_PAPER_DENSITY: f64 = 0.8;

/// Points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Broad media grade, used to restrict resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaClass {
    Plain,
    Good,
    Photo,
    Premium,
    Transparency,
}

impl MediaClass {
    /// Whether a printed resolution is acceptable on this media.
    ///
    /// | Class | Rule |
    /// |-------|------|
    /// | Plain | both axes ≤ 720 |
    /// | Good | vres ≥ 360 |
    /// | Photo | vres ≥ 720 |
    /// | Premium | vres ≥ 1440 |
    /// | Transparency | both axes within 360–720 |
    pub fn admits(self, hres: u32, vres: u32) -> bool {
        match self {
            Self::Plain => hres <= 720 && vres <= 720,
            Self::Good => vres >= 360,
            Self::Photo => vres >= 720,
            Self::Premium => vres >= 1440,
            Self::Transparency => {
                (360..=720).contains(&hres) && (360..=720).contains(&vres)
            }
        }
    }
}

fn default_base_density() -> f64 {
    DEFAULT_PAPER_DENSITY
}

/// A paper type offered by a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperType {
    pub name: String,
    pub class: MediaClass,
    /// Ink density factor for this paper.
    #[serde(default = "default_base_density")]
    pub base_density: f64,
}

/// How paper is fed into the printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedType {
    #[default]
    Sheet,
    Roll,
}

/// Margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Margins {
    pub const ZERO: Self = Self {
        left: 0.0,
        right: 0.0,
        top: 0.0,
        bottom: 0.0,
    };

    /// Edge-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self {
            left: self.left.max(other.left),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
            bottom: self.bottom.max(other.bottom),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.left <= 0.0 && self.right <= 0.0 && self.top <= 0.0 && self.bottom <= 0.0
    }
}

/// A paper size, optionally with margins the paper itself imposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperSize {
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub margins: Option<Margins>,
}

impl PaperSize {
    pub fn new(name: &str, width: f64, height: f64) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            margins: None,
        }
    }

    /// US Letter (8.5 × 11 in).
    pub fn letter() -> Self {
        Self::new("Letter", 612.0, 792.0)
    }

    /// ISO A4 (210 × 297 mm).
    pub fn a4() -> Self {
        Self::new("A4", 595.0, 842.0)
    }

    /// 4 × 6 in photo card.
    pub fn photo_4x6() -> Self {
        Self::new("4x6", 288.0, 432.0)
    }

    /// Look up a built-in size by name (case-insensitive).
    pub fn named(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "letter" => Some(Self::letter()),
            "a4" => Some(Self::a4()),
            "4x6" => Some(Self::photo_4x6()),
            _ => None,
        }
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::letter()
    }
}

/// Convert points to device dots at `dpi`.
#[inline]
pub fn points_to_dots(points: f64, dpi: u32) -> f64 {
    points * f64::from(dpi) / POINTS_PER_INCH
}
