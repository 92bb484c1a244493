//! # Printer Capabilities
//!
//! This module defines the declarative capability record for one printer
//! model. The record is pure data: it is deserialized from a capability
//! document and never mutated.
//!
//! ## Resolution Classes
//!
//! Every per-resolution property (drop size, density, bit depth, base
//! hardware resolution) is stored in a vector indexed by
//! [`ResolutionClass`]:
//!
//! | Class | Nominal dpi | Dots per square inch |
//! |-------|-------------|----------------------|
//! | `low` | below 360×360 | < 129,600 |
//! | `r360` | 360×360 | 129,600 |
//! | `r720x360` | 720×360 | 259,200 |
//! | `r720` | 720×720 | 518,400 |
//! | `r1440x720` | 1440×720 | 1,036,800 |
//! | `r2880x720` | 2880×720 | 2,073,600 |
//! | `r2880x1440` | 2880×1440 | 4,147,200 |
//! | `r2880x2880` | 2880×2880 | 8,294,400 |
//!
//! ## Units
//!
//! - Margins and paper limits are in points (1/72 inch).
//! - Nozzle separations and head offsets are in multiples of
//!   `1 / base_separation` inch.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{InkpassError, Result};
use crate::ink::InkChannelSet;
use crate::media::{FeedType, Margins, PaperType};
use crate::resolution::{QualityTier, ResolutionDescriptor};

/// Ordinal bucket grouping resolutions by total dot density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionClass {
    Low,
    R360,
    R720x360,
    R720,
    R1440x720,
    R2880x720,
    R2880x1440,
    R2880x2880,
}

impl ResolutionClass {
    /// Number of classes (length of every per-class vector).
    pub const COUNT: usize = 8;

    /// All classes, lowest first.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Low,
        Self::R360,
        Self::R720x360,
        Self::R720,
        Self::R1440x720,
        Self::R2880x720,
        Self::R2880x1440,
        Self::R2880x2880,
    ];

    /// Position in per-class vectors.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Nominal (hres, vres) of the class.
    pub fn nominal_dpi(self) -> (u32, u32) {
        match self {
            Self::Low => (180, 180),
            Self::R360 => (360, 360),
            Self::R720x360 => (720, 360),
            Self::R720 => (720, 720),
            Self::R1440x720 => (1440, 720),
            Self::R2880x720 => (2880, 720),
            Self::R2880x1440 => (2880, 1440),
            Self::R2880x2880 => (2880, 2880),
        }
    }

    /// Class of a concrete resolution: the highest class whose nominal dot
    /// density does not exceed `hres × vres`.
    pub fn from_dpi(hres: u32, vres: u32) -> Self {
        let dots = u64::from(hres) * u64::from(vres);
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|class| {
                let (h, v) = class.nominal_dpi();
                u64::from(h) * u64::from(v) <= dots
            })
            .unwrap_or(Self::Low)
    }

    /// The next lower class, if any.
    pub fn lower(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::R360 => "360",
            Self::R720x360 => "720x360",
            Self::R720 => "720",
            Self::R1440x720 => "1440x720",
            Self::R2880x720 => "2880x720",
            Self::R2880x1440 => "2880x1440",
            Self::R2880x2880 => "2880x2880",
        }
    }
}

/// Accepts `-1`, `null` or a missing value as "unsupported".
fn deserialize_dot_size<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<i16> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(n) if n < 0 => Ok(None),
        Some(n) => u8::try_from(n)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("dot size {} out of range", n))),
    }
}

/// Per-resolution-class capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassCaps {
    /// Drop size id, `None` if the class cannot be printed.
    #[serde(default, deserialize_with = "deserialize_dot_size")]
    pub dot_size: Option<u8>,
    /// Ink density multiplier at this class.
    pub density: f64,
    /// Bits per dot (1 = single drop size, 2 = variable drop).
    pub bits: u8,
    /// Native horizontal dot pitch of the head, in dpi.
    pub base_res: u32,
}

/// Nozzle geometry of one print head configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadGeometry {
    /// Nozzles per physical channel.
    pub nozzles: u32,
    /// Distance between adjacent nozzles, in base separation units.
    pub separation: u32,
    /// Fewest lines the head accepts in one pass.
    pub min_nozzles: u32,
}

impl HeadGeometry {
    /// Degenerate geometry used by printer weave (one row per pass).
    pub const SINGLE: Self = Self {
        nozzles: 1,
        separation: 1,
        min_nozzles: 1,
    };

    /// Vertical nozzle pitch in dpi.
    pub fn pitch(&self, base_separation: u32) -> u32 {
        base_separation / self.separation.max(1)
    }
}

/// Margins for each weave mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaveMargins {
    /// Margins when the host interleaves (soft weave).
    pub soft: Margins,
    /// Margins when the device interleaves (printer weave).
    pub printer: Margins,
}

/// Declared margins per feed type and weave mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginTable {
    pub sheet: WeaveMargins,
    /// Roll feed margins; sheet margins apply when absent.
    #[serde(default)]
    pub roll: Option<WeaveMargins>,
}

impl MarginTable {
    /// Model margins for a feed type and weave mode.
    pub fn lookup(&self, feed: FeedType, printer_weave: bool) -> Margins {
        let set = match feed {
            FeedType::Sheet => &self.sheet,
            FeedType::Roll => self.roll.as_ref().unwrap_or(&self.sheet),
        };
        if printer_weave { set.printer } else { set.soft }
    }
}

/// Paper size limits in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperLimits {
    pub max_width: f64,
    pub max_height: f64,
    #[serde(default)]
    pub min_width: f64,
    #[serde(default)]
    pub min_height: f64,
}

impl PaperLimits {
    pub fn admits(&self, width: f64, height: f64) -> bool {
        width <= self.max_width
            && height <= self.max_height
            && width >= self.min_width
            && height >= self.min_height
    }
}

fn default_outer_diameter() -> f64 {
    // 116mm
    328.8
}

fn default_inner_diameter() -> f64 {
    // 43mm
    121.9
}

/// Disc tray capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscCaps {
    /// Fixed page width for disc printing (points).
    #[serde(default)]
    pub page_width: Option<f64>,
    /// Fixed page height for disc printing (points).
    #[serde(default)]
    pub page_height: Option<f64>,
    /// Tray origin offset (points).
    #[serde(default)]
    pub x_offset: f64,
    #[serde(default)]
    pub y_offset: f64,
    #[serde(default = "default_outer_diameter")]
    pub outer_diameter: f64,
    #[serde(default = "default_inner_diameter")]
    pub inner_diameter: f64,
}

fn default_zero_margin_offset() -> u32 {
    80
}

fn default_vertical_units() -> u32 {
    1440
}

fn default_separation_rows() -> u32 {
    1
}

/// Capability record of one printer model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityTable {
    /// Display name.
    pub name: String,

    /// Per-class capabilities, indexed by [`ResolutionClass::index`].
    pub classes: [ClassCaps; ResolutionClass::COUNT],

    pub min_hres: u32,
    pub max_hres: u32,
    pub min_vres: u32,
    pub max_vres: u32,

    /// Reference nozzle pitch unit (units per inch).
    pub base_separation: u32,

    /// Full-color head configuration.
    pub color_head: HeadGeometry,
    /// Black-only head configuration.
    #[serde(default)]
    pub black_head: Option<HeadGeometry>,
    /// Fast 360dpi head configuration.
    #[serde(default)]
    pub fast_head: Option<HeadGeometry>,
    /// Highest resolution the black-only regime may run at.
    #[serde(default)]
    pub max_black_resolution: Option<u32>,

    /// Device firmware can interleave.
    #[serde(default)]
    pub printer_weave: bool,
    /// Zero-margin printing supported.
    #[serde(default)]
    pub full_bleed: bool,
    /// Full-bleed edge overshoot, in 1/360 inch.
    #[serde(default = "default_zero_margin_offset")]
    pub zero_margin_offset: u32,
    /// Units per inch of vertical positioning.
    #[serde(default = "default_vertical_units")]
    pub vertical_units: u32,

    #[serde(default = "default_separation_rows")]
    pub separation_rows: u32,
    #[serde(default)]
    pub pseudo_separation_rows: u32,
    #[serde(default)]
    pub extra_720dpi_separation: u32,

    pub margins: MarginTable,
    pub paper_limits: PaperLimits,
    #[serde(default)]
    pub disc: Option<DiscCaps>,

    /// Supported resolutions, lowest first.
    pub resolutions: Vec<ResolutionDescriptor>,
    #[serde(default = "QualityTier::defaults")]
    pub qualities: Vec<QualityTier>,
    /// Ink types (channel sets). The first one is the default.
    pub inks: Vec<InkChannelSet>,
    #[serde(default)]
    pub papers: Vec<PaperType>,
}

impl CapabilityTable {
    #[inline]
    pub fn class(&self, class: ResolutionClass) -> &ClassCaps {
        &self.classes[class.index()]
    }

    #[inline]
    pub fn dot_size(&self, class: ResolutionClass) -> Option<u8> {
        self.class(class).dot_size
    }

    #[inline]
    pub fn density(&self, class: ResolutionClass) -> f64 {
        self.class(class).density
    }

    #[inline]
    pub fn bits(&self, class: ResolutionClass) -> u8 {
        self.class(class).bits
    }

    #[inline]
    pub fn base_res(&self, class: ResolutionClass) -> u32 {
        self.class(class).base_res
    }

    /// Vertical pitch of the color head in dpi.
    pub fn nozzle_pitch(&self) -> u32 {
        self.color_head.pitch(self.base_separation)
    }

    pub fn resolution(&self, name: &str) -> Option<&ResolutionDescriptor> {
        self.resolutions.iter().find(|r| r.name == name)
    }

    pub fn ink(&self, name: &str) -> Option<&InkChannelSet> {
        self.inks.iter().find(|i| i.name == name)
    }

    pub fn paper(&self, name: &str) -> Option<&PaperType> {
        self.papers.iter().find(|p| p.name == name)
    }

    /// Quality tier lookup (case-insensitive).
    pub fn quality(&self, name: &str) -> Option<&QualityTier> {
        self.qualities
            .iter()
            .find(|q| q.name.eq_ignore_ascii_case(name))
    }

    /// Check internal consistency after deserialization.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(InkpassError::InvalidCapability(format!("{}: {}", self.name, msg)));

        if self.base_separation == 0 {
            return fail("base_separation must be non-zero".into());
        }
        for (label, head) in [
            ("color_head", Some(&self.color_head)),
            ("black_head", self.black_head.as_ref()),
            ("fast_head", self.fast_head.as_ref()),
        ] {
            if let Some(head) = head {
                if head.nozzles == 0 || head.separation == 0 {
                    return fail(format!("{} needs nozzles and separation", label));
                }
                if head.min_nozzles > head.nozzles {
                    return fail(format!("{} min_nozzles exceeds nozzles", label));
                }
            }
        }
        if self.min_hres > self.max_hres || self.min_vres > self.max_vres {
            return fail("min resolution above max resolution".into());
        }
        for class in ResolutionClass::ALL {
            let caps = self.class(class);
            if caps.dot_size.is_some() && !(1..=2).contains(&caps.bits) {
                return fail(format!("class {} has bit depth {}", class.label(), caps.bits));
            }
        }
        for (i, res) in self.resolutions.iter().enumerate() {
            if res.hres == 0 || res.vres == 0 || res.printed_hres == 0 || res.printed_vres == 0 {
                return fail(format!("resolution '{}' has a zero dpi", res.name));
            }
            if self.resolutions[..i].iter().any(|r| r.name == res.name) {
                return fail(format!("duplicate resolution '{}'", res.name));
            }
        }
        for ink in &self.inks {
            if ink.channels.is_empty() || ink.channels.len() > InkChannelSet::MAX_CHANNELS {
                return fail(format!(
                    "ink '{}' has {} logical channels",
                    ink.name,
                    ink.channels.len()
                ));
            }
            if ink.channels.iter().any(|c| c.subchannels.is_empty()) {
                return fail(format!("ink '{}' has a channel without nozzles", ink.name));
            }
        }
        Ok(())
    }
}
