//! # Resolution Selection
//!
//! Picks the concrete resolution a job prints at.
//!
//! A request is either a named resolution from the model's list, a named
//! quality tier, or nothing (the "Standard" tier). Every candidate must pass
//! [`verify_resolution`] and, when a media type was chosen, the media-class
//! filter.
//!
//! ## Quality Tiers
//!
//! | Tier | Desired dpi | Scan |
//! |------|-------------|------|
//! | Draft | 180×180 | first fit in `[d, 2d]` |
//! | Standard | 360×360 | first fit in `[d, 2d]` |
//! | High | 720×720 | first fit in `[d, 2d]` |
//! | Photo | 1440×720 | first fit in `[d, 2d]` |
//! | HighPhoto | 1440×1440 | first fit in `[d, 2d]` |
//! | UltraPhoto | 2880×1440 | first fit in `[d, 2d]` |
//! | Best | none | highest verified entry |

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{InkpassError, Result};
use crate::media::MediaClass;
use crate::printer::{CapabilityTable, ResolutionClass};

/// Largest `horizontal_passes × vertical_passes` the weave supports.
pub const MAX_OVERSAMPLE: u32 = 8;

fn default_true() -> bool {
    true
}

fn default_vertical_passes() -> u32 {
    1
}

/// Document form: printed dpi defaults to the requested dpi.
#[derive(Deserialize)]
struct DescriptorDoc {
    name: String,
    hres: u32,
    vres: u32,
    #[serde(default)]
    printed_hres: Option<u32>,
    #[serde(default)]
    printed_vres: Option<u32>,
    #[serde(default = "default_true")]
    soft_weave: bool,
    #[serde(default = "default_vertical_passes")]
    vertical_passes: u32,
}

impl From<DescriptorDoc> for ResolutionDescriptor {
    fn from(doc: DescriptorDoc) -> Self {
        Self {
            printed_hres: doc.printed_hres.unwrap_or(doc.hres),
            printed_vres: doc.printed_vres.unwrap_or(doc.vres),
            name: doc.name,
            hres: doc.hres,
            vres: doc.vres,
            soft_weave: doc.soft_weave,
            vertical_passes: doc.vertical_passes.max(1),
        }
    }
}

/// A concrete resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "DescriptorDoc")]
pub struct ResolutionDescriptor {
    pub name: String,
    /// Requested horizontal dpi.
    pub hres: u32,
    /// Requested vertical dpi.
    pub vres: u32,
    /// Horizontal dpi on paper, after any hardware doubling.
    pub printed_hres: u32,
    /// Vertical dpi on paper, after any hardware doubling.
    pub printed_vres: u32,
    /// Host-side interleave; `false` means the device interleaves.
    pub soft_weave: bool,
    /// Times each row is printed.
    pub vertical_passes: u32,
}

impl ResolutionDescriptor {
    /// Class of the requested resolution.
    pub fn class(&self) -> ResolutionClass {
        ResolutionClass::from_dpi(self.hres, self.vres)
    }

    /// Class of the printed resolution.
    pub fn printed_class(&self) -> ResolutionClass {
        ResolutionClass::from_dpi(self.printed_hres, self.printed_vres)
    }
}

/// A named quality tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityTier {
    pub name: String,
    /// Desired (hres, vres); `None` prefers the highest resolution.
    #[serde(default)]
    pub desired: Option<[u32; 2]>,
    /// Lower printed-dpi bound for the top-down scan.
    #[serde(default)]
    pub min: Option<[u32; 2]>,
    /// Upper printed-dpi bound for the top-down scan.
    #[serde(default)]
    pub max: Option<[u32; 2]>,
}

impl QualityTier {
    fn new(name: &str, desired: Option<[u32; 2]>) -> Self {
        Self {
            name: name.to_string(),
            desired,
            min: None,
            max: None,
        }
    }

    /// Tiers used when a model does not declare its own.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Draft", Some([180, 180])),
            Self::new("Standard", Some([360, 360])),
            Self::new("High", Some([720, 720])),
            Self::new("Photo", Some([1440, 720])),
            Self::new("HighPhoto", Some([1440, 1440])),
            Self::new("UltraPhoto", Some([2880, 1440])),
            Self::new("Best", None),
        ]
    }

    fn within_bounds(&self, res: &ResolutionDescriptor) -> bool {
        let above_min = self
            .min
            .is_none_or(|[h, v]| res.printed_hres >= h && res.printed_vres >= v);
        let below_max = self
            .max
            .is_none_or(|[h, v]| res.printed_hres <= h && res.printed_vres <= v);
        above_min && below_max
    }
}

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResolutionRequest {
    /// A resolution name from the model's list.
    Named(String),
    /// A quality tier name.
    Quality(String),
    /// Neither; the "Standard" tier.
    #[default]
    Standard,
}

impl ResolutionRequest {
    /// A named resolution wins over a quality tier.
    pub fn from_options(resolution: Option<&str>, quality: Option<&str>) -> Self {
        match (resolution, quality) {
            (Some(name), _) => Self::Named(name.to_string()),
            (None, Some(tier)) => Self::Quality(tier.to_string()),
            (None, None) => Self::Standard,
        }
    }
}

/// Horizontal passes needed to reach `hres` with a head firing at `base_res`.
pub(crate) fn horizontal_passes(base_res: u32, hres: u32) -> u32 {
    let physical = base_res.min(hres);
    if physical == 0 { 1 } else { (hres / physical).max(1) }
}

/// Whether the model can print `res` at all.
pub fn verify_resolution(caps: &CapabilityTable, res: &ResolutionDescriptor) -> bool {
    let class = res.class();
    if caps.dot_size(class).is_none() {
        return false;
    }
    if res.hres < caps.min_hres
        || res.hres > caps.max_hres
        || res.vres < caps.min_vres
        || res.vres > caps.max_vres
    {
        return false;
    }

    let nozzles = caps.color_head.nozzles;
    let pitch = caps.nozzle_pitch();
    if nozzles > 1 && (pitch == 0 || res.vres % pitch != 0) {
        return false;
    }

    let oversample = horizontal_passes(caps.base_res(class), res.hres) * res.vertical_passes.max(1);
    if oversample > MAX_OVERSAMPLE {
        return false;
    }

    !res.soft_weave || (nozzles > 1 && nozzles > oversample)
}

/// Resolutions usable on the model (and media, if one was chosen).
///
/// This is the configuration-description view: entries that fail
/// verification are simply left out.
pub fn available_resolutions<'a>(
    caps: &'a CapabilityTable,
    media: Option<MediaClass>,
) -> Vec<&'a ResolutionDescriptor> {
    caps.resolutions
        .iter()
        .filter(|res| admits(media, res) && verify_resolution(caps, res))
        .collect()
}

fn admits(media: Option<MediaClass>, res: &ResolutionDescriptor) -> bool {
    media.is_none_or(|m| m.admits(res.printed_hres, res.printed_vres))
}

fn in_window(value: u32, desired: u32) -> bool {
    value >= desired && value <= desired.saturating_mul(2)
}

fn find_for_tier<'a>(
    caps: &'a CapabilityTable,
    tier: &QualityTier,
    media: Option<MediaClass>,
) -> Option<&'a ResolutionDescriptor> {
    let usable = |res: &&ResolutionDescriptor| {
        tier.within_bounds(res) && admits(media, res) && verify_resolution(caps, res)
    };
    match tier.desired {
        None => caps.resolutions.iter().rev().find(usable),
        Some([h, v]) => caps
            .resolutions
            .iter()
            .filter(|res| in_window(res.printed_hres, h) && in_window(res.printed_vres, v))
            .find(usable),
    }
}

/// Resolve a request to a concrete resolution.
pub fn select(
    caps: &CapabilityTable,
    request: &ResolutionRequest,
    media: Option<MediaClass>,
) -> Result<ResolutionDescriptor> {
    let found = match request {
        ResolutionRequest::Named(name) => caps
            .resolution(name)
            .filter(|res| admits(media, res) && verify_resolution(caps, res)),
        ResolutionRequest::Quality(name) => {
            let tier = caps
                .quality(name)
                .ok_or_else(|| InkpassError::UnknownQuality(name.clone()))?;
            find_for_tier(caps, tier, media)
        }
        ResolutionRequest::Standard => match caps.quality("Standard") {
            Some(tier) => find_for_tier(caps, tier, media),
            None => find_for_tier(caps, &QualityTier::new("Best", None), media),
        },
    };

    match found {
        Some(res) => {
            debug!(
                "{}: selected resolution {} ({}x{} printed {}x{})",
                caps.name, res.name, res.hres, res.vres, res.printed_hres, res.printed_vres
            );
            Ok(res.clone())
        }
        None => Err(InkpassError::NoResolution(format!(
            "{:?} on {} (media {:?})",
            request, caps.name, media
        ))),
    }
}
