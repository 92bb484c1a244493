//! # Inks and Density Negotiation
//!
//! An ink type is an [`InkChannelSet`]: up to eight logical channels, each
//! owning one or more physical sub-channels (distinct nozzle rows sharing a
//! color, such as light and dark cyan).
//!
//! Density negotiation trades resolution class for drop size. When the
//! requested density exceeds 1.0 at the printed class, lower classes with
//! the same bit depth are tried; each step down halves the dot count and
//! scales by the ratio of class densities:
//!
//! ```text
//! xdensity' = xdensity × density[lower] / density[current] / 2
//! ```
//!
//! A step is taken only if it improves on the starting density by more
//! than 0.1%. Descent never goes below `R360`.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{InkpassError, Result};
use crate::ir::ColorKey;
use crate::printer::{CapabilityTable, ResolutionClass};

/// Improvement a descent step must exceed to be taken.
const DESCENT_THRESHOLD: f64 = 1.001;

/// One physical nozzle row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubChannel {
    /// Device color id.
    pub color: u8,
    /// Device sub-channel id (light/dark variants).
    #[serde(default)]
    pub subchannel: Option<u8>,
    /// Vertical offset of this row, in base separation units.
    #[serde(default)]
    pub head_offset: u32,
    /// Name of the density parameter that scales this row.
    #[serde(default)]
    pub density_param: Option<String>,
}

impl SubChannel {
    /// Encoder key of this row.
    pub fn key(&self) -> ColorKey {
        ColorKey {
            color: self.color,
            subchannel: self.subchannel,
        }
    }
}

/// A logical color channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InkChannel {
    pub name: String,
    pub subchannels: Vec<SubChannel>,
}

/// A named ink type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InkChannelSet {
    pub name: String,
    pub channels: Vec<InkChannel>,
}

impl InkChannelSet {
    /// Most logical channels an ink type may have.
    pub const MAX_CHANNELS: usize = 8;

    /// All physical sub-channels, in channel order.
    pub fn physical(&self) -> impl Iterator<Item = &SubChannel> {
        self.channels.iter().flat_map(|c| c.subchannels.iter())
    }

    pub fn physical_count(&self) -> usize {
        self.channels.iter().map(|c| c.subchannels.len()).sum()
    }

    /// Four logical channels with one nozzle row each.
    pub fn is_plain_cmyk(&self) -> bool {
        self.channels.len() == 4 && self.channels.iter().all(|c| c.subchannels.len() == 1)
    }

    /// The set reduced to its black channel (or the first channel if none
    /// is named "black").
    pub fn monochrome(&self) -> Self {
        let black = self
            .channels
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case("black"))
            .or_else(|| self.channels.first());
        Self {
            name: format!("{}/mono", self.name),
            channels: black.cloned().into_iter().collect(),
        }
    }
}

/// Color or black-only printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[default]
    Color,
    Monochrome,
}

/// Pick the ink type for a job.
///
/// With no name the model's first ink type is used.
pub fn select_ink(
    caps: &CapabilityTable,
    name: Option<&str>,
    mode: ColorMode,
) -> Result<InkChannelSet> {
    let ink = match name {
        Some(name) => caps
            .ink(name)
            .ok_or_else(|| InkpassError::NoInkMatch(name.to_string()))?,
        None => caps
            .inks
            .first()
            .ok_or_else(|| InkpassError::NoInkMatch(format!("{} has no ink types", caps.name)))?,
    };
    let ink = match mode {
        ColorMode::Color => ink.clone(),
        ColorMode::Monochrome => ink.monochrome(),
    };
    debug!(
        "ink {}: {} logical, {} physical channels",
        ink.name,
        ink.channels.len(),
        ink.physical_count()
    );
    Ok(ink)
}

/// User overrides for drop size and density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityOptions {
    /// Density multiplier; pinning it disables negotiation.
    pub density: Option<f64>,
    /// Drop size id; pinning it disables negotiation.
    pub drop_size: Option<u8>,
    /// Bits per dot; pinning it disables negotiation.
    pub bit_depth: Option<u8>,
    /// Allow lowering the resolution class to reach density 1.0.
    pub adjust_dot_size: bool,
}

impl Default for DensityOptions {
    fn default() -> Self {
        Self {
            density: None,
            drop_size: None,
            bit_depth: None,
            adjust_dot_size: true,
        }
    }
}

impl DensityOptions {
    fn pinned(&self) -> bool {
        self.density.is_some() || self.drop_size.is_some() || self.bit_depth.is_some()
    }
}

/// Outcome of density negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InkNegotiation {
    /// Class whose drop size is used.
    pub class: ResolutionClass,
    pub drop_size: u8,
    pub bits: u8,
    /// Scaled density, never above 1.0.
    pub density: f64,
    /// Whether the class was lowered.
    pub adjusted: bool,
}

fn clamp_density(density: f64) -> f64 {
    if density > 1.0 {
        warn!("density {:.3} clamped to 1.0", density);
        1.0
    } else {
        density
    }
}

fn drop_size_at(caps: &CapabilityTable, class: ResolutionClass) -> Result<u8> {
    caps.dot_size(class).ok_or_else(|| {
        InkpassError::NoResolution(format!(
            "{} has no drop size at class {}",
            caps.name,
            class.label()
        ))
    })
}

/// Negotiate drop size and density starting at `class`.
///
/// Deterministic; bit depth is that of `class` whatever the outcome.
pub fn negotiate(
    caps: &CapabilityTable,
    class: ResolutionClass,
    paper_density: f64,
) -> Result<InkNegotiation> {
    let start_drop = drop_size_at(caps, class)?;
    let bits = caps.bits(class);
    let mut density = paper_density * caps.density(class);
    let mut chosen = class;
    let mut drop_size = start_drop;

    let mut current = class;
    let mut xdensity = density;
    while xdensity > 1.0 && current > ResolutionClass::R360 {
        let Some(lower) = current.lower() else { break };
        let lower_caps = caps.class(lower);
        let Some(lower_drop) = lower_caps.dot_size else { break };
        if lower_caps.bits != bits || lower_caps.density <= 0.0 {
            break;
        }
        xdensity = xdensity * lower_caps.density / caps.density(current) / 2.0;
        current = lower;
        if density / xdensity > DESCENT_THRESHOLD {
            density = xdensity;
            chosen = lower;
            drop_size = lower_drop;
        }
    }

    if chosen != class {
        debug!(
            "{}: density lowered class {} -> {} (density {:.3})",
            caps.name,
            class.label(),
            chosen.label(),
            density
        );
    }

    Ok(InkNegotiation {
        class: chosen,
        drop_size,
        bits,
        density: clamp_density(density),
        adjusted: chosen != class,
    })
}

/// Apply user overrides, negotiating only when nothing is pinned.
pub fn resolve_density(
    caps: &CapabilityTable,
    class: ResolutionClass,
    paper_density: f64,
    options: &DensityOptions,
) -> Result<InkNegotiation> {
    if let Some(bits) = options.bit_depth.filter(|b| !(1..=2).contains(b)) {
        return Err(InkpassError::InvalidOption(format!(
            "bit depth {} (expected 1 or 2)",
            bits
        )));
    }
    if let Some(density) = options.density.filter(|d| d.is_nan() || *d <= 0.0) {
        return Err(InkpassError::InvalidOption(format!(
            "density {} must be positive",
            density
        )));
    }

    if options.adjust_dot_size && !options.pinned() {
        return negotiate(caps, class, paper_density);
    }

    let drop_size = match options.drop_size {
        Some(drop) => drop,
        None => drop_size_at(caps, class)?,
    };
    let density = options.density.unwrap_or(1.0) * paper_density * caps.density(class);
    Ok(InkNegotiation {
        class,
        drop_size,
        bits: options.bit_depth.unwrap_or_else(|| caps.bits(class)),
        density: clamp_density(density),
        adjusted: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::CapabilityCatalog;

    fn demo(model: &str) -> CapabilityTable {
        CapabilityCatalog::built_in().unwrap().get(model).unwrap().clone()
    }

    /// A table where R720 is dense and R720x360 can absorb it.
    fn dense() -> CapabilityTable {
        let mut caps = demo("demo-180");
        caps.classes[ResolutionClass::R720.index()].density = 2.0;
        caps.classes[ResolutionClass::R720x360.index()].density = 1.0;
        caps.classes[ResolutionClass::R360.index()].density = 1.0;
        caps
    }

    #[test]
    fn test_no_descent_when_in_range() {
        let caps = demo("demo-180");
        let n = negotiate(&caps, ResolutionClass::R720, 0.6).unwrap();
        assert_eq!(n.class, ResolutionClass::R720);
        assert!(!n.adjusted);
        assert!((n.density - 0.6 * caps.density(ResolutionClass::R720)).abs() < 1e-9);
    }

    #[test]
    fn test_descends_to_lower_class() {
        let caps = dense();
        // 1.0 * 2.0 = 2.0 -> 2.0 * 1.0 / 2.0 / 2 = 0.5
        let n = negotiate(&caps, ResolutionClass::R720, 1.0).unwrap();
        assert_eq!(n.class, ResolutionClass::R720x360);
        assert!(n.adjusted);
        assert!((n.density - 0.5).abs() < 1e-9);
        assert_eq!(n.drop_size, caps.dot_size(ResolutionClass::R720x360).unwrap());
    }

    #[test]
    fn test_descent_stops_on_bit_depth_change() {
        let mut caps = dense();
        caps.classes[ResolutionClass::R720x360.index()].bits = 1;
        let n = negotiate(&caps, ResolutionClass::R720, 1.0).unwrap();
        assert_eq!(n.class, ResolutionClass::R720);
        assert_eq!(n.density, 1.0);
        assert_eq!(n.bits, caps.bits(ResolutionClass::R720));
    }

    #[test]
    fn test_descent_stops_on_unsupported_drop() {
        let mut caps = dense();
        caps.classes[ResolutionClass::R720x360.index()].dot_size = None;
        let n = negotiate(&caps, ResolutionClass::R720, 1.0).unwrap();
        assert_eq!(n.class, ResolutionClass::R720);
    }

    #[test]
    fn test_descent_floor_is_360() {
        let mut caps = dense();
        caps.classes[ResolutionClass::R360.index()].density = 4.0;
        let n = negotiate(&caps, ResolutionClass::R360, 1.0).unwrap();
        assert_eq!(n.class, ResolutionClass::R360);
        assert_eq!(n.density, 1.0);
    }

    #[test]
    fn test_negligible_step_not_taken() {
        let mut caps = dense();
        // ratio 2: candidate density equals current, no improvement
        caps.classes[ResolutionClass::R720x360.index()].density = 4.0;
        caps.classes[ResolutionClass::R360.index()].dot_size = None;
        let n = negotiate(&caps, ResolutionClass::R720, 1.0).unwrap();
        assert_eq!(n.class, ResolutionClass::R720);
    }

    #[test]
    fn test_negotiate_invariants() {
        let catalog = CapabilityCatalog::built_in().unwrap();
        for caps in catalog.models.values() {
            for class in ResolutionClass::ALL {
                if caps.dot_size(class).is_none() {
                    continue;
                }
                for factor in [0.2, 0.6, 0.8, 1.0, 1.5, 3.0] {
                    let a = negotiate(caps, class, factor).unwrap();
                    let b = negotiate(caps, class, factor).unwrap();
                    assert_eq!(a, b);
                    assert!(a.density <= 1.0);
                    assert_eq!(a.bits, caps.bits(class));
                    assert!(a.class <= class);
                }
            }
        }
    }

    #[test]
    fn test_pinned_skips_negotiation() {
        let caps = dense();
        let options = DensityOptions {
            drop_size: Some(1),
            ..Default::default()
        };
        let n = resolve_density(&caps, ResolutionClass::R720, 1.0, &options).unwrap();
        assert_eq!(n.class, ResolutionClass::R720);
        assert_eq!(n.drop_size, 1);
        assert_eq!(n.density, 1.0);
    }

    #[test]
    fn test_adjust_disabled_skips_negotiation() {
        let caps = dense();
        let options = DensityOptions {
            adjust_dot_size: false,
            ..Default::default()
        };
        let n = resolve_density(&caps, ResolutionClass::R720, 0.25, &options).unwrap();
        assert_eq!(n.class, ResolutionClass::R720);
        assert!((n.density - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_bit_depth() {
        let caps = demo("demo-180");
        let options = DensityOptions {
            bit_depth: Some(3),
            ..Default::default()
        };
        let err = resolve_density(&caps, ResolutionClass::R720, 1.0, &options).unwrap_err();
        assert!(matches!(err, InkpassError::InvalidOption(_)));
    }

    #[test]
    fn test_select_ink_default_and_named() {
        let caps = demo("demo-photo6");
        let default = select_ink(&caps, None, ColorMode::Color).unwrap();
        assert_eq!(default.name, caps.inks[0].name);
        let err = select_ink(&caps, Some("photo7"), ColorMode::Color).unwrap_err();
        assert!(matches!(err, InkpassError::NoInkMatch(_)));
    }

    #[test]
    fn test_monochrome_keeps_black() {
        let caps = demo("demo-photo6");
        let ink = select_ink(&caps, Some("photo6"), ColorMode::Monochrome).unwrap();
        assert_eq!(ink.channels.len(), 1);
        assert_eq!(ink.channels[0].name, "black");
        assert_eq!(ink.physical_count(), 1);
    }

    #[test]
    fn test_plain_cmyk() {
        let caps = demo("demo-photo6");
        assert!(caps.ink("cmyk").unwrap().is_plain_cmyk());
        assert!(!caps.ink("photo6").unwrap().is_plain_cmyk());
        assert_eq!(caps.ink("photo6").unwrap().physical_count(), 6);
    }
}
