//! # Weave Planning
//!
//! Derives the head geometry a job prints with.
//!
//! ## Regimes
//!
//! | Regime | Geometry | When |
//! |--------|----------|------|
//! | `PrinterWeave` | 1 nozzle | printer weave requested and supported, or the resolution is not soft-woven |
//! | `Fast360` | fast head | single-channel or plain CMYK ink at printed 360 dpi, native horizontal pitch |
//! | `BlackOnly` | black head | one physical channel, pitch-aligned vdpi, under the black-resolution ceiling |
//! | `FullColor` | color head | everything else |
//!
//! Soft-weave regimes are tried in table order. Fast and black-only heads
//! are only considered when [`WeaveOptions::fast_heads`] is set.
//!
//! ## Units
//!
//! Head offsets and nozzle separation are declared in base separation
//! units and rescaled to printed rows: `rows = units × printed_vres /
//! base_separation`.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::ink::InkChannelSet;
use crate::printer::{CapabilityTable, HeadGeometry};
use crate::resolution::ResolutionDescriptor;

/// Which head configuration prints the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadRegime {
    PrinterWeave,
    Fast360,
    BlackOnly,
    FullColor,
}

/// Caller choices that influence the weave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaveOptions {
    /// Let the device interleave, if the model can.
    pub printer_weave: bool,
    /// Allow the fast-360 and black-only heads.
    pub fast_heads: bool,
}

impl Default for WeaveOptions {
    fn default() -> Self {
        Self {
            printer_weave: false,
            fast_heads: true,
        }
    }
}

/// Head geometry and pass counts for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeavePlan {
    pub regime: HeadRegime,
    /// Nozzles per physical channel.
    pub nozzles: u32,
    /// Nozzle spacing in base separation units.
    pub nozzle_separation: u32,
    pub min_nozzles: u32,
    pub horizontal_passes: u32,
    pub vertical_passes: u32,
    /// Native horizontal dot pitch used for each pass.
    pub physical_xdpi: u32,
    /// Nozzle spacing in printed rows.
    pub row_separation: u32,
    /// Offset of each physical channel in printed rows, in ink order.
    pub head_offsets: Vec<u32>,
    pub max_head_offset: u32,
    /// Rows the advance bookkeeping subtracts one less than.
    pub separation_rows: u32,
}

impl WeavePlan {
    /// Times each row is covered.
    pub fn oversample(&self) -> u32 {
        self.horizontal_passes * self.vertical_passes
    }

    pub fn printer_weave(&self) -> bool {
        self.regime == HeadRegime::PrinterWeave
    }
}

fn fast_eligible(caps: &CapabilityTable, res: &ResolutionDescriptor, ink: &InkChannelSet) -> bool {
    caps.fast_head.is_some()
        && (ink.physical_count() == 1 || ink.is_plain_cmyk())
        && res.printed_vres == 360
        && res.hres == caps.base_res(res.class())
}

fn black_geometry(
    caps: &CapabilityTable,
    res: &ResolutionDescriptor,
    ink: &InkChannelSet,
) -> Option<HeadGeometry> {
    if ink.physical_count() != 1 {
        return None;
    }
    let ceiling = caps.max_black_resolution?;
    if res.hres > ceiling || res.vres > ceiling {
        return None;
    }
    let head = caps.black_head.unwrap_or(caps.color_head);
    let pitch = head.pitch(caps.base_separation);
    (pitch > 0 && res.vres % pitch == 0).then_some(head)
}

fn choose_regime(
    caps: &CapabilityTable,
    res: &ResolutionDescriptor,
    ink: &InkChannelSet,
    options: &WeaveOptions,
) -> (HeadRegime, HeadGeometry) {
    if (options.printer_weave && caps.printer_weave) || !res.soft_weave {
        return (HeadRegime::PrinterWeave, HeadGeometry::SINGLE);
    }
    if options.fast_heads {
        if let Some(fast) = caps.fast_head.filter(|_| fast_eligible(caps, res, ink)) {
            return (HeadRegime::Fast360, fast);
        }
        if let Some(black) = black_geometry(caps, res, ink) {
            return (HeadRegime::BlackOnly, black);
        }
    }
    (HeadRegime::FullColor, caps.color_head)
}

fn to_rows(units: u32, printed_vres: u32, base_separation: u32) -> u32 {
    (u64::from(units) * u64::from(printed_vres) / u64::from(base_separation.max(1))) as u32
}

/// Plan the weave for a resolution and ink type.
pub fn plan(
    caps: &CapabilityTable,
    res: &ResolutionDescriptor,
    ink: &InkChannelSet,
    options: &WeaveOptions,
) -> WeavePlan {
    let (regime, head) = choose_regime(caps, res, ink, options);

    let base_res = caps.base_res(res.class());
    let physical_xdpi = if base_res == 0 { res.hres } else { base_res.min(res.hres) };
    let horizontal_passes = match physical_xdpi {
        0 => 1,
        x => (res.printed_hres / x).max(1),
    };

    let nozzles = head.nozzles.max(1);
    let min_nozzles = head.min_nozzles.clamp(1, nozzles);

    let row_separation = if regime == HeadRegime::PrinterWeave {
        1
    } else {
        let rows = to_rows(head.separation, res.printed_vres, caps.base_separation).max(1);
        if res.printed_vres == 720 {
            rows + caps.extra_720dpi_separation
        } else {
            rows
        }
    };

    let head_offsets: Vec<u32> = if ink.physical_count() <= 1 {
        vec![0; ink.physical_count()]
    } else {
        ink.physical()
            .map(|sub| to_rows(sub.head_offset, res.printed_vres, caps.base_separation))
            .collect()
    };
    let max_head_offset = head_offsets.iter().copied().max().unwrap_or(0);

    let separation_rows = if caps.pseudo_separation_rows > 0 {
        caps.pseudo_separation_rows
    } else {
        caps.separation_rows.max(1)
    };

    let plan = WeavePlan {
        regime,
        nozzles,
        nozzle_separation: head.separation,
        min_nozzles,
        horizontal_passes,
        vertical_passes: res.vertical_passes.max(1),
        physical_xdpi,
        row_separation,
        head_offsets,
        max_head_offset,
        separation_rows,
    };
    debug!(
        "weave {:?}: {} nozzles every {} rows (min {}), {}x{} passes, max offset {}",
        plan.regime,
        plan.nozzles,
        plan.row_separation,
        plan.min_nozzles,
        plan.horizontal_passes,
        plan.vertical_passes,
        plan.max_head_offset
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ink::{ColorMode, select_ink};
    use crate::printer::CapabilityCatalog;

    fn demo(model: &str) -> CapabilityTable {
        CapabilityCatalog::built_in().unwrap().get(model).unwrap().clone()
    }

    fn res(caps: &CapabilityTable, name: &str) -> ResolutionDescriptor {
        caps.resolution(name).unwrap().clone()
    }

    #[test]
    fn test_black_only_regime() {
        let caps = demo("demo-180");
        let ink = select_ink(&caps, Some("black"), ColorMode::Color).unwrap();
        let plan = plan(&caps, &res(&caps, "720x720"), &ink, &WeaveOptions::default());
        assert_eq!(plan.regime, HeadRegime::BlackOnly);
        assert_eq!(plan.horizontal_passes, 1);
        assert_eq!(plan.nozzles, 180);
        assert_eq!(plan.row_separation, 2);
        assert_eq!(plan.head_offsets, vec![0]);
    }

    #[test]
    fn test_fast_heads_disabled() {
        let caps = demo("demo-180");
        let ink = select_ink(&caps, Some("black"), ColorMode::Color).unwrap();
        let options = WeaveOptions {
            fast_heads: false,
            ..Default::default()
        };
        let plan = plan(&caps, &res(&caps, "720x720"), &ink, &options);
        assert_eq!(plan.regime, HeadRegime::FullColor);
    }

    #[test]
    fn test_black_ceiling() {
        let mut caps = demo("demo-180");
        caps.max_black_resolution = Some(360);
        let ink = select_ink(&caps, Some("black"), ColorMode::Color).unwrap();
        let plan = plan(&caps, &res(&caps, "720x720"), &ink, &WeaveOptions::default());
        assert_eq!(plan.regime, HeadRegime::FullColor);

        caps.max_black_resolution = None;
        let plan2 = super::plan(&caps, &res(&caps, "360x360"), &ink, &WeaveOptions::default());
        assert_eq!(plan2.regime, HeadRegime::FullColor);
    }

    #[test]
    fn test_pseudo_separation_rows_override() {
        let mut caps = demo("demo-180");
        let ink = select_ink(&caps, Some("black"), ColorMode::Color).unwrap();
        caps.separation_rows = 2;
        let plain = plan(&caps, &res(&caps, "720x720"), &ink, &WeaveOptions::default());
        assert_eq!(plain.separation_rows, 2);

        caps.pseudo_separation_rows = 3;
        let pseudo = plan(&caps, &res(&caps, "720x720"), &ink, &WeaveOptions::default());
        assert_eq!(pseudo.separation_rows, 3);
        assert_eq!(pseudo.row_separation, plain.row_separation);
    }

    #[test]
    fn test_fast_360_cmyk() {
        let caps = demo("demo-photo6");
        let ink = select_ink(&caps, Some("cmyk"), ColorMode::Color).unwrap();
        let plan = plan(&caps, &res(&caps, "360x360"), &ink, &WeaveOptions::default());
        assert_eq!(plan.regime, HeadRegime::Fast360);
        assert_eq!(plan.nozzles, caps.fast_head.unwrap().nozzles);
    }

    #[test]
    fn test_fast_360_not_for_photo_inks() {
        let caps = demo("demo-photo6");
        let ink = select_ink(&caps, Some("photo6"), ColorMode::Color).unwrap();
        let plan = plan(&caps, &res(&caps, "360x360"), &ink, &WeaveOptions::default());
        assert_eq!(plan.regime, HeadRegime::FullColor);
        assert_eq!(plan.nozzles, caps.color_head.nozzles);
    }

    #[test]
    fn test_printer_weave() {
        let caps = demo("demo-photo6");
        let ink = select_ink(&caps, Some("photo6"), ColorMode::Color).unwrap();
        let options = WeaveOptions {
            printer_weave: true,
            ..Default::default()
        };
        let plan = plan(&caps, &res(&caps, "720x720"), &ink, &options);
        assert_eq!(plan.regime, HeadRegime::PrinterWeave);
        assert_eq!(plan.nozzles, 1);
        assert_eq!(plan.min_nozzles, 1);
        assert_eq!(plan.row_separation, 1);
    }

    #[test]
    fn test_printer_weave_unsupported_falls_back() {
        let caps = demo("demo-180");
        let ink = select_ink(&caps, None, ColorMode::Color).unwrap();
        let options = WeaveOptions {
            printer_weave: true,
            fast_heads: false,
        };
        let plan = plan(&caps, &res(&caps, "720x720"), &ink, &options);
        assert_eq!(plan.regime, HeadRegime::FullColor);
    }

    #[test]
    fn test_hardware_weave_resolution() {
        let caps = demo("demo-photo6");
        let ink = select_ink(&caps, Some("photo6"), ColorMode::Color).unwrap();
        let descriptor = res(&caps, "720x720pw");
        assert!(!descriptor.soft_weave);
        let plan = plan(&caps, &descriptor, &ink, &WeaveOptions::default());
        assert!(plan.printer_weave());
    }

    #[test]
    fn test_head_offsets_rescaled() {
        let caps = demo("demo-photo6");
        let ink = select_ink(&caps, Some("photo6"), ColorMode::Color).unwrap();
        let plan = plan(&caps, &res(&caps, "720x720"), &ink, &WeaveOptions::default());
        let expected: Vec<u32> = ink
            .physical()
            .map(|s| s.head_offset * 720 / caps.base_separation)
            .collect();
        assert_eq!(plan.head_offsets, expected);
        assert_eq!(plan.max_head_offset, *expected.iter().max().unwrap());
        assert!(plan.max_head_offset > 0);
    }

    #[test]
    fn test_single_channel_offset_forced_zero() {
        let mut caps = demo("demo-photo6");
        caps.inks[0].channels.truncate(1);
        caps.inks[0].channels[0].subchannels[0].head_offset = 12;
        let ink = caps.inks[0].clone();
        let plan = plan(&caps, &res(&caps, "720x720"), &ink, &WeaveOptions::default());
        assert_eq!(plan.head_offsets, vec![0]);
        assert_eq!(plan.max_head_offset, 0);
    }

    #[test]
    fn test_horizontal_passes_from_base_res() {
        let caps = demo("demo-180");
        let ink = select_ink(&caps, None, ColorMode::Color).unwrap();
        let plan = plan(&caps, &res(&caps, "1440x720"), &ink, &WeaveOptions::default());
        assert_eq!(plan.horizontal_passes, 2);
        assert_eq!(plan.oversample(), 2);
    }

    #[test]
    fn test_extra_720_separation() {
        let mut caps = demo("demo-photo6");
        caps.extra_720dpi_separation = 1;
        let ink = select_ink(&caps, Some("photo6"), ColorMode::Color).unwrap();
        let at_720 = plan(&caps, &res(&caps, "720x720"), &ink, &WeaveOptions::default());
        let at_360 = plan(&caps, &res(&caps, "360x360"), &ink, &WeaveOptions::default());
        assert_eq!(at_720.row_separation, 2 * 720 / 360 + 1);
        assert_eq!(at_360.row_separation, 2);
    }

    #[test]
    fn test_plan_invariants() {
        let catalog = CapabilityCatalog::built_in().unwrap();
        for caps in catalog.models.values() {
            for ink in &caps.inks {
                for descriptor in &caps.resolutions {
                    for printer_weave in [false, true] {
                        for fast_heads in [false, true] {
                            let options = WeaveOptions {
                                printer_weave,
                                fast_heads,
                            };
                            let plan = plan(caps, descriptor, ink, &options);
                            assert!(plan.horizontal_passes >= 1);
                            assert!(plan.nozzles >= plan.min_nozzles);
                            assert!(plan.min_nozzles >= 1);
                            assert_eq!(plan.head_offsets.len(), ink.physical_count());
                        }
                    }
                }
            }
        }
    }
}
