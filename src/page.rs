//! # Page Geometry
//!
//! Computes the printable area, the image placement in device dots and,
//! for disc media, the circular print mask.
//!
//! ## Coordinates
//!
//! Page coordinates are in points from the top-left corner of the paper.
//! Full-bleed printing may produce a negative left edge. Image dots are
//! at the printed resolution.
//!
//! ## Disc Mask
//!
//! For an image row at vertical distance `d` from the disc center
//! (converted to horizontal dot units), dots within `sqrt(R² − d²)` of the
//! center column are kept, and dots within `sqrt(r² − d²)` are cleared
//! again when `d < r`:
//!
//! ```text
//!        ┌──────────┐
//!     ┌──┘  ░░░░░░  └──┐     ░ = printed
//!     │ ░░░░┌────┐░░░ │
//!     │ ░░░░│ hub│░░░ │
//!     │ ░░░░└────┘░░░ │
//!     └──┐  ░░░░░░  ┌──┘
//!        └──────────┘
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{InkpassError, Result};
use crate::media::{FeedType, Margins, POINTS_PER_INCH, PaperSize, points_to_dots};
use crate::printer::CapabilityTable;
use crate::raster::row_bytes;
use crate::resolution::ResolutionDescriptor;
use crate::weave::WeavePlan;

/// Image placement in points, relative to the paper's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Caller settings for disc printing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscOptions {
    /// Printable outer diameter in points; the model default when absent.
    pub outer_diameter: Option<f64>,
    /// Hub diameter in points; the model default when absent.
    pub inner_diameter: Option<f64>,
    /// Fine-tune of the disc center, in points.
    pub adjust_x: f64,
    pub adjust_y: f64,
}

/// Everything page geometry depends on besides the model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageRequest {
    pub paper: PaperSize,
    pub feed: FeedType,
    pub full_bleed: bool,
    pub disc: Option<DiscOptions>,
    pub image: Option<ImageArea>,
}

/// Disc circle in image dot coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiscGeometry {
    /// Center column, in printed dots from the image's left edge.
    pub center_x: i64,
    /// Center row, in printed rows from the image's top edge.
    pub center_y: i64,
    /// Outer radius in horizontal dots.
    pub outer_radius: f64,
    /// Hub radius in horizontal dots.
    pub inner_radius: f64,
    /// Horizontal dots per vertical row.
    pub aspect: f64,
}

/// Page and image geometry for one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    /// Printable area edges, in points from the paper's top-left corner.
    pub page_left: f64,
    pub page_right: f64,
    pub page_top: f64,
    pub page_bottom: f64,
    pub image_left: f64,
    pub image_top: f64,
    pub image_width: f64,
    pub image_height: f64,
    /// Image left edge in printed dots.
    pub image_left_dots: i64,
    /// Image top edge in printed rows.
    pub image_top_rows: i64,
    pub image_width_dots: u32,
    pub image_height_rows: u32,
    pub disc: Option<DiscGeometry>,
}

impl PageGeometry {
    /// Disc mask for this page, if printing on a disc.
    pub fn disc_mask(&self) -> Option<DiscMask> {
        self.disc.map(|geometry| DiscMask {
            width: self.image_width_dots,
            geometry,
        })
    }
}

/// Compute page geometry.
pub fn compute(
    caps: &CapabilityTable,
    res: &ResolutionDescriptor,
    plan: &WeavePlan,
    request: &PageRequest,
) -> Result<PageGeometry> {
    let paper = &request.paper;
    let paper_margins = paper.margins.unwrap_or(Margins::ZERO);

    let (page_width, page_height, left, right, top, bottom, disc_origin) = match request.disc {
        Some(options) => {
            let disc = caps.disc.ok_or_else(|| {
                InkpassError::InvalidOption(format!("{} has no disc tray", caps.name))
            })?;
            let width = disc.page_width.unwrap_or(paper.width);
            let height = disc.page_height.unwrap_or(paper.height);
            let x = disc.x_offset + options.adjust_x;
            let y = disc.y_offset + options.adjust_y;
            (width, height, x, x + width, y, y + height, Some((x, y, disc, options)))
        }
        None => {
            if !caps.paper_limits.admits(paper.width, paper.height) {
                return Err(InkpassError::PaperSize {
                    width: paper.width,
                    height: paper.height,
                });
            }
            let bleed = caps.full_bleed && request.full_bleed && paper_margins.is_zero();
            if bleed {
                let overshoot = f64::from(caps.zero_margin_offset) * POINTS_PER_INCH / 360.0;
                let extension = f64::from(plan.nozzles * plan.nozzle_separation)
                    * POINTS_PER_INCH
                    / f64::from(caps.base_separation);
                (
                    paper.width,
                    paper.height,
                    -overshoot,
                    paper.width + overshoot,
                    0.0,
                    paper.height + extension,
                    None,
                )
            } else {
                let m = caps
                    .margins
                    .lookup(request.feed, plan.printer_weave())
                    .max(paper_margins);
                (
                    paper.width,
                    paper.height,
                    m.left,
                    paper.width - m.right,
                    m.top,
                    paper.height - m.bottom,
                    None,
                )
            }
        }
    };

    let (image_left, image_top, image_right, image_bottom) = match request.image {
        Some(area) => (
            area.left.max(left),
            area.top.max(top),
            (area.left + area.width).min(right),
            (area.top + area.height).min(bottom),
        ),
        None => (left, top, right, bottom),
    };
    if image_right <= image_left || image_bottom <= image_top {
        return Err(InkpassError::InvalidOption(
            "image area lies outside the printable area".into(),
        ));
    }

    let hres = res.printed_hres;
    let vres = res.printed_vres;
    let image_width = image_right - image_left;
    let image_height = image_bottom - image_top;

    let disc = disc_origin.map(|(x, y, caps_disc, options)| {
        let outer = options.outer_diameter.unwrap_or(caps_disc.outer_diameter);
        let inner = options.inner_diameter.unwrap_or(caps_disc.inner_diameter);
        DiscGeometry {
            center_x: points_to_dots(x + page_width / 2.0 - image_left, hres).round() as i64,
            center_y: points_to_dots(y + page_height / 2.0 - image_top, vres).round() as i64,
            outer_radius: points_to_dots(outer, hres) / 2.0,
            inner_radius: points_to_dots(inner, hres) / 2.0,
            aspect: f64::from(hres) / f64::from(vres),
        }
    });

    let geometry = PageGeometry {
        page_width,
        page_height,
        page_left: left,
        page_right: right,
        page_top: top,
        page_bottom: bottom,
        image_left,
        image_top,
        image_width,
        image_height,
        image_left_dots: points_to_dots(image_left, hres).round() as i64,
        image_top_rows: points_to_dots(image_top, vres).round() as i64,
        image_width_dots: points_to_dots(image_width, hres).round() as u32,
        image_height_rows: points_to_dots(image_height, vres).round() as u32,
        disc,
    };
    debug!(
        "page {:.1}x{:.1}pt, printable {:.1},{:.1} to {:.1},{:.1}, image {}x{} dots",
        geometry.page_width,
        geometry.page_height,
        geometry.page_left,
        geometry.page_top,
        geometry.page_right,
        geometry.page_bottom,
        geometry.image_width_dots,
        geometry.image_height_rows
    );
    Ok(geometry)
}

// ============================================================================
// Disc mask
// ============================================================================

/// Per-row disc mask, one bit per dot (1 = print).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscMask {
    width: u32,
    geometry: DiscGeometry,
}

/// Set or clear bits `[start, end)`, MSB first.
fn fill_span(out: &mut [u8], start: usize, end: usize, on: bool) {
    if start >= end {
        return;
    }
    let first = start / 8;
    let last = (end - 1) / 8;
    for (i, byte) in out.iter_mut().enumerate().take(last + 1).skip(first) {
        let lo = if i == first { start % 8 } else { 0 };
        let hi = if i == last { (end - 1) % 8 + 1 } else { 8 };
        let mask = (0xFFu8 >> lo) & (0xFFu16 << (8 - hi)) as u8;
        if on {
            *byte |= mask;
        } else {
            *byte &= !mask;
        }
    }
}

/// Column span `[center - half, center + half)` clipped to `0..width`.
fn span(center: i64, half: f64, width: u32) -> (usize, usize) {
    let half = half.floor() as i64;
    let start = (center - half).clamp(0, i64::from(width));
    let end = (center + half).clamp(0, i64::from(width));
    (start as usize, end as usize)
}

impl DiscMask {
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask bytes per row.
    pub fn row_len(&self) -> usize {
        row_bytes(self.width, 1)
    }

    /// Half chord at image row `y`, or `None` outside the disc.
    fn half_chord(&self, radius: f64, y: u32) -> Option<f64> {
        let d = (i64::from(y) - self.geometry.center_y).abs() as f64 * self.geometry.aspect;
        (d < radius).then(|| (radius * radius - d * d).sqrt())
    }

    /// Fill `out` with the mask of image row `y`.
    pub fn row(&self, y: u32, out: &mut [u8]) {
        out.fill(0);
        let Some(outer) = self.half_chord(self.geometry.outer_radius, y) else {
            return;
        };
        let (start, end) = span(self.geometry.center_x, outer, self.width);
        fill_span(out, start, end, true);
        if let Some(hub) = self.half_chord(self.geometry.inner_radius, y) {
            let (start, end) = span(self.geometry.center_x, hub, self.width);
            fill_span(out, start, end, false);
        }
    }

    /// Print bits in the mask of row `y`.
    pub fn print_bits(&self, y: u32) -> u32 {
        let mut row = vec![0u8; self.row_len()];
        self.row(y, &mut row);
        row.iter().map(|b| b.count_ones()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ink::{ColorMode, select_ink};
    use crate::printer::CapabilityCatalog;
    use crate::weave::{HeadRegime, WeaveOptions, plan};

    fn setup(model: &str, res: &str) -> (CapabilityTable, ResolutionDescriptor, WeavePlan) {
        let caps = CapabilityCatalog::built_in().unwrap().get(model).unwrap().clone();
        let res = caps.resolution(res).unwrap().clone();
        let ink = select_ink(&caps, None, ColorMode::Color).unwrap();
        let plan = plan(&caps, &res, &ink, &WeaveOptions::default());
        (caps, res, plan)
    }

    #[test]
    fn test_margins_take_maximum() {
        let (caps, res, plan) = setup("demo-180", "360x360");
        let model = caps.margins.sheet.soft;
        let mut paper = PaperSize::letter();
        paper.margins = Some(Margins {
            left: model.left + 10.0,
            right: 0.0,
            top: 0.0,
            bottom: 0.0,
        });
        let request = PageRequest {
            paper,
            ..Default::default()
        };
        let page = compute(&caps, &res, &plan, &request).unwrap();
        assert_eq!(page.page_left, model.left + 10.0);
        assert_eq!(page.page_right, 612.0 - model.right);
        assert_eq!(page.page_top, model.top);
        assert_eq!(page.page_bottom, 792.0 - model.bottom);
    }

    #[test]
    fn test_roll_and_printer_weave_margins() {
        let (caps, res, _) = setup("demo-photo6", "720x720");
        let ink = select_ink(&caps, None, ColorMode::Color).unwrap();
        let pw = plan(
            &caps,
            &res,
            &ink,
            &WeaveOptions {
                printer_weave: true,
                ..Default::default()
            },
        );
        let request = PageRequest {
            feed: FeedType::Roll,
            ..Default::default()
        };
        let page = compute(&caps, &res, &pw, &request).unwrap();
        let roll = caps.margins.roll.unwrap().printer;
        assert_eq!(page.page_left, roll.left);
        assert_eq!(page.page_top, roll.top);
    }

    #[test]
    fn test_image_dots() {
        let (caps, res, plan) = setup("demo-180", "720x720");
        let page = compute(&caps, &res, &plan, &PageRequest::default()).unwrap();
        let expected = ((page.page_right - page.page_left) * 10.0).round() as u32;
        assert_eq!(page.image_width_dots, expected);
        assert_eq!(page.image_top_rows, (page.page_top * 10.0).round() as i64);
    }

    #[test]
    fn test_paper_too_large() {
        let (caps, res, plan) = setup("demo-180", "360x360");
        let request = PageRequest {
            paper: PaperSize::new("banner", 5000.0, 792.0),
            ..Default::default()
        };
        let err = compute(&caps, &res, &plan, &request).unwrap_err();
        assert!(matches!(err, InkpassError::PaperSize { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_full_bleed() {
        let (caps, res, plan) = setup("demo-photo6", "720x720");
        let request = PageRequest {
            paper: PaperSize::photo_4x6(),
            full_bleed: true,
            ..Default::default()
        };
        let page = compute(&caps, &res, &plan, &request).unwrap();
        // 80/360 inch = 16pt
        assert_eq!(page.page_left, -16.0);
        assert_eq!(page.page_right, 288.0 + 16.0);
        assert_eq!(page.page_top, 0.0);
        assert_eq!(plan.regime, HeadRegime::FullColor);
        let head = caps.color_head;
        let extension = f64::from(head.nozzles * head.separation) * 72.0 / 360.0;
        assert_eq!(page.page_bottom, 432.0 + extension);
        assert!(page.image_left_dots < 0);
    }

    #[test]
    fn test_full_bleed_extends_by_printing_head() {
        let (caps, res, _) = setup("demo-photo6", "360x360");
        let ink = select_ink(&caps, Some("black"), ColorMode::Color).unwrap();
        let fast = plan(&caps, &res, &ink, &WeaveOptions::default());
        assert_eq!(fast.regime, HeadRegime::Fast360);
        let request = PageRequest {
            paper: PaperSize::photo_4x6(),
            full_bleed: true,
            ..Default::default()
        };
        let page = compute(&caps, &res, &fast, &request).unwrap();
        let head = caps.fast_head.unwrap();
        let extension = f64::from(head.nozzles * head.separation) * 72.0 / 360.0;
        assert_eq!(page.page_bottom, 432.0 + extension);
        assert!(head.nozzles * head.separation < caps.color_head.nozzles * caps.color_head.separation);
    }

    #[test]
    fn test_full_bleed_needs_support() {
        let (caps, res, plan) = setup("demo-180", "360x360");
        assert!(!caps.full_bleed);
        let request = PageRequest {
            full_bleed: true,
            ..Default::default()
        };
        let page = compute(&caps, &res, &plan, &request).unwrap();
        assert_eq!(page.page_left, caps.margins.sheet.soft.left);
    }

    #[test]
    fn test_image_clipped_to_printable() {
        let (caps, res, plan) = setup("demo-180", "360x360");
        let request = PageRequest {
            image: Some(ImageArea {
                left: 0.0,
                top: 100.0,
                width: 72.0,
                height: 72.0,
            }),
            ..Default::default()
        };
        let page = compute(&caps, &res, &plan, &request).unwrap();
        assert_eq!(page.image_left, caps.margins.sheet.soft.left);
        assert_eq!(page.image_top, 100.0);
        assert_eq!(page.image_height_rows, 360);
    }

    #[test]
    fn test_image_outside_printable() {
        let (caps, res, plan) = setup("demo-180", "360x360");
        let request = PageRequest {
            image: Some(ImageArea {
                left: 700.0,
                top: 0.0,
                width: 10.0,
                height: 10.0,
            }),
            ..Default::default()
        };
        assert!(matches!(
            compute(&caps, &res, &plan, &request),
            Err(InkpassError::InvalidOption(_))
        ));
    }

    #[test]
    fn test_disc_requires_tray() {
        let (caps, res, plan) = setup("demo-180", "360x360");
        let request = PageRequest {
            disc: Some(DiscOptions::default()),
            ..Default::default()
        };
        assert!(compute(&caps, &res, &plan, &request).is_err());
    }

    #[test]
    fn test_disc_geometry() {
        let (caps, res, plan) = setup("demo-photo6", "360x360");
        let tray = caps.disc.unwrap();
        let request = PageRequest {
            disc: Some(DiscOptions {
                adjust_x: 1.0,
                ..Default::default()
            }),
            ..Default::default()
        };
        let page = compute(&caps, &res, &plan, &request).unwrap();
        assert_eq!(page.page_left, tray.x_offset + 1.0);
        let disc = page.disc.unwrap();
        assert!((disc.outer_radius - tray.outer_diameter * 5.0 / 2.0).abs() < 1e-9);
        assert_eq!(disc.aspect, 1.0);
        let width = tray.page_width.unwrap();
        assert_eq!(disc.center_x, (width / 2.0 * 5.0).round() as i64);
    }

    fn mask(width: u32, outer: f64, inner: f64) -> DiscMask {
        DiscMask {
            width,
            geometry: DiscGeometry {
                center_x: i64::from(width / 2),
                center_y: 100,
                outer_radius: outer,
                inner_radius: inner,
                aspect: 1.0,
            },
        }
    }

    #[test]
    fn test_fill_span_partial_bytes() {
        let mut row = vec![0u8; 3];
        fill_span(&mut row, 3, 5, true);
        assert_eq!(row, vec![0b0001_1000, 0, 0]);
        fill_span(&mut row, 6, 19, true);
        assert_eq!(row, vec![0b0001_1011, 0xFF, 0b1110_0000]);
        fill_span(&mut row, 4, 12, false);
        assert_eq!(row, vec![0b0001_0000, 0b0000_1111, 0b1110_0000]);
    }

    #[test]
    fn test_mask_chord_lengths() {
        let m = mask(256, 90.0, 30.0);
        for y in 11..190u32 {
            let d = (i64::from(y) - 100).abs() as f64;
            let outer = (90.0f64 * 90.0 - d * d).sqrt().floor() as i64;
            let hub = if d < 30.0 {
                (30.0f64 * 30.0 - d * d).sqrt().floor() as i64
            } else {
                0
            };
            let expected = 2 * (outer - hub);
            let got = i64::from(m.print_bits(y));
            assert!((got - expected).abs() <= 1, "row {}: {} vs {}", y, got, expected);
        }
    }

    #[test]
    fn test_mask_hub_is_empty() {
        let m = mask(256, 90.0, 30.0);
        let mut row = vec![0u8; m.row_len()];
        for y in 71..130u32 {
            m.row(y, &mut row);
            let d = (i64::from(y) - 100).abs() as f64;
            let hub = (30.0f64 * 30.0 - d * d).sqrt().floor() as usize;
            for x in 128 - hub..128 + hub {
                assert_eq!(row[x / 8] & (0x80 >> (x % 8)), 0, "row {} col {}", y, x);
            }
        }
    }

    #[test]
    fn test_mask_outside_disc() {
        let m = mask(256, 90.0, 30.0);
        assert_eq!(m.print_bits(0), 0);
        assert_eq!(m.print_bits(10), 0);
        assert_eq!(m.print_bits(190), 0);
    }

    #[test]
    fn test_mask_tiny_radius() {
        // under one byte of coverage
        let m = mask(64, 2.5, 0.0);
        assert_eq!(m.print_bits(100), 4);
        let mut row = vec![0u8; m.row_len()];
        m.row(100, &mut row);
        assert_eq!(row[3], 0b0000_0011);
        assert_eq!(row[4], 0b1100_0000);
    }
}
