//! # Job Resolution
//!
//! Resolves user options against a model into a [`JobSetup`], then runs
//! rows through the pass emitter.
//!
//! ```text
//! CapabilityTable + JobOptions
//!   → media type (density factor, media class)
//!   → resolution (ResolutionSelector)
//!   → ink type + density (InkNegotiator)
//!   → weave plan (WeavePlanner)
//!   → page geometry (PageGeometry)
//!   = JobSetup
//! ```
//!
//! Every configuration error surfaces here, before anything reaches the
//! protocol encoder.

use log::info;
use serde::{Deserialize, Serialize};

use crate::emitter::{PassEmitter, RowSource};
use crate::error::{InkpassError, Result};
use crate::ink::{ColorMode, DensityOptions, InkChannelSet, InkNegotiation, resolve_density, select_ink};
use crate::ir::{ColorKey, ProtocolEncoder};
use crate::media::{DEFAULT_PAPER_DENSITY, FeedType, PaperSize, PaperType};
use crate::page::{self, DiscOptions, ImageArea, PageGeometry, PageRequest};
use crate::printer::CapabilityTable;
use crate::resolution::{self, ResolutionDescriptor, ResolutionRequest};
use crate::weave::{self, WeaveOptions, WeavePlan};

/// User-selected options for a job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOptions {
    /// Resolution name; wins over `quality`.
    pub resolution: Option<String>,
    /// Quality tier name.
    pub quality: Option<String>,
    /// Paper (media) type name.
    pub media: Option<String>,
    /// Ink type name; the model's first ink type when absent.
    pub ink_type: Option<String>,
    pub color_mode: ColorMode,
    pub weave: WeaveOptions,
    pub feed: FeedType,
    pub full_bleed: bool,
    pub paper: PaperSize,
    pub image: Option<ImageArea>,
    pub disc: Option<DiscOptions>,
    pub density: DensityOptions,
}

impl JobOptions {
    /// Parse job options from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Fully resolved parameters of one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSetup {
    pub model: String,
    pub resolution: ResolutionDescriptor,
    pub media: Option<PaperType>,
    pub inks: InkChannelSet,
    pub ink: InkNegotiation,
    pub plan: WeavePlan,
    pub page: PageGeometry,
    /// Device vertical units per inch.
    pub vertical_units: u32,
}

impl JobSetup {
    /// Encoder keys of the physical channels, in ink order.
    pub fn channel_keys(&self) -> Vec<ColorKey> {
        self.inks.physical().map(|sub| sub.key()).collect()
    }
}

/// Resolve `options` for model `model`.
pub fn resolve(model: &str, caps: &CapabilityTable, options: &JobOptions) -> Result<JobSetup> {
    let media = match &options.media {
        Some(name) => Some(
            caps.paper(name)
                .cloned()
                .ok_or_else(|| InkpassError::UnknownMedia(name.clone()))?,
        ),
        None => None,
    };
    let paper_density = media
        .as_ref()
        .map_or(DEFAULT_PAPER_DENSITY, |m| m.base_density);

    let request =
        ResolutionRequest::from_options(options.resolution.as_deref(), options.quality.as_deref());
    let resolution = resolution::select(caps, &request, media.as_ref().map(|m| m.class))?;

    let inks = select_ink(caps, options.ink_type.as_deref(), options.color_mode)?;
    let ink = resolve_density(
        caps,
        resolution.printed_class(),
        paper_density,
        &options.density,
    )?;
    let plan = weave::plan(caps, &resolution, &inks, &options.weave);

    let page = page::compute(
        caps,
        &resolution,
        &plan,
        &PageRequest {
            paper: options.paper.clone(),
            feed: options.feed,
            full_bleed: options.full_bleed,
            disc: options.disc,
            image: options.image,
        },
    )?;

    let setup = JobSetup {
        model: model.to_string(),
        vertical_units: caps.vertical_units.max(resolution.printed_vres),
        resolution,
        media,
        inks,
        ink,
        plan,
        page,
    };
    info!(
        "{}: {} ({}x{}), ink {} drop {} density {:.3}, {:?} weave",
        setup.model,
        setup.resolution.name,
        setup.resolution.printed_hres,
        setup.resolution.printed_vres,
        setup.inks.name,
        setup.ink.drop_size,
        setup.ink.density,
        setup.plan.regime
    );
    Ok(setup)
}

/// Print one page: fetch every image row from `source` and emit passes.
pub fn print<S, E>(setup: &JobSetup, source: &mut S, encoder: E) -> Result<E>
where
    S: RowSource + ?Sized,
    E: ProtocolEncoder,
{
    let mut emitter = PassEmitter::new(setup, encoder);
    emitter.start_page()?;
    let mut rows = emitter.scan_rows();
    for y in 0..setup.page.image_height_rows {
        source.fetch(y, &mut rows)?;
        emitter.write_row(y, &mut rows)?;
    }
    emitter.finish()
}
