//! # Inkpass - Inkjet Pass Scheduling Library
//!
//! Inkpass resolves print jobs for multi-nozzle inkjet printers and
//! schedules how the image is laid down in interleaved head passes. It
//! provides:
//!
//! - **Capability tables**: declarative per-model records loaded from JSON
//! - **Resolution selection**: named resolutions, quality tiers, media filters
//! - **Ink negotiation**: ink types and density/drop-size trade-offs
//! - **Weaving**: head regimes, nozzle geometry and the row-to-pass schedule
//! - **Page geometry**: margins, full bleed and the disc print mask
//! - **Pass emission**: buffered passes handed to a protocol encoder
//!
//! ## Quick Start
//!
//! ```
//! use inkpass::{
//!     CapabilityCatalog, JobOptions,
//!     emitter::{Pattern, TestPattern},
//!     ir::Program,
//!     page::ImageArea,
//! };
//!
//! let catalog = CapabilityCatalog::built_in()?;
//! let caps = catalog.get("demo-180")?;
//!
//! let options = JobOptions {
//!     resolution: Some("720x720".into()),
//!     media: Some("plain".into()),
//!     image: Some(ImageArea { left: 72.0, top: 72.0, width: 36.0, height: 36.0 }),
//!     ..Default::default()
//! };
//! let setup = inkpass::resolve("demo-180", caps, &options)?;
//!
//! let mut source = TestPattern::new(Pattern::Solid, setup.page.image_width_dots, setup.ink.bits);
//! let program = inkpass::print(&setup, &mut source, Program::new())?;
//! assert!(program.raster_blocks().count() > 0);
//!
//! # Ok::<(), inkpass::InkpassError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`printer`] | Capability tables and catalogs |
//! | [`media`] | Paper types, sizes and margins |
//! | [`resolution`] | Resolution selection |
//! | [`ink`] | Ink types and density negotiation |
//! | [`weave`] | Weave planning and scheduling |
//! | [`page`] | Page geometry and disc mask |
//! | [`raster`] | Packed rows and PackBits |
//! | [`ir`] | Printer operations and encoders |
//! | [`emitter`] | Scanline loop and pass buffers |
//! | [`job`] | Option resolution and printing |
//! | [`error`] | Error types |

pub mod emitter;
pub mod error;
pub mod ink;
pub mod ir;
pub mod job;
pub mod media;
pub mod page;
pub mod printer;
pub mod raster;
pub mod resolution;
pub mod weave;

// Re-exports for convenience
pub use error::{InkpassError, Result};
pub use job::{JobOptions, JobSetup, print, resolve};
pub use printer::{CapabilityCatalog, CapabilityTable};
