//! # Printer Module
//!
//! This module provides per-model capability records and the catalog they
//! are loaded from.
//!
//! ## Modules
//!
//! - [`capability`]: Capability record of one printer model
//! - [`catalog`]: Capability documents keyed by model id

pub mod capability;
pub mod catalog;

pub use capability::{CapabilityTable, ClassCaps, HeadGeometry, ResolutionClass};
pub use catalog::CapabilityCatalog;
