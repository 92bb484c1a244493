//! # Weaving
//!
//! How rows are distributed over print-head passes.
//!
//! ## Modules
//!
//! - [`plan`]: Head regime, nozzle geometry, pass counts and head offsets
//! - [`schedule`]: Row to (pass, nozzle slot, sub-pass) mapping

pub mod plan;
pub mod schedule;

pub use plan::{HeadRegime, WeaveOptions, WeavePlan, plan};
pub use schedule::{Placement, WeaveSchedule};
