//! # Raster Helpers
//!
//! Bit-level row handling used by the pass emitter.
//!
//! ## Modules
//!
//! - [`row`]: Packed dot rows, masks and sub-pass splitting
//! - [`packbits`]: PackBits line compression

pub mod packbits;
pub mod row;

pub use row::{apply_mask, get_dot, is_blank, row_bytes, set_dot, split_subpass};
