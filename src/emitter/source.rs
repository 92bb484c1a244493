//! Row sources feeding the pass emitter.
//!
//! A source fills one packed row per physical channel for each image row,
//! plus a blank flag per channel that lets the emitter skip work.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::raster::{is_blank, row_bytes, set_dot};

/// One image row for every physical channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRows {
    /// Packed dot rows in ink order.
    pub channels: Vec<Vec<u8>>,
    /// Channel carries no ink on this row.
    pub blank: Vec<bool>,
}

impl ScanRows {
    pub fn new(channels: usize, row_len: usize) -> Self {
        Self {
            channels: vec![vec![0; row_len]; channels],
            blank: vec![true; channels],
        }
    }

    /// Recompute blank flags from the row contents.
    pub fn refresh_blank(&mut self) {
        for (blank, row) in self.blank.iter_mut().zip(&self.channels) {
            *blank = is_blank(row);
        }
    }

    pub fn clear(&mut self) {
        for row in &mut self.channels {
            row.fill(0);
        }
        self.blank.fill(true);
    }
}

/// Supplier of dithered rows.
pub trait RowSource {
    /// Fill `rows` with image row `y`.
    fn fetch(&mut self, y: u32, rows: &mut ScanRows) -> Result<()>;
}

impl<F> RowSource for F
where
    F: FnMut(u32, &mut ScanRows) -> Result<()>,
{
    fn fetch(&mut self, y: u32, rows: &mut ScanRows) -> Result<()> {
        self(y, rows)
    }
}

/// Synthetic patterns for simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// Every dot of every channel at full drop.
    #[default]
    Solid,
    /// Horizontal bands, one channel at a time.
    Bands,
    /// Nothing.
    Blank,
}

/// Rows in each band of [`Pattern::Bands`].
const BAND_ROWS: u32 = 32;

/// A [`RowSource`] drawing a [`Pattern`].
#[derive(Debug, Clone)]
pub struct TestPattern {
    pattern: Pattern,
    width: u32,
    bits: u8,
}

impl TestPattern {
    pub fn new(pattern: Pattern, width: u32, bits: u8) -> Self {
        Self {
            pattern,
            width,
            bits,
        }
    }

    fn fill_solid(&self, row: &mut [u8]) {
        let full = (1u8 << self.bits) - 1;
        for x in 0..self.width as usize {
            set_dot(row, x, self.bits, full);
        }
    }
}

impl RowSource for TestPattern {
    fn fetch(&mut self, y: u32, rows: &mut ScanRows) -> Result<()> {
        rows.clear();
        let count = rows.channels.len() as u32;
        for (c, row) in rows.channels.iter_mut().enumerate() {
            debug_assert_eq!(row.len(), row_bytes(self.width, self.bits));
            let inked = match self.pattern {
                Pattern::Solid => true,
                Pattern::Bands => count > 0 && (y / BAND_ROWS) % count == c as u32,
                Pattern::Blank => false,
            };
            if inked {
                self.fill_solid(row);
            }
        }
        rows.refresh_blank();
        Ok(())
    }
}
