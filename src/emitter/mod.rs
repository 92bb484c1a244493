//! # Pass Emitter
//!
//! Drives the scanline loop: rows go in, passes come out.
//!
//! ## State Machine
//!
//! ```text
//!              write_row
//!             ┌────────┐
//!             ▼        │
//!      ┌──────────────┐   pass complete   ┌──────────┐
//!      │ Accumulating │ ────────────────► │ Flushing │
//!      └──────────────┘ ◄──────────────── └──────────┘
//!                         encoder returned
//! ```
//!
//! For every channel of every row, the weave schedule gives the
//! `oversample` (pass, slot, sub-pass) placements. The row is split into
//! its sub-pass columns and OR-ed into the pass buffer. A pass is flushed
//! once its last logical row has been written for every channel, i.e.
//! when `pass_last_row(p) ≤ y + min(head_offsets)`.
//!
//! ## Flushing
//!
//! Per channel with ink, in ink order:
//!
//! 1. `AdvanceVertical` if the head is not already at the pass start
//! 2. `SelectColor` if the channel differs from the last one selected
//! 3. `RasterBlock` with `max(lines, min_nozzles)` lines; lines past the
//!    last written slot are blank PackBits fill
//!
//! Dropping an emitter mid-page discards everything still buffered.

mod source;
mod state;

pub use source::{Pattern, RowSource, ScanRows, TestPattern};
pub use state::{EmitterPhase, PassState, VerticalScale};

use log::{debug, trace};

use self::state::PassBuffer;
use crate::error::Result;
use crate::ir::{ColorKey, Op, ProtocolEncoder};
use crate::job::JobSetup;
use crate::page::DiscMask;
use crate::raster::{apply_mask, is_blank, packbits, row_bytes, split_subpass};
use crate::weave::WeaveSchedule;

/// Turns image rows into passes for one job.
pub struct PassEmitter<'a, E: ProtocolEncoder> {
    setup: &'a JobSetup,
    encoder: E,
    state: PassState,
    schedule: WeaveSchedule,
    keys: Vec<ColorKey>,
    min_offset: i64,
    /// Uncompressed bytes per sub-pass line.
    line_bytes: usize,
    mask: Option<DiscMask>,
    mask_row: Vec<u8>,
    scratch: Vec<u8>,
}

impl<'a, E: ProtocolEncoder> PassEmitter<'a, E> {
    pub fn new(setup: &'a JobSetup, encoder: E) -> Self {
        let plan = &setup.plan;
        let schedule = WeaveSchedule::new(plan);
        let sub_width = setup
            .page
            .image_width_dots
            .div_ceil(plan.horizontal_passes.max(1));
        let line_bytes = row_bytes(sub_width, setup.ink.bits);
        let mask = setup.page.disc_mask();
        let mask_row = vec![0; mask.map_or(0, |m| m.row_len())];
        Self {
            setup,
            encoder,
            state: PassState::new(),
            schedule,
            keys: setup.channel_keys(),
            min_offset: i64::from(plan.head_offsets.iter().copied().min().unwrap_or(0)),
            line_bytes,
            mask,
            mask_row,
            scratch: vec![0; line_bytes],
        }
    }

    pub fn state(&self) -> &PassState {
        &self.state
    }

    /// Rows the source must provide per channel.
    pub fn scan_rows(&self) -> ScanRows {
        ScanRows::new(
            self.keys.len(),
            row_bytes(self.setup.page.image_width_dots, self.setup.ink.bits),
        )
    }

    /// Send the job setup ops.
    pub fn start_page(&mut self) -> Result<()> {
        let setup = self.setup;
        let res = &setup.resolution;
        self.encoder.encode(Op::SetResolution {
            hres: res.hres,
            vres: res.vres,
            printed_hres: res.printed_hres,
            printed_vres: res.printed_vres,
        })?;
        self.encoder.encode(Op::SetPrintMode {
            drop_size: setup.ink.drop_size,
            bits: setup.ink.bits,
            printer_weave: setup.plan.printer_weave(),
        })?;
        let to_units = |points: f64| {
            (points.max(0.0) * f64::from(setup.vertical_units) / 72.0).round() as u32
        };
        self.encoder.encode(Op::SetPageGeometry {
            page_length: to_units(setup.page.page_height.max(setup.page.page_bottom)),
            top: to_units(setup.page.page_top),
            bottom: to_units(setup.page.page_bottom),
        })
    }

    /// Buffer image row `y` and flush the passes it completes.
    pub fn write_row(&mut self, y: u32, rows: &mut ScanRows) -> Result<()> {
        let setup = self.setup;
        let plan = &setup.plan;
        let dots = setup.page.image_width_dots;
        let bits = setup.ink.bits;

        if let Some(mask) = &self.mask {
            mask.row(y, &mut self.mask_row);
            for (row, blank) in rows.channels.iter_mut().zip(rows.blank.iter_mut()) {
                if !*blank {
                    apply_mask(row, &self.mask_row, dots, bits);
                    *blank = is_blank(row);
                }
            }
        }

        for channel in 0..self.keys.len() {
            if rows.blank[channel] {
                continue;
            }
            let logical = i64::from(y) + i64::from(plan.head_offsets[channel]);
            for placement in self.schedule.placements(logical) {
                split_subpass(
                    &rows.channels[channel],
                    dots,
                    bits,
                    plan.horizontal_passes,
                    plan.vertical_passes,
                    placement.subpass,
                    &mut self.scratch,
                );
                if is_blank(&self.scratch) {
                    continue;
                }
                self.state
                    .pass_mut(placement.pass, self.keys.len())
                    .channel_mut(channel, self.schedule.jets(), self.line_bytes)?
                    .write(placement.slot, &self.scratch);
            }
        }

        let done = i64::from(y) + self.min_offset;
        let schedule = self.schedule;
        while let Some((pass, buffer)) = self
            .state
            .pop_ready(|p| schedule.pass_last_row(p) <= done)
        {
            self.flush_pass(pass, buffer)?;
        }
        Ok(())
    }

    /// Flush everything still buffered and hand back the encoder.
    ///
    /// Rows written last still sit in up to `max_head_offset` rows of
    /// buffered passes; they all go out here.
    pub fn finish(mut self) -> Result<E> {
        debug!(
            "end of page after pass {:?}: {} passes buffered, head offset up to {} rows",
            self.state.last_pass(),
            self.state.buffered(),
            self.setup.plan.max_head_offset
        );
        while let Some((pass, buffer)) = self.state.pop_ready(|_| true) {
            self.flush_pass(pass, buffer)?;
        }
        self.encoder.finish()?;
        Ok(self.encoder)
    }

    fn flush_pass(&mut self, pass: i64, buffer: PassBuffer) -> Result<()> {
        self.state.set_phase(EmitterPhase::Flushing);
        let setup = self.setup;
        let plan = &setup.plan;
        let start = self.schedule.pass_start(pass);
        let h = self.schedule.subpass_of(pass) % plan.horizontal_passes.max(1);
        let scale = VerticalScale {
            units: setup.vertical_units,
            rows: setup.resolution.printed_vres,
        };

        for (channel, lines) in buffer.active() {
            if let Some(op) = self.state.advance_to(
                start,
                setup.page.image_top_rows,
                plan.separation_rows,
                scale,
            ) {
                self.encoder.encode(op)?;
            }
            let key = self.keys[channel];
            if let Some(op) = self.state.select_color(key) {
                self.encoder.encode(op)?;
            }

            let mut data = Vec::new();
            for line in lines.iter_lines() {
                if is_blank(line) {
                    packbits::blank_line(self.line_bytes, &mut data);
                } else {
                    packbits::encode_into(line, &mut data);
                }
            }
            let count = lines.lines().max(plan.min_nozzles);
            for _ in lines.lines()..count {
                packbits::blank_line(self.line_bytes, &mut data);
            }
            trace!(
                "pass {} color {} start {} lines {} ({} padded), {} bytes",
                pass,
                key,
                start,
                count,
                count - lines.lines(),
                data.len()
            );
            self.encoder.encode(Op::RasterBlock {
                color: key,
                x: setup.page.image_left_dots + i64::from(h),
                lines: count,
                line_bytes: self.line_bytes as u32,
                data,
            })?;
        }

        self.state.finish_pass(pass);
        self.state.set_phase(EmitterPhase::Accumulating);
        Ok(())
    }
}
