//! Text trace of an op stream, one line per op.
//!
//! ```text
//! resolution 720x720 printed 720x720
//! mode drop=2 bits=2 weave=soft
//! page length=15840 top=720 bottom=14400
//! color 0
//! advance 1438
//! raster color=0 x=180 lines=180 bytes=765 packed=372
//! ```

use std::io::Write;

use super::{Op, ProtocolEncoder};
use crate::error::Result;

/// Writes a readable line per op.
pub struct TraceEncoder<W: Write> {
    out: W,
    ops: usize,
}

impl<W: Write> TraceEncoder<W> {
    pub fn new(out: W) -> Self {
        Self { out, ops: 0 }
    }

    /// Ops written so far.
    pub fn ops(&self) -> usize {
        self.ops
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProtocolEncoder for TraceEncoder<W> {
    fn encode(&mut self, op: Op) -> Result<()> {
        match op {
            Op::SetResolution {
                hres,
                vres,
                printed_hres,
                printed_vres,
            } => writeln!(
                self.out,
                "resolution {}x{} printed {}x{}",
                hres, vres, printed_hres, printed_vres
            )?,
            Op::SetPrintMode {
                drop_size,
                bits,
                printer_weave,
            } => writeln!(
                self.out,
                "mode drop={} bits={} weave={}",
                drop_size,
                bits,
                if printer_weave { "printer" } else { "soft" }
            )?,
            Op::SetPageGeometry {
                page_length,
                top,
                bottom,
            } => writeln!(
                self.out,
                "page length={} top={} bottom={}",
                page_length, top, bottom
            )?,
            Op::SelectColor(key) => writeln!(self.out, "color {}", key)?,
            Op::AdvanceVertical { units } => writeln!(self.out, "advance {}", units)?,
            Op::RasterBlock {
                color,
                x,
                lines,
                line_bytes,
                data,
            } => writeln!(
                self.out,
                "raster color={} x={} lines={} bytes={} packed={}",
                color,
                x,
                lines,
                line_bytes,
                data.len()
            )?,
        }
        self.ops += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
