//! # Printer Operations
//!
//! The abstract operations the pass emitter hands to a protocol encoder.
//!
//! ## Design Philosophy
//!
//! The emitter never produces device bytes. It produces a sequence of ops:
//!
//! ```text
//! WeavePlan + PageGeometry + rows → PassEmitter → Op stream → ProtocolEncoder → bytes
//! ```
//!
//! Each op is a single, atomic device command. State ops (`SelectColor`,
//! `AdvanceVertical`) are only emitted when the device state actually
//! changes.

use serde::Serialize;

/// Identifies one physical nozzle row for the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ColorKey {
    /// Device color id.
    pub color: u8,
    /// Device sub-channel id, if the color has light/dark variants.
    pub subchannel: Option<u8>,
}

impl std::fmt::Display for ColorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.subchannel {
            Some(sub) => write!(f, "{}.{}", self.color, sub),
            None => write!(f, "{}", self.color),
        }
    }
}

/// A single printer operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    // ===== Job setup =====
    /// Set the requested and printed resolution.
    SetResolution {
        hres: u32,
        vres: u32,
        printed_hres: u32,
        printed_vres: u32,
    },

    /// Drop size, bit depth and weave mode.
    SetPrintMode {
        drop_size: u8,
        bits: u8,
        printer_weave: bool,
    },

    /// Page length and vertical margins, in vertical units.
    SetPageGeometry {
        page_length: u32,
        top: u32,
        bottom: u32,
    },

    // ===== Per-pass state =====
    /// Select the nozzle row that following raster blocks use.
    SelectColor(ColorKey),

    /// Move the paper by `units` vertical units (may be negative for the
    /// first pass when rows above the image are skipped).
    AdvanceVertical { units: i64 },

    // ===== Raster =====
    /// PackBits-compressed raster lines for one pass of one nozzle row.
    RasterBlock {
        color: ColorKey,
        /// Horizontal start in printed dots.
        x: i64,
        /// Lines in the block (nozzles engaged, including padding).
        lines: u32,
        /// Uncompressed bytes per line.
        line_bytes: u32,
        data: Vec<u8>,
    },
}

impl Op {
    /// Whether this op only changes device state.
    pub fn is_state_change(&self) -> bool {
        matches!(self, Op::SelectColor(_) | Op::AdvanceVertical { .. })
    }
}

/// A recorded sequence of ops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Add an op to the program.
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Get the number of ops in the program.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the program is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate over ops.
    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }

    /// Raster blocks only.
    pub fn raster_blocks(&self) -> impl Iterator<Item = &Op> {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::RasterBlock { .. }))
    }

    /// Number of state-change ops.
    pub fn state_changes(&self) -> usize {
        self.ops.iter().filter(|op| op.is_state_change()).count()
    }
}

impl FromIterator<Op> for Program {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Program {
    type Item = Op;
    type IntoIter = std::vec::IntoIter<Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: ColorKey = ColorKey {
        color: 0,
        subchannel: None,
    };

    #[test]
    fn test_program_new() {
        let program = Program::new();
        assert!(program.is_empty());
    }

    #[test]
    fn test_program_push() {
        let mut program = Program::new();
        program.push(Op::SelectColor(BLACK));
        program.push(Op::AdvanceVertical { units: 4 });
        program.push(Op::RasterBlock {
            color: BLACK,
            x: 0,
            lines: 1,
            line_bytes: 1,
            data: vec![0, 0],
        });
        assert_eq!(program.len(), 3);
        assert_eq!(program.state_changes(), 2);
        assert_eq!(program.raster_blocks().count(), 1);
    }

    #[test]
    fn test_color_key_display() {
        assert_eq!(BLACK.to_string(), "0");
        let light_cyan = ColorKey {
            color: 2,
            subchannel: Some(1),
        };
        assert_eq!(light_cyan.to_string(), "2.1");
    }

    #[test]
    fn test_op_serializes_tagged() {
        let json = serde_json::to_string(&Op::AdvanceVertical { units: -3 }).unwrap();
        assert_eq!(json, r#"{"op":"advance_vertical","units":-3}"#);
    }
}
