//! Job-scoped emitter state: buffered passes and the device state last
//! sent to the encoder.

use std::collections::BTreeMap;

use crate::error::{InkpassError, Result};
use crate::ir::{ColorKey, Op};

/// Where the emitter is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitterPhase {
    /// Writing rows into pass buffers.
    #[default]
    Accumulating,
    /// Handing a complete pass to the encoder.
    Flushing,
}

/// One nozzle row's lines for one pass.
#[derive(Debug)]
pub(crate) struct ChannelBuffer {
    data: Vec<u8>,
    line_bytes: usize,
    /// Last written slot + 1.
    lines: u32,
}

impl ChannelBuffer {
    fn new(jets: u32, line_bytes: usize) -> Result<Self> {
        let len = (jets as usize).checked_mul(line_bytes).ok_or_else(|| {
            InkpassError::ResourceExhausted(format!("{} lines of {} bytes", jets, line_bytes))
        })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            InkpassError::ResourceExhausted(format!("pass buffer of {} bytes: {}", len, e))
        })?;
        data.resize(len, 0);
        Ok(Self {
            data,
            line_bytes,
            lines: 0,
        })
    }

    pub(crate) fn write(&mut self, slot: u32, line: &[u8]) {
        let start = slot as usize * self.line_bytes;
        let dst = &mut self.data[start..start + self.line_bytes];
        for (d, s) in dst.iter_mut().zip(line) {
            *d |= s;
        }
        self.lines = self.lines.max(slot + 1);
    }

    pub(crate) fn lines(&self) -> u32 {
        self.lines
    }

    /// Written lines, in slot order.
    pub(crate) fn iter_lines(&self) -> impl Iterator<Item = &[u8]> {
        self.data
            .chunks(self.line_bytes.max(1))
            .take(self.lines as usize)
    }
}

/// All channels of one pass. Channels without ink stay unallocated.
#[derive(Debug)]
pub(crate) struct PassBuffer {
    channels: Vec<Option<ChannelBuffer>>,
}

impl PassBuffer {
    fn new(channels: usize) -> Self {
        Self {
            channels: (0..channels).map(|_| None).collect(),
        }
    }

    pub(crate) fn channel_mut(
        &mut self,
        channel: usize,
        jets: u32,
        line_bytes: usize,
    ) -> Result<&mut ChannelBuffer> {
        let buffer = match self.channels[channel].take() {
            Some(buffer) => buffer,
            None => ChannelBuffer::new(jets, line_bytes)?,
        };
        Ok(self.channels[channel].insert(buffer))
    }

    /// Channels holding ink, in ink order.
    pub(crate) fn active(&self) -> impl Iterator<Item = (usize, &ChannelBuffer)> {
        self.channels
            .iter()
            .enumerate()
            .filter_map(|(c, b)| b.as_ref().map(|b| (c, b)))
    }
}

/// Vertical movement per printed row, as a ratio of device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerticalScale {
    /// Device vertical units per inch.
    pub units: u32,
    /// Printed rows per inch.
    pub rows: u32,
}

impl VerticalScale {
    fn to_units(self, rows: i64) -> i64 {
        rows * i64::from(self.units) / i64::from(self.rows.max(1))
    }
}

/// Mutable job state.
#[derive(Debug, Default)]
pub struct PassState {
    last_color: Option<ColorKey>,
    last_pass_offset: Option<i64>,
    last_pass: Option<i64>,
    passes: BTreeMap<i64, PassBuffer>,
    phase: EmitterPhase,
}

impl PassState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> EmitterPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: EmitterPhase) {
        self.phase = phase;
    }

    /// Most recently flushed pass.
    pub fn last_pass(&self) -> Option<i64> {
        self.last_pass
    }

    pub(crate) fn finish_pass(&mut self, pass: i64) {
        self.last_pass = Some(pass);
    }

    /// Passes currently buffered.
    pub fn buffered(&self) -> usize {
        self.passes.len()
    }

    /// Color selection, if it differs from the last one sent.
    pub fn select_color(&mut self, key: ColorKey) -> Option<Op> {
        if self.last_color == Some(key) {
            return None;
        }
        self.last_color = Some(key);
        Some(Op::SelectColor(key))
    }

    /// Vertical advance to a pass starting at logical row `start`, if the
    /// head is not already there.
    ///
    /// The first advance is measured from the page top (`top_rows` rows
    /// above the image); later ones from the previous pass start. Both
    /// subtract `separation_rows - 1`.
    pub fn advance_to(
        &mut self,
        start: i64,
        top_rows: i64,
        separation_rows: u32,
        scale: VerticalScale,
    ) -> Option<Op> {
        if self.last_pass_offset == Some(start) {
            return None;
        }
        let correction = i64::from(separation_rows.max(1)) - 1;
        let rows = match self.last_pass_offset {
            None => start + top_rows - correction,
            Some(last) => start - last - correction,
        };
        self.last_pass_offset = Some(start);
        Some(Op::AdvanceVertical {
            units: scale.to_units(rows),
        })
    }

    pub(crate) fn pass_mut(&mut self, pass: i64, channels: usize) -> &mut PassBuffer {
        self.passes
            .entry(pass)
            .or_insert_with(|| PassBuffer::new(channels))
    }

    /// Lowest buffered pass, if `ready` accepts it.
    pub(crate) fn pop_ready(&mut self, ready: impl Fn(i64) -> bool) -> Option<(i64, PassBuffer)> {
        let (&first, _) = self.passes.first_key_value()?;
        if ready(first) {
            self.passes.pop_first()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALE: VerticalScale = VerticalScale {
        units: 1440,
        rows: 720,
    };

    fn key(color: u8) -> ColorKey {
        ColorKey {
            color,
            subchannel: None,
        }
    }

    #[test]
    fn test_color_suppression() {
        let mut state = PassState::new();
        assert_eq!(state.select_color(key(1)), Some(Op::SelectColor(key(1))));
        assert_eq!(state.select_color(key(1)), None);
        assert_eq!(state.select_color(key(2)), Some(Op::SelectColor(key(2))));
        assert_eq!(state.select_color(key(2)), None);
    }

    #[test]
    fn test_vertical_suppression() {
        let mut state = PassState::new();
        assert_eq!(
            state.advance_to(0, 100, 1, SCALE),
            Some(Op::AdvanceVertical { units: 200 })
        );
        assert_eq!(state.advance_to(0, 100, 1, SCALE), None);
        assert_eq!(
            state.advance_to(179, 100, 1, SCALE),
            Some(Op::AdvanceVertical { units: 358 })
        );
        assert_eq!(state.advance_to(179, 100, 1, SCALE), None);
    }

    #[test]
    fn test_separation_rows_correction() {
        let mut state = PassState::new();
        assert_eq!(
            state.advance_to(-10, 4, 3, SCALE),
            Some(Op::AdvanceVertical { units: -16 })
        );
        assert_eq!(
            state.advance_to(10, 4, 3, SCALE),
            Some(Op::AdvanceVertical { units: 36 })
        );
    }

    #[test]
    fn test_channel_buffer_lines() {
        let mut buffer = ChannelBuffer::new(4, 2).unwrap();
        assert_eq!(buffer.lines(), 0);
        buffer.write(2, &[0xF0, 0x01]);
        assert_eq!(buffer.lines(), 3);
        let lines: Vec<&[u8]> = buffer.iter_lines().collect();
        assert_eq!(lines, vec![&[0u8, 0][..], &[0, 0][..], &[0xF0, 0x01][..]]);
    }

    #[test]
    fn test_oversized_buffer_fails() {
        let err = ChannelBuffer::new(u32::MAX, usize::MAX / 2).unwrap_err();
        assert!(matches!(err, InkpassError::ResourceExhausted(_)));
        let err = ChannelBuffer::new(1, usize::MAX).unwrap_err();
        assert!(matches!(err, InkpassError::ResourceExhausted(_)));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_pop_ready_in_order() {
        let mut state = PassState::new();
        state.pass_mut(5, 1);
        state.pass_mut(-2, 1);
        state.pass_mut(3, 1);
        assert_eq!(state.buffered(), 3);
        assert_eq!(state.pop_ready(|p| p < 4).map(|(p, _)| p), Some(-2));
        assert_eq!(state.pop_ready(|p| p < 4).map(|(p, _)| p), Some(3));
        assert!(state.pop_ready(|p| p < 4).is_none());
        assert_eq!(state.buffered(), 1);
    }
}
