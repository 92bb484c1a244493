//! # Printer Operation Stream
//!
//! This module provides the op layer between the pass emitter and the
//! device protocol. The emitter produces [`Op`]s; a [`ProtocolEncoder`]
//! turns them into whatever the output needs.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐
//! │ PassEmitter │ ──► │  Op stream  │ ──► │ ProtocolEncoder │
//! │  (passes)   │     │             │     │ (bytes / trace) │
//! └─────────────┘     └─────────────┘     └─────────────────┘
//! ```
//!
//! Two encoders ship with the crate:
//!
//! - [`Program`]: records ops in memory (tests, inspection)
//! - [`TraceEncoder`]: writes one text line per op to any `io::Write`
//!
//! ## Example
//!
//! ```
//! use inkpass::ir::{ColorKey, Op, Program, ProtocolEncoder};
//!
//! let mut program = Program::new();
//! program
//!     .encode(Op::SelectColor(ColorKey { color: 0, subchannel: None }))
//!     .unwrap();
//! assert_eq!(program.state_changes(), 1);
//! ```

mod ops;
mod trace;

pub use ops::*;
pub use trace::TraceEncoder;

use crate::error::Result;

/// Consumer of the op stream.
///
/// Errors are treated as device I/O failures: the emitter stops and
/// propagates them without retrying.
pub trait ProtocolEncoder {
    fn encode(&mut self, op: Op) -> Result<()>;

    /// Called once after the last op of a job.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<E: ProtocolEncoder + ?Sized> ProtocolEncoder for &mut E {
    fn encode(&mut self, op: Op) -> Result<()> {
        (**self).encode(op)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

impl ProtocolEncoder for Program {
    fn encode(&mut self, op: Op) -> Result<()> {
        self.push(op);
        Ok(())
    }
}
