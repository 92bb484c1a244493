//! # Weave Schedule
//!
//! Maps each logical row to the passes that print it.
//!
//! With `O = horizontal × vertical` passes per row, `S` rows between
//! adjacent nozzles and `N` nozzles, each pass uses `A × O` nozzles and
//! advances the paper by `A` rows, where `A ≤ N / O` is the largest value
//! coprime with `S`. Pass `p` then covers rows
//!
//! ```text
//! p × A + k × S    for k in 0..A × O
//! ```
//!
//! and every row is hit by exactly `O` passes, each with a different
//! sub-pass. Pass numbers may be negative: the first passes start above
//! the image.
//!
//! A single-nozzle head (printer weave) degenerates to `O` consecutive
//! passes per row.

use serde::Serialize;

use super::WeavePlan;

/// Where one row lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Placement {
    pub pass: i64,
    /// Nozzle slot within the pass.
    pub slot: u32,
    /// Sub-pass the row is printed with, in `0..oversample`.
    pub subpass: u32,
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Pass layout derived from a [`WeavePlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaveSchedule {
    oversample: u32,
    separation: u32,
    /// Rows advanced per pass.
    advance: u32,
    /// Nozzles used per pass.
    jets: u32,
}

impl WeaveSchedule {
    pub fn new(plan: &WeavePlan) -> Self {
        let oversample = plan.oversample().max(1);
        let separation = plan.row_separation.max(1);
        let per = plan.nozzles / oversample;
        if plan.nozzles <= 1 || per == 0 {
            return Self {
                oversample,
                separation: 1,
                advance: 0,
                jets: 1,
            };
        }
        let mut advance = per;
        while advance > 1 && gcd(advance, separation) != 1 {
            advance -= 1;
        }
        Self {
            oversample,
            separation,
            advance,
            jets: advance * oversample,
        }
    }

    fn stacked(&self) -> bool {
        self.advance == 0
    }

    /// Nozzles used per pass.
    pub fn jets(&self) -> u32 {
        self.jets
    }

    pub fn oversample(&self) -> u32 {
        self.oversample
    }

    /// First logical row of pass `pass`.
    pub fn pass_start(&self, pass: i64) -> i64 {
        if self.stacked() {
            pass.div_euclid(i64::from(self.oversample))
        } else {
            pass * i64::from(self.advance)
        }
    }

    /// Last logical row of pass `pass`.
    pub fn pass_last_row(&self, pass: i64) -> i64 {
        self.pass_start(pass) + i64::from(self.jets - 1) * i64::from(self.separation)
    }

    /// Logical row printed by `slot` of `pass`.
    pub fn row_of(&self, pass: i64, slot: u32) -> i64 {
        self.pass_start(pass) + i64::from(slot) * i64::from(self.separation)
    }

    /// Sub-pass a pass prints.
    pub fn subpass_of(&self, pass: i64) -> u32 {
        let o = i64::from(self.oversample);
        if self.stacked() {
            pass.rem_euclid(o) as u32
        } else {
            pass.div_euclid(i64::from(self.separation)).rem_euclid(o) as u32
        }
    }

    /// The `oversample` placements of logical row `row`.
    pub fn placements(&self, row: i64) -> impl Iterator<Item = Placement> + '_ {
        let o = self.oversample;
        let base = if self.stacked() {
            None
        } else {
            let a = i64::from(self.advance);
            let s = i64::from(self.separation);
            (0..a).find(|k0| (row - k0 * s).rem_euclid(a) == 0)
        };
        (0..o).map(move |i| {
            if self.stacked() {
                let pass = row * i64::from(o) + i64::from(i);
                return Placement {
                    pass,
                    slot: 0,
                    subpass: i,
                };
            }
            let a = i64::from(self.advance);
            let s = i64::from(self.separation);
            let slot = base.unwrap_or(0) + i64::from(i) * a;
            let pass = (row - slot * s).div_euclid(a);
            Placement {
                pass,
                slot: slot as u32,
                subpass: self.subpass_of(pass),
            }
        })
    }
}
