//! Flap-to-step conversion with fractional carry
//!
//! A flap is not a whole number of motor steps (e.g. 2038 / 45 = 45.288...).
//! Truncating every move would lose about a quarter step per flap and the
//! drum would drift a full flap within a few revolutions. The accumulator
//! keeps the discarded fraction and pays it back as one extra step whenever
//! it exceeds a whole step.

/// Fractional step carry for one drum.
///
/// Invariant: `carry` stays within `[0.0, 1.0]`, so the total number of steps
/// issued never differs from the exact total by more than one step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepAccumulator {
    carry: f32,
}

impl StepAccumulator {
    /// Create an accumulator with no carry.
    pub const fn new() -> Self {
        Self { carry: 0.0 }
    }

    /// Whole steps to issue for a move of `precise` (non-negative) steps.
    pub fn steps_for(&mut self, precise: f32) -> i32 {
        let whole = precise as i32;
        self.carry += precise - whole as f32;
        if self.carry > 1.0 {
            self.carry -= 1.0;
            whole + 1
        } else {
            whole
        }
    }

    /// Whole steps for moving `flaps` flaps at `steps_per_flap`.
    #[inline]
    pub fn steps_for_flaps(&mut self, flaps: u16, steps_per_flap: f32) -> i32 {
        self.steps_for(f32::from(flaps) * steps_per_flap)
    }

    /// Current fractional carry.
    pub fn carry(&self) -> f32 {
        self.carry
    }

    /// Drop the carry. Done when the drum is re-anchored at the marker.
    pub fn reset(&mut self) {
        self.carry = 0.0;
    }
}
