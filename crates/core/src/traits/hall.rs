//! Hall sensor source and edge notification
//!
//! Each drum carries one magnet; a hall sensor per unit reports whether the
//! magnet is in front of it. Sensors sit behind a port expander whose shared
//! interrupt line fires on any change.
//!
//! The interrupt handler only raises an [`EdgeLatch`]. The control loop takes
//! the latch once per tick and performs the actual port read, so unit state
//! is never touched from interrupt context.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::MAX_UNITS;

/// Filtered or raw hall sensor level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HallLevel {
    /// Marker in front of the sensor (raw 0, active low)
    Detected,
    /// No marker (raw 1)
    Clear,
}

impl HallLevel {
    /// Decode an active-low raw sample: 0 = detected, anything else = clear.
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        if raw == 0 {
            HallLevel::Detected
        } else {
            HallLevel::Clear
        }
    }

    /// Encode as the active-low raw value.
    #[inline]
    pub const fn raw(self) -> u8 {
        match self {
            HallLevel::Detected => 0,
            HallLevel::Clear => 1,
        }
    }

    /// Whether the marker is in front of the sensor.
    #[inline]
    pub const fn is_detected(self) -> bool {
        matches!(self, HallLevel::Detected)
    }
}

/// Point-in-time hall sensor sampling.
///
/// Only called from the control loop after an [`EdgeLatch`] was observed,
/// plus once at boot to seed the filters.
pub trait HallSensor {
    /// Latch a fresh snapshot before a round of per-unit reads.
    ///
    /// Sources that sample all sensors in one bus transfer do it here.
    fn refresh(&mut self) {}

    /// Sample the sensor of `unit`.
    fn read(&mut self, unit: u8) -> HallLevel;
}

/// Single-producer/single-consumer edge notification.
///
/// Raised from the sensor interrupt, taken by the control loop. Multiple
/// raises between two takes collapse into one, which is fine because the
/// loop re-reads every unit's sensor on each take.
#[derive(Debug, Default)]
pub struct EdgeLatch {
    raised: AtomicBool,
}

impl EdgeLatch {
    /// Create a lowered latch. Usable in `static` context.
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    /// Signal that at least one sensor changed. Interrupt-safe.
    #[inline]
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Consume a pending notification. Returns `true` at most once per raise.
    #[inline]
    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }

    /// Whether a notification is pending, without consuming it.
    #[inline]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}

/// Mock hall sensor bank for host tests.
///
/// All sensors start clear. Reads are counted so tests can verify that
/// sampling only happens after an edge.
#[derive(Debug, Clone)]
pub struct MockHall {
    levels: [HallLevel; MAX_UNITS],
    reads: u32,
}

impl MockHall {
    /// All sensors clear.
    pub fn new() -> Self {
        Self {
            levels: [HallLevel::Clear; MAX_UNITS],
            reads: 0,
        }
    }

    /// Set the level the next read of `unit` will return.
    pub fn set(&mut self, unit: u8, level: HallLevel) {
        if let Some(slot) = self.levels.get_mut(unit as usize) {
            *slot = level;
        }
    }

    /// Number of reads performed so far.
    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl Default for MockHall {
    fn default() -> Self {
        Self::new()
    }
}

impl HallSensor for MockHall {
    fn read(&mut self, unit: u8) -> HallLevel {
        self.reads += 1;
        self.levels
            .get(unit as usize)
            .copied()
            .unwrap_or(HallLevel::Clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_raw_round_trip() {
        assert_eq!(HallLevel::from_raw(0), HallLevel::Detected);
        assert_eq!(HallLevel::from_raw(1), HallLevel::Clear);
        assert_eq!(HallLevel::from_raw(0xFF), HallLevel::Clear);
        assert_eq!(HallLevel::Detected.raw(), 0);
        assert_eq!(HallLevel::Clear.raw(), 1);
    }

    #[test]
    fn test_edge_latch_take_once() {
        let latch = EdgeLatch::new();
        assert!(!latch.take());

        latch.raise();
        latch.raise();
        assert!(latch.is_raised());
        assert!(latch.take());
        assert!(!latch.take());
    }

    #[test]
    fn test_mock_hall_levels() {
        let mut hall = MockHall::new();
        hall.set(3, HallLevel::Detected);

        assert_eq!(hall.read(3), HallLevel::Detected);
        assert_eq!(hall.read(2), HallLevel::Clear);
        assert_eq!(hall.read(200), HallLevel::Clear);
        assert_eq!(hall.reads(), 3);
    }
}
