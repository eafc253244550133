//! Hall sensor glitch filter
//!
//! At the designed rotation speed the marker takes well over 100 ms to pass
//! the sensor, so two genuine transitions can never be closer than that.
//! Anything faster is electrical noise: it is rejected and reported so the
//! owning unit can be re-anchored.

use crate::traits::HallLevel;

/// Default minimum spacing between accepted transitions (ms).
pub const DEFAULT_GLITCH_WINDOW_MS: u32 = 100;

/// Result of feeding one raw sample through the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HallUpdate {
    /// Sample matches the filtered level
    Unchanged,
    /// Transition accepted and timestamped
    Accepted(HallLevel),
    /// Transition rejected as noise; filtered level kept
    Glitch {
        /// Time since the previous accepted transition (ms)
        since_ms: u64,
    },
}

/// Per-unit debounce state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HallFilter {
    level: HallLevel,
    last_change_ms: Option<u64>,
    window_ms: u32,
}

impl HallFilter {
    /// Filter starting clear with no accepted transition yet.
    pub const fn new(window_ms: u32) -> Self {
        Self {
            level: HallLevel::Clear,
            last_change_ms: None,
            window_ms,
        }
    }

    /// Set the boot level without timestamping it.
    ///
    /// The first real transition after seeding is always accepted.
    pub fn seed(&mut self, level: HallLevel) {
        self.level = level;
        self.last_change_ms = None;
    }

    /// Feed a raw sample taken at `now_ms`.
    pub fn update(&mut self, raw: HallLevel, now_ms: u64) -> HallUpdate {
        if raw == self.level {
            return HallUpdate::Unchanged;
        }

        if let Some(last) = self.last_change_ms {
            let since_ms = now_ms.saturating_sub(last);
            if since_ms < u64::from(self.window_ms) {
                return HallUpdate::Glitch { since_ms };
            }
        }

        self.level = raw;
        self.last_change_ms = Some(now_ms);
        HallUpdate::Accepted(raw)
    }

    /// Filtered level.
    pub fn level(&self) -> HallLevel {
        self.level
    }

    /// Time of the last accepted transition, if any.
    pub fn last_change_ms(&self) -> Option<u64> {
        self.last_change_ms
    }
}

impl Default for HallFilter {
    fn default() -> Self {
        Self::new(DEFAULT_GLITCH_WINDOW_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_transition_after_seed_is_accepted() {
        let mut filter = HallFilter::default();
        filter.seed(HallLevel::Clear);

        assert_eq!(
            filter.update(HallLevel::Detected, 3),
            HallUpdate::Accepted(HallLevel::Detected)
        );
        assert_eq!(filter.level(), HallLevel::Detected);
        assert_eq!(filter.last_change_ms(), Some(3));
    }

    #[test]
    fn test_same_level_is_unchanged() {
        let mut filter = HallFilter::default();
        assert_eq!(filter.update(HallLevel::Clear, 10), HallUpdate::Unchanged);
        assert_eq!(filter.last_change_ms(), None);
    }

    #[test]
    fn test_fast_transition_is_rejected() {
        let mut filter = HallFilter::default();
        assert!(matches!(
            filter.update(HallLevel::Detected, 1_000),
            HallUpdate::Accepted(_)
        ));

        assert_eq!(
            filter.update(HallLevel::Clear, 1_099),
            HallUpdate::Glitch { since_ms: 99 }
        );
        // Level and timestamp untouched by the glitch
        assert_eq!(filter.level(), HallLevel::Detected);
        assert_eq!(filter.last_change_ms(), Some(1_000));
    }

    #[test]
    fn test_transition_at_window_is_accepted() {
        let mut filter = HallFilter::default();
        filter.update(HallLevel::Detected, 1_000);
        assert_eq!(
            filter.update(HallLevel::Clear, 1_100),
            HallUpdate::Accepted(HallLevel::Clear)
        );
    }

    #[test]
    fn test_two_fast_transitions_never_both_accepted() {
        for gap in 0..100u64 {
            let mut filter = HallFilter::default();
            filter.update(HallLevel::Detected, 500);

            let first = filter.update(HallLevel::Clear, 1_000);
            let second = filter.update(HallLevel::Detected, 1_000 + gap);
            let accepted = [first, second]
                .iter()
                .filter(|u| matches!(u, HallUpdate::Accepted(_)))
                .count();
            assert!(accepted <= 1, "gap {} accepted both", gap);
        }
    }

    #[test]
    fn test_custom_window() {
        let mut filter = HallFilter::new(20);
        filter.update(HallLevel::Detected, 0);
        assert!(matches!(
            filter.update(HallLevel::Clear, 25),
            HallUpdate::Accepted(_)
        ));
    }
}
