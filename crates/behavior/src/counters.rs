//! Consecutive-frame counters

use serde::{Deserialize, Serialize};

/// Per-modality debounce counters
///
/// Each counter holds the number of consecutive ticks its condition has held
/// and drops to zero the first tick it does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DebounceCounters {
    pub frames_no_face: u32,
    pub frames_looking_away: u32,
    pub frames_pitch_violation: u32,
}

impl DebounceCounters {
    /// Advance or clear a counter; returns true once it exceeds `max_frames`
    pub fn track(counter: &mut u32, condition: bool, max_frames: u32) -> bool {
        if condition {
            *counter = counter.saturating_add(1);
            *counter > max_frames
        } else {
            *counter = 0;
            false
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_fires_after_threshold() {
        let mut counter = 0;
        let fired: Vec<bool> = (0..5)
            .map(|_| DebounceCounters::track(&mut counter, true, 3))
            .collect();

        assert_eq!(fired, vec![false, false, false, true, true]);
        assert_eq!(counter, 5);
    }

    #[test]
    fn test_track_resets_immediately() {
        let mut counter = 7;
        assert!(!DebounceCounters::track(&mut counter, false, 3));
        assert_eq!(counter, 0);
    }
}
