//! Stability window between the edge detector's candidate and the reported reading.
//!
//! The debouncer runs once per poll before the scan, so it always judges the candidate
//! produced by the previous poll. A candidate is promoted once it has been seen unchanged
//! while the counter climbs past the threshold. The comparison is strict, so a press
//! needs `threshold + 2` consecutive evaluations counted from the first one that sees the
//! candidate, and a release to idle needs `RELEASE_FACTOR * threshold + 2`.

use crate::conf::RELEASE_FACTOR;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    threshold: u8,
    counter: u16,
    last_seen: u16,
}

impl Debouncer {
    pub const fn new(threshold: u8) -> Self {
        Self {
            threshold,
            counter: 0,
            last_seen: 0,
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: u8) {
        self.threshold = threshold;
    }

    /// Forgets any window in progress and treats `last_seen` as the latest candidate.
    pub fn restart(&mut self, last_seen: u16) {
        self.counter = 0;
        self.last_seen = last_seen;
    }

    /// Returns the mask to report when `candidate` has settled.
    pub fn debounce(&mut self, candidate: u16, confirmed: u16) -> Option<u16> {
        if candidate == confirmed {
            self.counter = 0;
            return None;
        }
        if candidate != self.last_seen {
            self.counter = 0;
            self.last_seen = candidate;
            return None;
        }

        self.counter = self.counter.saturating_add(1);
        let limit = if candidate != 0 {
            u16::from(self.threshold)
        } else {
            u16::from(self.threshold) * RELEASE_FACTOR
        };
        (self.counter > limit).then_some(candidate)
    }
}
