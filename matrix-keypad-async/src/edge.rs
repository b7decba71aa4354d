//! New-press detection between consecutive scans.

/// Tracks the previous raw mask and derives the single newly pressed key from it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDetector {
    previous: u16,
    candidate: u16,
}

impl EdgeDetector {
    pub const fn new() -> Self {
        Self {
            previous: 0,
            candidate: 0,
        }
    }

    /// Feeds a validated raw mask and returns the resulting candidate.
    ///
    /// - idle clears both the previous mask and the candidate
    /// - an unchanged mask keeps the candidate
    /// - exactly one new bit becomes the candidate
    /// - no new bit (a release) clears the candidate
    /// - several new bits at once (a chord) keep the old candidate
    pub fn feed(&mut self, mask: u16) -> u16 {
        if mask == 0 {
            self.clear();
            return 0;
        }
        if mask == self.previous {
            return self.candidate;
        }

        let new_bits = mask & !self.previous;
        match new_bits.count_ones() {
            0 => self.candidate = 0,
            1 => self.candidate = new_bits,
            _ => {}
        }
        self.previous = mask;
        self.candidate
    }

    pub fn clear(&mut self) {
        self.previous = 0;
        self.candidate = 0;
    }

    pub fn candidate(&self) -> u16 {
        self.candidate
    }

    pub fn previous(&self) -> u16 {
        self.previous
    }
}
