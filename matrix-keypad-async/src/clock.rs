//! Millisecond time source used to pace the poll loop.

use embassy_time::Instant;

/// A free-running millisecond counter.
///
/// The value wraps at `u32::MAX`; the keypad only ever looks at differences computed
/// with `wrapping_sub`.
pub trait Clock {
    fn now_millis(&self) -> u32;
}

/// [`Clock`] backed by the embassy time driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_millis(&self) -> u32 {
        // Truncation is the intended wrap.
        Instant::now().as_millis() as u32
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> u32 {
        (**self).now_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_time::{Duration, MockDriver};

    #[test]
    fn embassy_clock_follows_time_driver() {
        let driver = MockDriver::get();
        let start = EmbassyClock.now_millis();

        driver.advance(Duration::from_millis(25));

        assert_eq!(EmbassyClock.now_millis().wrapping_sub(start), 25);
    }
}
