//! Runtime parameters of the keypad state machine.

/// Poll period used when none is configured, in milliseconds.
pub const DEFAULT_POLL_PERIOD_MS: u32 = 10;

/// Debounce count used when none is configured.
pub const DEFAULT_DEBOUNCE_COUNT: u8 = 1;

/// Release to idle waits this many times longer than a press.
pub const RELEASE_FACTOR: u16 = 3;

/// Configuration of a [`Keypad`](crate::Keypad).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Minimum time between two scans. Faster `update()` calls are no-ops.
    pub poll_period_ms: u32,
    /// A new key must stay the candidate for more than this many polls before it is
    /// reported. Releases wait for more than `RELEASE_FACTOR` times as many.
    pub debounce_count: u8,
    /// Emit diagnostics: status lines, fault and bus-error warnings, raw scans. The
    /// keypad logs nothing while this is off.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_period_ms: DEFAULT_POLL_PERIOD_MS,
            debounce_count: DEFAULT_DEBOUNCE_COUNT,
            debug: false,
        }
    }
}

impl Config {
    pub fn with_poll_period_ms(mut self, poll_period_ms: u32) -> Self {
        self.poll_period_ms = poll_period_ms;
        self
    }

    pub fn with_debounce_count(mut self, debounce_count: u8) -> Self {
        self.debounce_count = debounce_count;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
