//! The polled keypad state machine.

use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use log::{debug, trace, warn};
use mcp23008_async::Mcp23008;

use crate::clock::{Clock, EmbassyClock};
use crate::conf::Config;
use crate::debounce::Debouncer;
use crate::edge::EdgeDetector;
use crate::error::KeypadError;
use crate::expander::{Mcp23008Error, PinMode, PortExpander};
use crate::layout::Layout;
use crate::scan::{is_plausible, Scanner};

/// Key index reported while the matrix is faulted.
pub const ERROR_INDEX: u8 = 255;

/// Bitmask reported while the matrix is faulted.
pub const ERROR_MASK: u16 = u16::MAX;

/// What a call to [`Keypad::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The poll period has not elapsed yet. Nothing changed.
    Throttled,
    /// The matrix is faulted and reconfiguring the expander failed, so no scan ran.
    ResetFailed,
    /// The scan was implausible. The fault is reported and a reset is due.
    Fault { raw: u16 },
    /// A plausible scan was fed to the edge detector.
    Scanned { raw: u16 },
}

/// The reported reading in typed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyReading {
    /// No key is pressed.
    None,
    /// The key with this 1-based index is pressed.
    Key(u8),
    /// The matrix reported an impossible state.
    Fault,
}

impl KeyReading {
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => KeyReading::None,
            ERROR_INDEX => KeyReading::Fault,
            index => KeyReading::Key(index),
        }
    }
}

/// A matrix keypad scanned through a GPIO expander.
///
/// Call [`begin`](Self::begin) once, then [`update`](Self::update) as often as
/// convenient. Updates are rate limited to the configured poll period and readings only
/// change once they have been stable for the debounce window.
///
/// There is no internal locking. Share it between tasks behind a mutex.
pub struct Keypad<X, C> {
    layout: Layout,
    expander: X,
    clock: C,
    config: Config,
    scanner: Scanner,
    edge: EdgeDetector,
    debouncer: Debouncer,
    last_poll: u32,
    faulted: bool,
    debounced_mask: u16,
    debounced_index: u8,
    updated: bool,
}

impl<I2cType> Keypad<Mcp23008<I2cType>, EmbassyClock>
where
    I2cType: I2c<SevenBitAddress>,
{
    /// Creates a keypad on an MCP23008 at `layout.address()`, timed by embassy.
    pub fn mcp23008(i2c: I2cType, layout: Layout, config: Config) -> Self {
        let expander = Mcp23008::new(i2c, layout.address());
        Self::new(layout, expander, EmbassyClock, config)
    }

    /// Validates the pin lists and creates a keypad on an MCP23008.
    ///
    /// # Arguments
    ///
    /// * `row_pins` - Expander pins wired to the rows.
    /// * `col_pins` - Expander pins wired to the columns.
    /// * `address` - 7-bit I2C address of the MCP23008.
    /// * `i2c` - An I2C peripheral that implements `embedded-hal-async::i2c::I2c`.
    pub fn from_pins(
        row_pins: &[u8],
        col_pins: &[u8],
        address: u8,
        i2c: I2cType,
        config: Config,
    ) -> Result<Self, KeypadError<Mcp23008Error<I2cType::Error>>> {
        let layout = Layout::new(row_pins, col_pins, address)?;
        Ok(Self::mcp23008(i2c, layout, config))
    }
}

impl<X, C> Keypad<X, C>
where
    X: PortExpander,
    C: Clock,
{
    /// Creates a keypad from any port expander and clock. Nothing touches the bus until
    /// [`begin`](Self::begin).
    pub fn new(layout: Layout, expander: X, clock: C, config: Config) -> Self {
        Self {
            layout,
            expander,
            clock,
            config,
            scanner: Scanner::new(),
            edge: EdgeDetector::new(),
            debouncer: Debouncer::new(config.debounce_count),
            last_poll: 0,
            faulted: false,
            debounced_mask: 0,
            debounced_index: 0,
            updated: false,
        }
    }

    /// Configures the expander pins and starts the poll timer.
    ///
    /// Must run once before the first [`update`](Self::update).
    pub async fn begin(&mut self) -> Result<(), KeypadError<X::Error>> {
        if !self.expander.probe().await {
            if self.config.debug {
                warn!(
                    "Keypad expander at {:#04x} did not acknowledge",
                    self.layout.address()
                );
            }
            return Err(KeypadError::NotConnected);
        }

        self.configure_pins().await.map_err(KeypadError::Expander)?;
        let port = self
            .expander
            .read_port()
            .await
            .map_err(KeypadError::Expander)?;
        self.scanner.prime(port);
        self.last_poll = self.clock.now_millis();

        if self.config.debug {
            debug!(
                "Keypad {}x{} ready at {:#04x}",
                self.layout.rows(),
                self.layout.cols(),
                self.layout.address()
            );
        }
        Ok(())
    }

    /// Sets the minimum time between two scans.
    pub fn set_poll_period(&mut self, poll_period_ms: u32) {
        self.config.poll_period_ms = poll_period_ms;
        if self.config.debug {
            debug!("Keypad poll period -- {poll_period_ms} ms");
        }
    }

    /// Sets the debounce count, applied to the window already running.
    pub fn set_debounce_threshold(&mut self, debounce_count: u8) {
        self.config.debounce_count = debounce_count;
        self.debouncer.set_threshold(debounce_count);
        if self.config.debug {
            debug!("Keypad debounce count -- {debounce_count}");
        }
    }

    /// Turns the diagnostic log lines on or off.
    pub fn set_debug_mode(&mut self, debug: bool) {
        if debug || self.config.debug {
            debug!("Keypad debugging {}", if debug { "on" } else { "off" });
        }
        self.config.debug = debug;
    }

    /// Advances the state machine by at most one poll.
    ///
    /// The debounce stage runs first and judges the candidate of the previous poll, then
    /// a pending reset is attempted, then the matrix is scanned, checked and fed to the
    /// edge detector.
    pub async fn update(&mut self) -> PollOutcome {
        let now = self.clock.now_millis();
        if now.wrapping_sub(self.last_poll) < self.config.poll_period_ms {
            return PollOutcome::Throttled;
        }

        if !self.faulted {
            self.confirm_candidate();
        }
        self.last_poll = now;

        if self.faulted && !self.reset().await {
            return PollOutcome::ResetFailed;
        }

        let raw = self
            .scanner
            .scan(&mut self.expander, &self.layout, self.config.debug)
            .await;
        if self.config.debug {
            trace!("Keypad raw scan {raw:#06x}");
        }

        if !is_plausible(raw, &self.layout) {
            self.raise_fault(raw);
            return PollOutcome::Fault { raw };
        }

        self.edge.feed(raw);
        PollOutcome::Scanned { raw }
    }

    /// The reported key index: 0 for none, `1..=rows*cols` for a key, 255 for a fault.
    ///
    /// Clears the updated flag.
    pub fn read_key_index(&mut self) -> u8 {
        self.updated = false;
        if self.config.debug {
            debug!("Keypad output -- {}", self.debounced_index);
        }
        self.debounced_index
    }

    /// The reported key mask, `0xFFFF` while faulted.
    ///
    /// Clears the updated flag.
    pub fn read_bitmask(&mut self) -> u16 {
        self.updated = false;
        if self.config.debug {
            debug!(
                "Keypad output, bitmask mode -- {:0width$b}",
                self.debounced_mask,
                width = self.layout.key_count()
            );
        }
        self.debounced_mask
    }

    /// [`read_key_index`](Self::read_key_index) as a [`KeyReading`].
    pub fn read_key(&mut self) -> KeyReading {
        KeyReading::from_index(self.read_key_index())
    }

    /// Whether the reading changed since it was last read. Does not clear the flag.
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// Whether the last scan was implausible and no reset has succeeded since.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Whether the expander currently acknowledges its address.
    pub async fn is_connected(&mut self) -> bool {
        self.expander.probe().await
    }

    /// The pin layout the keypad was built with.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The current configuration, including runtime changes.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gives back the expander and the clock.
    pub fn release(self) -> (X, C) {
        (self.expander, self.clock)
    }

    /// Rows become pulled-up inputs, columns outputs driven high.
    async fn configure_pins(&mut self) -> Result<(), X::Error> {
        for &pin in self.layout.row_pins() {
            self.expander.set_pin_mode(pin, PinMode::InputPullUp).await?;
        }
        for &pin in self.layout.col_pins() {
            self.expander.set_pin_mode(pin, PinMode::Output).await?;
            self.expander.digital_write(pin, true).await?;
        }
        Ok(())
    }

    /// Restores the pin configuration after a fault.
    async fn reset(&mut self) -> bool {
        // TODO: decide whether an unanswered probe should skip the reconfiguration.
        if !self.expander.probe().await && self.config.debug {
            warn!("Keypad expander did not answer the probe, resetting anyway");
        }

        match self.configure_pins().await {
            Ok(()) => {
                self.faulted = false;
                if self.config.debug {
                    debug!("Keypad successfully reset");
                }
                true
            }
            Err(err) => {
                if self.config.debug {
                    warn!("Keypad reset failed: {err:?}");
                }
                false
            }
        }
    }

    fn raise_fault(&mut self, raw: u16) {
        if self.config.debug {
            warn!("Implausible keypad scan {raw:#06x}, reset scheduled");
        }
        self.faulted = true;
        self.edge.clear();
        self.debouncer.restart(ERROR_MASK);
        if self.debounced_mask != ERROR_MASK {
            self.debounced_mask = ERROR_MASK;
            self.debounced_index = ERROR_INDEX;
            self.updated = true;
        }
    }

    fn confirm_candidate(&mut self) {
        let Some(mask) = self
            .debouncer
            .debounce(self.edge.candidate(), self.debounced_mask)
        else {
            return;
        };

        self.debounced_mask = mask;
        self.debounced_index = key_index(mask);
        self.updated = true;
        if self.config.debug {
            debug!("Keypad confirmed key {}", self.debounced_index);
        }
    }
}

/// 1-based index of the lowest set bit, 0 for an empty mask.
fn key_index(mask: u16) -> u8 {
    match mask {
        0 => 0,
        ERROR_MASK => ERROR_INDEX,
        mask => mask.trailing_zeros() as u8 + 1,
    }
}
