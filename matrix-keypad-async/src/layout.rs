//! Physical wiring of the keypad matrix to the expander port.

use heapless::Vec;

/// Pins available on the expander port.
pub const MAX_PINS: usize = 8;

/// Largest possible matrix, four rows by four columns.
pub const MAX_KEYS: usize = (MAX_PINS / 2) * (MAX_PINS / 2);

/// Reasons a pin layout is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// No row pins or no column pins were given.
    Empty,
    /// A pin index is not on the 8-bit port.
    PinOutOfRange(u8),
    /// A pin is used twice.
    DuplicatePin(u8),
    /// More row and column pins than the port has.
    TooManyPins(usize),
}

/// Row and column pin assignment plus the I2C address of the expander.
///
/// Key `(row, col)` owns bit `col + row * cols` of every key mask and has the 1-based
/// index `col + row * cols + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    row_pins: Vec<u8, MAX_PINS>,
    col_pins: Vec<u8, MAX_PINS>,
    address: u8,
}

impl Layout {
    /// Validates and builds a layout.
    ///
    /// # Arguments
    ///
    /// * `row_pins` - Expander pins wired to the rows, sampled as pulled-up inputs.
    /// * `col_pins` - Expander pins wired to the columns, driven low one at a time.
    /// * `address` - 7-bit I2C address of the expander.
    pub fn new(row_pins: &[u8], col_pins: &[u8], address: u8) -> Result<Self, LayoutError> {
        if row_pins.is_empty() || col_pins.is_empty() {
            return Err(LayoutError::Empty);
        }
        let pins = row_pins.len() + col_pins.len();
        if pins > MAX_PINS {
            return Err(LayoutError::TooManyPins(pins));
        }

        let mut seen = 0u8;
        for &pin in row_pins.iter().chain(col_pins) {
            if pin as usize >= MAX_PINS {
                return Err(LayoutError::PinOutOfRange(pin));
            }
            if seen & (1 << pin) != 0 {
                return Err(LayoutError::DuplicatePin(pin));
            }
            seen |= 1 << pin;
        }

        let row_pins = Vec::from_slice(row_pins).map_err(|_| LayoutError::TooManyPins(pins))?;
        let col_pins = Vec::from_slice(col_pins).map_err(|_| LayoutError::TooManyPins(pins))?;

        Ok(Self {
            row_pins,
            col_pins,
            address,
        })
    }

    pub fn rows(&self) -> usize {
        self.row_pins.len()
    }

    pub fn cols(&self) -> usize {
        self.col_pins.len()
    }

    /// Number of key positions, `rows * cols`.
    pub fn key_count(&self) -> usize {
        self.rows() * self.cols()
    }

    pub fn row_pins(&self) -> &[u8] {
        &self.row_pins
    }

    pub fn col_pins(&self) -> &[u8] {
        &self.col_pins
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Mask bit of the key at `(row, col)`.
    pub fn key_bit(&self, row: usize, col: usize) -> u16 {
        1 << (col + row * self.cols())
    }

    /// Maps a 1-based key index back to its `(row, col)` position.
    pub fn position(&self, index: u8) -> Option<(usize, usize)> {
        let index = index as usize;
        if index == 0 || index > self.key_count() {
            return None;
        }
        let bit = index - 1;
        Some((bit / self.cols(), bit % self.cols()))
    }

    /// Port bits of all column pins.
    pub(crate) fn col_port_mask(&self) -> u8 {
        self.col_pins.iter().fold(0, |mask, &pin| mask | (1 << pin))
    }
}
