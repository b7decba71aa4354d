//! An asynchronous, `no_std` driver for the Microchip MCP23008 I2C GPIO expander.
//!
//! The MCP23008 exposes a single 8-bit port. Every pin can be configured as an input
//! (optionally with the internal 100 kΩ pull-up) or as an output. This driver speaks to
//! the chip register by register over any I2C master implementing
//! `embedded-hal-async::i2c::I2c`.
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo<I: embedded_hal_async::i2c::I2c>(i2c: I) -> Result<(), mcp23008_async::Error<I::Error>> {
//! use mcp23008_async::{Mcp23008, PinMode, DEFAULT_ADDRESS};
//!
//! let mut expander = Mcp23008::new(i2c, DEFAULT_ADDRESS);
//! if expander.probe().await {
//!     expander.set_pin_mode(0, PinMode::InputPullUp).await?;
//!     expander.set_pin_mode(4, PinMode::Output).await?;
//!     expander.digital_write(4, false).await?;
//!     let _port = expander.read_gpio().await?;
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), no_std)]

use embedded_hal::i2c::{Error as _, ErrorKind};
use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use log::{trace, warn};

/// Address with A2..A0 tied low.
pub const DEFAULT_ADDRESS: u8 = 0x20;

/// Number of GPIO pins on the port.
pub const PIN_COUNT: u8 = 8;

// --- Register Addresses (IOCON.SEQOP irrelevant, single-byte accesses only) ---
/// I/O direction, 1 = input.
pub const REG_IODIR: u8 = 0x00;
/// Input polarity.
pub const REG_IPOL: u8 = 0x01;
/// Interrupt-on-change enable.
pub const REG_GPINTEN: u8 = 0x02;
/// Default compare value for interrupt-on-change.
pub const REG_DEFVAL: u8 = 0x03;
/// Interrupt control.
pub const REG_INTCON: u8 = 0x04;
/// Configuration.
pub const REG_IOCON: u8 = 0x05;
/// Pull-up enable, 1 = 100 kΩ pull-up on an input pin.
pub const REG_GPPU: u8 = 0x06;
/// Interrupt flags.
pub const REG_INTF: u8 = 0x07;
/// Interrupt capture.
pub const REG_INTCAP: u8 = 0x08;
/// Port value. Reads return pin levels, writes go to the output latch.
pub const REG_GPIO: u8 = 0x09;
/// Output latch.
pub const REG_OLAT: u8 = 0x0A;

/// Direction and pull-up configuration of a single pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// High-impedance input.
    Input,
    /// Input with the internal pull-up enabled.
    InputPullUp,
    /// Push-pull output.
    Output,
}

/// Errors returned by the MCP23008 driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// The underlying I2C transaction failed.
    I2c(E),
    /// The pin index is not in `0..8`.
    InvalidPin(u8),
}

/// A driver for one MCP23008 on an I2C bus.
pub struct Mcp23008<I2cType> {
    i2c: I2cType,
    address: SevenBitAddress,
}

impl<I2cType> Mcp23008<I2cType>
where
    I2cType: I2c<SevenBitAddress>,
{
    /// Creates a new driver.
    ///
    /// # Arguments
    ///
    /// * `i2c` - An I2C peripheral that implements `embedded-hal-async::i2c::I2c`.
    /// * `address` - The 7-bit address of the chip, `0x20..=0x27`.
    pub fn new(i2c: I2cType, address: SevenBitAddress) -> Self {
        Self { i2c, address }
    }

    /// The 7-bit address this driver talks to.
    pub fn address(&self) -> SevenBitAddress {
        self.address
    }

    /// Gives the I2C peripheral back.
    pub fn release(self) -> I2cType {
        self.i2c
    }

    /// Checks whether a device acknowledges its address.
    ///
    /// Sends an empty write, the same thing a bus scanner does.
    pub async fn probe(&mut self) -> bool {
        match self.i2c.write(self.address, &[]).await {
            Ok(()) => true,
            Err(err) => {
                if let ErrorKind::NoAcknowledge(_) = err.kind() {
                    trace!("No MCP23008 acknowledged address {:#04x}", self.address);
                } else {
                    warn!("Error probing MCP23008 at {:#04x}: {err:?}", self.address);
                }
                false
            }
        }
    }

    /// Reads a single register.
    pub async fn read_register(&mut self, reg: u8) -> Result<u8, Error<I2cType::Error>> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .await
            .map_err(Error::I2c)?;
        Ok(buf[0])
    }

    /// Writes a single register.
    pub async fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Error<I2cType::Error>> {
        self.i2c
            .write(self.address, &[reg, value])
            .await
            .map_err(Error::I2c)
    }

    /// Sets or clears one bit of a register with a read-modify-write cycle.
    async fn update_bit(
        &mut self,
        reg: u8,
        pin: u8,
        set: bool,
    ) -> Result<(), Error<I2cType::Error>> {
        let current = self.read_register(reg).await?;
        let value = if set {
            current | (1 << pin)
        } else {
            current & !(1 << pin)
        };
        self.write_register(reg, value).await
    }

    /// Configures the direction and pull-up of a pin.
    ///
    /// Inputs update both IODIR and GPPU. Outputs only touch IODIR.
    pub async fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Error<I2cType::Error>> {
        check_pin(pin)?;
        match mode {
            PinMode::Output => self.update_bit(REG_IODIR, pin, false).await,
            PinMode::Input | PinMode::InputPullUp => {
                self.update_bit(REG_IODIR, pin, true).await?;
                self.update_bit(REG_GPPU, pin, mode == PinMode::InputPullUp)
                    .await
            }
        }
    }

    /// Drives an output pin high or low through the output latch.
    pub async fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), Error<I2cType::Error>> {
        check_pin(pin)?;
        self.update_bit(REG_OLAT, pin, high).await
    }

    /// Reads the level of a single pin.
    pub async fn digital_read(&mut self, pin: u8) -> Result<bool, Error<I2cType::Error>> {
        check_pin(pin)?;
        let port = self.read_gpio().await?;
        Ok(port & (1 << pin) != 0)
    }

    /// Reads all eight pin levels at once.
    pub async fn read_gpio(&mut self) -> Result<u8, Error<I2cType::Error>> {
        self.read_register(REG_GPIO).await
    }

    /// Writes all eight output latches at once. Bits of input pins are ignored by the chip.
    pub async fn write_gpio(&mut self, value: u8) -> Result<(), Error<I2cType::Error>> {
        self.write_register(REG_GPIO, value).await
    }
}

fn check_pin<E>(pin: u8) -> Result<(), Error<E>> {
    if pin < PIN_COUNT {
        Ok(())
    } else {
        Err(Error::InvalidPin(pin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pins_outside_the_port_are_rejected() {
        assert_eq!(check_pin::<()>(0), Ok(()));
        assert_eq!(check_pin::<()>(7), Ok(()));
        assert_eq!(check_pin::<()>(8), Err(Error::InvalidPin(8)));
    }
}
