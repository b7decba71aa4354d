//! The port-level view of the GPIO expander the keypad is wired to.

use core::fmt::Debug;

use embedded_hal_async::i2c::{I2c, SevenBitAddress};
use mcp23008_async::Mcp23008;

pub use mcp23008_async::{Error as Mcp23008Error, PinMode};

/// An 8-bit GPIO port behind a bus.
///
/// Only the operations the scan and reset logic need are required.
#[allow(async_fn_in_trait)]
pub trait PortExpander {
    type Error: Debug;

    /// Whether the device answers on the bus at all.
    async fn probe(&mut self) -> bool;

    async fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Self::Error>;

    async fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), Self::Error>;

    /// Reads the level of every pin.
    async fn read_port(&mut self) -> Result<u8, Self::Error>;

    /// Writes the output latch of every pin.
    async fn write_port(&mut self, value: u8) -> Result<(), Self::Error>;
}

impl<I2cType> PortExpander for Mcp23008<I2cType>
where
    I2cType: I2c<SevenBitAddress>,
{
    type Error = Mcp23008Error<I2cType::Error>;

    async fn probe(&mut self) -> bool {
        Mcp23008::probe(self).await
    }

    async fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Self::Error> {
        Mcp23008::set_pin_mode(self, pin, mode).await
    }

    async fn digital_write(&mut self, pin: u8, high: bool) -> Result<(), Self::Error> {
        Mcp23008::digital_write(self, pin, high).await
    }

    async fn read_port(&mut self) -> Result<u8, Self::Error> {
        self.read_gpio().await
    }

    async fn write_port(&mut self, value: u8) -> Result<(), Self::Error> {
        self.write_gpio(value).await
    }
}
