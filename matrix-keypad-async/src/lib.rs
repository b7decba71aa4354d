//! An asynchronous, `no_std` driver for a matrix keypad behind an MCP23008 GPIO expander.
//!
//! The rows of the matrix are wired to pulled-up expander inputs and the columns to
//! expander outputs. Every poll drives one column low at a time, samples the rows and
//! builds a key mask. Masks that cannot come from a healthy matrix put the keypad into a
//! fault state, reported immediately and cleared by reconfiguring the expander. Healthy
//! masks go through a single-new-key edge detector and a debounce window before they are
//! reported.
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo<I: embedded_hal_async::i2c::I2c>(i2c: I) {
//! use matrix_keypad_async::{conf::Config, Keypad, KeyReading, Layout};
//!
//! let layout = Layout::new(&[0, 1, 2, 3], &[4, 5, 6, 7], 0x20).unwrap();
//! let mut keypad = Keypad::mcp23008(i2c, layout, Config::default().with_debounce_count(2));
//! keypad.begin().await.unwrap();
//!
//! loop {
//!     keypad.update().await;
//!     if keypad.is_updated() {
//!         match keypad.read_key() {
//!             KeyReading::Key(index) => log::info!("Key {index}"),
//!             KeyReading::None => log::info!("Released"),
//!             KeyReading::Fault => log::warn!("Keypad fault"),
//!         }
//!     }
//! }
//! # }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod conf;
pub mod debounce;
pub mod edge;
pub mod error;
pub mod expander;
pub mod layout;
pub mod scan;

mod keypad;
pub use keypad::*;

pub use clock::{Clock, EmbassyClock};
pub use error::KeypadError;
pub use expander::{PinMode, PortExpander};
pub use layout::{Layout, LayoutError};
