//! Errors surfaced by keypad setup.

use core::fmt::{self, Debug};

use crate::layout::LayoutError;

/// Failure of [`Keypad::begin`](crate::Keypad::begin).
///
/// Once running, `update()` never fails: bus errors and implausible scans are absorbed
/// into the reported reading.
pub enum KeypadError<E> {
    /// The expander did not acknowledge its address.
    NotConnected,
    /// Configuring or reading the expander failed.
    Expander(E),
    /// The pin layout is invalid.
    Layout(LayoutError),
}

impl<E: Debug> Debug for KeypadError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "NotConnected"),
            Self::Expander(err) => write!(f, "Expander({err:?})"),
            Self::Layout(err) => write!(f, "Layout({err:?})"),
        }
    }
}

impl<E: PartialEq> PartialEq for KeypadError<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotConnected, Self::NotConnected) => true,
            (Self::Expander(a), Self::Expander(b)) => a == b,
            (Self::Layout(a), Self::Layout(b)) => a == b,
            _ => false,
        }
    }
}

impl<E> From<LayoutError> for KeypadError<E> {
    fn from(err: LayoutError) -> Self {
        KeypadError::Layout(err)
    }
}
