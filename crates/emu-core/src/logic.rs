//! Four-state signal values.

use std::fmt;

/// The value of a simulated signal.
///
/// HDL signals can be undriven or contain unknown bits (`X`/`Z`) on any
/// cycle, most commonly while a device is held in reset. A value that cannot
/// be resolved to concrete bits is `Undefined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Logic<T> {
    /// Every bit is driven to a known level.
    Driven(T),
    /// At least one bit is unknown or floating.
    #[default]
    Undefined,
}

impl<T: Copy> Logic<T> {
    /// The concrete value, if every bit is known.
    #[must_use]
    pub fn resolve(self) -> Option<T> {
        match self {
            Self::Driven(v) => Some(v),
            Self::Undefined => None,
        }
    }

    #[must_use]
    pub fn is_driven(self) -> bool {
        matches!(self, Self::Driven(_))
    }

    /// The concrete value, or `fallback` for an undefined signal.
    #[must_use]
    pub fn unwrap_or(self, fallback: T) -> T {
        self.resolve().unwrap_or(fallback)
    }
}

impl Logic<bool> {
    /// True only when the line is driven high. `X` never counts as asserted.
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::Driven(true))
    }
}

impl<T> From<T> for Logic<T> {
    fn from(v: T) -> Self {
        Self::Driven(v)
    }
}

impl<T: fmt::UpperHex> fmt::Display for Logic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Driven(v) => write!(f, "0x{v:02X}"),
            Self::Undefined => write!(f, "X"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_line_is_not_asserted() {
        assert!(!Logic::<bool>::Undefined.is_high());
        assert!(!Logic::Driven(false).is_high());
        assert!(Logic::Driven(true).is_high());
    }

    #[test]
    fn display_marks_unknown_bits() {
        assert_eq!(Logic::Driven(0x0Au8).to_string(), "0x0A");
        assert_eq!(Logic::<u16>::Undefined.to_string(), "X");
    }
}
