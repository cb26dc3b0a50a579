//! Simulated time.

use std::fmt;

/// Simulated time in nanoseconds.
///
/// Only elapsed time is tracked here; edge counts live on
/// [`Clock`](crate::Clock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(nanos: u64) -> Self {
        Self(nanos)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl core::ops::AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_and_prints_nanoseconds() {
        let mut now = Ticks::ZERO;
        now += Ticks::new(5);
        now += Ticks::new(5);
        assert_eq!(now.get(), 10);
        assert_eq!(now.to_string(), "10ns");
    }
}
