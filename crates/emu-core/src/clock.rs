//! Free-running simulation clock.

use crate::Ticks;

/// A clock transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Low-to-high transition. Devices sample their inputs here.
    Rising,
    /// High-to-low transition. Bus responders drive data here.
    Falling,
}

/// A free-running periodic clock with a fixed half-period.
///
/// The clock starts low at time zero, so the first transition is always a
/// rising edge. Time is kept in [`Ticks`] of the simulation resolution
/// (nanoseconds for the conformance testbench).
#[derive(Debug, Clone)]
pub struct Clock {
    half_period: Ticks,
    now: Ticks,
    high: bool,
    rising_edges: u64,
}

impl Clock {
    /// Create a clock that toggles every `half_period` ticks.
    ///
    /// A zero half-period is clamped to one tick so time always advances.
    #[must_use]
    pub fn new(half_period: Ticks) -> Self {
        Self {
            half_period: Ticks::new(half_period.get().max(1)),
            now: Ticks::ZERO,
            high: false,
            rising_edges: 0,
        }
    }

    /// Advance to the next transition and report which edge it was.
    pub fn toggle(&mut self) -> Edge {
        self.now += self.half_period;
        self.high = !self.high;
        if self.high {
            self.rising_edges += 1;
            Edge::Rising
        } else {
            Edge::Falling
        }
    }

    /// Current simulation time.
    #[must_use]
    pub const fn now(&self) -> Ticks {
        self.now
    }

    /// Current clock level.
    #[must_use]
    pub const fn is_high(&self) -> bool {
        self.high
    }

    /// Number of rising edges since creation.
    #[must_use]
    pub const fn rising_edges(&self) -> u64 {
        self.rising_edges
    }

    #[must_use]
    pub const fn half_period(&self) -> Ticks {
        self.half_period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_edge_is_rising() {
        let mut clock = Clock::new(Ticks::new(5));
        assert_eq!(clock.toggle(), Edge::Rising);
        assert_eq!(clock.now(), Ticks::new(5));
        assert_eq!(clock.toggle(), Edge::Falling);
        assert_eq!(clock.now(), Ticks::new(10));
        assert_eq!(clock.rising_edges(), 1);
    }

    #[test]
    fn zero_half_period_still_advances() {
        let mut clock = Clock::new(Ticks::ZERO);
        clock.toggle();
        assert_eq!(clock.now(), Ticks::new(1));
    }
}
