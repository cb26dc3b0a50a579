//! Core traits and types for clock-edge simulation.
//!
//! Everything advances by half clock periods. A device under test samples its
//! inputs on rising edges; bus servicing happens on falling edges. All timing
//! derives from the clock. No exceptions.

mod bus;
mod clock;
mod logic;
mod observable;
mod pins;
mod ticks;

pub use bus::Bus;
pub use clock::{Clock, Edge};
pub use logic::Logic;
pub use observable::{Observable, Value};
pub use pins::{BusPins, Direction, Transaction};
pub use ticks::Ticks;
