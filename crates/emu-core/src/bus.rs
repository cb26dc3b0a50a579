//! Memory bus interface.

/// Memory bus interface.
///
/// The harness answers device reads and captures device writes through this
/// trait. Implementations decide how addresses map onto backing storage.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a byte without side effects.
    ///
    /// Used by checks and debuggers. Defaults to `None` for buses where a
    /// read would disturb device state.
    fn peek(&self, _address: u16) -> Option<u8> {
        None
    }
}
