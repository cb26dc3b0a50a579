//! Memory image seen by the DUT during one case.

use std::collections::BTreeMap;

use emu_core::Bus;

/// Program bytes at address 0, backed by a sparse data overlay.
///
/// Reads below the program length return program bytes, then the overlay,
/// then zero. Writes always land in the overlay, so a program byte shadows a
/// write to the same address on later reads. Memory checks only look at the
/// overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryImage {
    program: Vec<u8>,
    overlay: BTreeMap<u16, u8>,
}

impl MemoryImage {
    #[must_use]
    pub fn new(program: Vec<u8>, overlay: BTreeMap<u16, u8>) -> Self {
        Self { program, overlay }
    }

    /// Overlay byte, or zero if nothing was stored there.
    #[must_use]
    pub fn overlay_byte(&self, address: u16) -> u8 {
        self.overlay.get(&address).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn overlay(&self) -> &BTreeMap<u16, u8> {
        &self.overlay
    }

    #[must_use]
    pub fn program(&self) -> &[u8] {
        &self.program
    }

    fn lookup(&self, address: u16) -> u8 {
        match self.program.get(usize::from(address)) {
            Some(&byte) => byte,
            None => self.overlay_byte(address),
        }
    }
}

impl Bus for MemoryImage {
    fn read(&mut self, address: u16) -> u8 {
        self.lookup(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.overlay.insert(address, value);
    }

    fn peek(&self, address: u16) -> Option<u8> {
        Some(self.lookup(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_shadows_overlay() {
        let mut memory = MemoryImage::new(vec![0x3C, 0x00], BTreeMap::from([(0x0001, 0xAA)]));
        assert_eq!(memory.read(0x0000), 0x3C);
        assert_eq!(memory.read(0x0001), 0x00);
        memory.write(0x0000, 0x55);
        assert_eq!(memory.read(0x0000), 0x3C);
        assert_eq!(memory.overlay_byte(0x0000), 0x55);
    }

    #[test]
    fn unmapped_reads_zero() {
        let mut memory = MemoryImage::default();
        assert_eq!(memory.read(0xC000), 0);
        assert_eq!(memory.overlay_byte(0xC000), 0);
    }

    #[test]
    fn last_write_wins() {
        let mut memory = MemoryImage::default();
        memory.write(0x8000, 1);
        memory.write(0x8000, 2);
        assert_eq!(memory.peek(0x8000), Some(2));
    }
}
