use std::collections::HashMap;

use crate::error::SimulationError;

/// A bounds-checked, byte-addressable backing store standing in for main
/// memory.
///
/// Storage is sparse: addresses that were never written read back as 0. The
/// store is independent of cache geometry except for an advisory line size
/// used by callers for line-aligned grouping.
///
/// Any access outside `[0, size)` is rejected with
/// [`SimulationError::AddressOutOfBounds`]. An earlier revision of this design
/// clamped such addresses to the last valid byte, which silently corrupted
/// simulation results; the error is deliberate and must not be weakened back
/// to clamping.
pub struct BackingStore {
    size: u64,
    line_size: u64,
    storage: HashMap<u64, u8>,
}

impl BackingStore {
    /// Creates an empty store of `size` bytes.
    ///
    /// # Arguments
    ///
    /// * `size`: Number of addressable bytes, coerced to at least 1
    /// * `line_size`: Advisory line size for callers, coerced to at least 1
    ///
    /// returns: BackingStore
    pub fn new(size: u64, line_size: u64) -> Self {
        Self {
            size: size.max(1),
            line_size: line_size.max(1),
            storage: HashMap::new(),
        }
    }

    fn check(&self, address: u64) -> Result<(), SimulationError> {
        if address >= self.size {
            return Err(SimulationError::AddressOutOfBounds {
                address,
                size: self.size,
            });
        }
        Ok(())
    }

    /// Checks that `len` bytes starting at `base` all lie inside the store.
    ///
    /// Used by the simulator to validate a whole line before mutating any
    /// state, so a failed access leaves cache and statistics untouched
    pub fn check_range(&self, base: u64, len: u64) -> Result<(), SimulationError> {
        if len == 0 {
            return self.check(base);
        }
        self.check(base)?;
        self.check(base + len - 1)
    }

    /// Reads the byte at `address`, 0 if never written.
    pub fn read(&self, address: u64) -> Result<u8, SimulationError> {
        self.check(address)?;
        Ok(self.storage.get(&address).copied().unwrap_or(0))
    }

    /// Writes a byte at `address`.
    pub fn write(&mut self, address: u64, value: u8) -> Result<(), SimulationError> {
        self.check(address)?;
        self.storage.insert(address, value);
        Ok(())
    }

    /// Clears all stored bytes back to zero.
    pub fn reset(&mut self) {
        self.storage.clear();
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn line_size(&self) -> u64 {
        self.line_size
    }

    /// Number of addresses holding an explicitly written byte. Useful for
    /// debugging and for asserting on simulator side-effects in tests
    pub fn written_byte_count(&self) -> usize {
        self.storage.len()
    }
}
