//! Packed bit set stored with each request.

/// Number of bytes in a request's flag field.
pub const FLAGS_WIDTH: usize = 4;

/// Fixed-size set of boolean indicators.
///
/// Bit `n` lives in byte `n / 8` at position `n % 8`. What each bit means is
/// up to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags([u8; FLAGS_WIDTH]);

impl Flags {
    /// Number of addressable bits.
    pub const BITS: usize = FLAGS_WIDTH * 8;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: [u8; FLAGS_WIDTH]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; FLAGS_WIDTH] {
        &self.0
    }

    /// Read a bit. Panics if `pos` is out of range.
    pub fn get(&self, pos: usize) -> bool {
        assert!(pos < Self::BITS, "flag {} out of range", pos);
        self.0[pos / 8] & (1 << (pos % 8)) != 0
    }

    /// Set or clear a bit. Panics if `pos` is out of range.
    pub fn set(&mut self, pos: usize, value: bool) {
        assert!(pos < Self::BITS, "flag {} out of range", pos);
        let mask = 1 << (pos % 8);
        if value {
            self.0[pos / 8] |= mask;
        } else {
            self.0[pos / 8] &= !mask;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; FLAGS_WIDTH]
    }
}
