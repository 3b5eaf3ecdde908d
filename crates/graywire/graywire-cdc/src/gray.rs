//! Gray sequence codec.
//!
//! Successive Gray values differ in exactly one bit, so a value caught in the
//! middle of a transition can only resolve to the old or the new count. That
//! property is what makes it safe to relay a counter into a domain that samples
//! it at arbitrary moments.
//!
//! ```text
//! binary  gray
//!  000    000
//!  001    001
//!  010    011
//!  011    010
//!  100    110
//!  101    111
//!  110    101
//!  111    100   (wraps to 000, again one bit)
//! ```

/// Gray-coded image of a position counter.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct GrayValue(pub u64);

impl GrayValue {
    pub const ZERO: GrayValue = GrayValue(0);

    #[inline(always)]
    pub fn encode(binary: u64) -> Self {
        GrayValue(binary ^ (binary >> 1))
    }

    /// Recovers the binary counter.
    ///
    /// Each binary bit is the XOR of every Gray bit at or above it. Folding
    /// with doubling shifts computes that prefix in six rounds for 64 bits.
    #[inline(always)]
    pub fn decode(self) -> u64 {
        let mut n = self.0;
        n ^= n >> 1;
        n ^= n >> 2;
        n ^= n >> 4;
        n ^= n >> 8;
        n ^= n >> 16;
        n ^= n >> 32;
        n
    }

    #[inline]
    pub fn bits(self) -> u64 {
        self.0
    }
}

/// Number of bit positions in which two Gray values differ.
#[inline]
pub fn hamming(a: GrayValue, b: GrayValue) -> u32 {
    (a.0 ^ b.0).count_ones()
}
