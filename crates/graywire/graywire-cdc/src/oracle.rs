//! Full/empty decisions from a local counter and a relayed remote counter.
//!
//! All inputs are binary counters with the guard bit. The remote value always
//! comes out of a [`SyncRelay`](crate::relay::SyncRelay), so it can only be
//! behind the real remote position, never ahead. Behind means fewer reads seen
//! by the producer (more occupancy, earlier `full`) and fewer writes seen by
//! the consumer (less occupancy, earlier `empty`), which is the safe direction
//! on both sides.
//!
//! ```text
//! depth = 4, counters are 3 bits (guard bit on the left)
//!
//!   write  read   occupancy   state
//!   0 00   0 00       0       empty
//!   0 11   0 01       2
//!   1 00   0 00       4       full   (same address, guard differs)
//!   1 01   1 01       0       empty  (all bits equal)
//! ```

/// Producer side: every slot is occupied.
///
/// Address bits equal and guard bits different means the writer is exactly
/// one lap ahead of the reader.
#[inline(always)]
pub fn is_full(write: u64, read_view: u64, depth: u64) -> bool {
    write ^ read_view == depth
}

/// Consumer side: nothing to read. Equal in every bit, guard bit included.
#[inline(always)]
pub fn is_empty(read: u64, write_view: u64) -> bool {
    read == write_view
}

/// Items held, `(write - read) mod 2*depth`.
#[inline(always)]
pub fn occupancy(write: u64, read: u64, depth: u64) -> u64 {
    write.wrapping_sub(read) & (depth * 2 - 1)
}
