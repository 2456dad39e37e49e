#![forbid(unsafe_code)]

use std::fmt;

use fbsim_utilities::TypedIndex;

/// A unique type for block-table slots.
pub struct BlockTag;

/// The index of a slot in the block table.
pub type BlockIndex = TypedIndex<BlockTag>;

/// The class of a node: a block-table slot or a singleton.
///
/// # Details
///
/// A sign-tagged 64-bit value. Non-negative values index the block table
/// (0 is a valid slot); the value `-s` is singleton number s, with s >= 1.
/// This keeps mapping entries at a constant size and makes the block fast
/// path branch free.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(i64);

impl ClassId {
    /// The class of a live block-table slot.
    pub fn block(index: BlockIndex) -> ClassId {
        debug_assert!(index.value() <= i64::MAX as usize, "slot index {index} does not fit a class id");

        ClassId(index.value() as i64)
    }

    /// The class of singleton number `counter` (1-origin).
    pub fn singleton(counter: u64) -> ClassId {
        debug_assert!(counter >= 1, "singleton numbers start at one");
        debug_assert!(counter <= i64::MAX as u64, "singleton number {counter} does not fit a class id");

        ClassId(-(counter as i64))
    }

    /// Returns true iff this class is a singleton.
    pub fn is_singleton(self) -> bool {
        self.0 < 0
    }

    /// Returns the block-table slot of this class, or None for a singleton.
    pub fn block_index(self) -> Option<BlockIndex> {
        if self.0 >= 0 {
            Some(BlockIndex::new(self.0 as usize))
        } else {
            None
        }
    }

    /// The sign-encoded unsigned form used when hashing signature pieces:
    /// a block maps to its slot index and singleton s maps to 2^63 + s, so a
    /// singleton never shares a byte pattern with the block of the same
    /// magnitude.
    pub fn to_unsigned(self) -> u64 {
        if self.0 >= 0 {
            self.0 as u64
        } else {
            (1u64 << 63) + self.0.unsigned_abs()
        }
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 0 {
            write!(f, "b{}", self.0)
        } else {
            write!(f, "s{}", -self.0)
        }
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
