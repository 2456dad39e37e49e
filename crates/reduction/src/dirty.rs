#![forbid(unsafe_code)]

use bitvec::prelude::*;

use crate::BlockIndex;

/// The set of block slots that must be re-examined in the next refinement
/// step. Only live blocks are ever inserted; singleton classes cannot split
/// and are never members.
#[derive(Debug, Default)]
pub struct DirtyBlocks {
    bits: BitVec,
}

impl DirtyBlocks {
    /// Creates an empty set with capacity for the given number of slots.
    pub fn new(size_hint: usize) -> DirtyBlocks {
        DirtyBlocks {
            bits: BitVec::with_capacity(size_hint),
        }
    }

    /// Removes all blocks from the set.
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Marks the given slot as dirty, growing the set as needed.
    pub fn set_dirty(&mut self, index: BlockIndex) {
        if index.value() >= self.bits.len() {
            self.bits.resize(index.value() + 1, false);
        }

        self.bits.set(index.value(), true);
    }

    /// Returns true iff the given slot is dirty.
    pub fn is_dirty(&self, index: BlockIndex) -> bool {
        self.bits.get(index.value()).is_some_and(|bit| *bit)
    }

    /// Returns the number of dirty slots.
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Returns true iff no slot is dirty.
    pub fn is_empty(&self) -> bool {
        !self.bits.any()
    }

    /// Iterates over the dirty slots in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = BlockIndex> + '_ {
        self.bits.iter_ones().map(BlockIndex::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_blocks() {
        let mut dirty = DirtyBlocks::new(4);
        assert!(dirty.is_empty());

        dirty.set_dirty(BlockIndex::new(2));
        dirty.set_dirty(BlockIndex::new(7));
        dirty.set_dirty(BlockIndex::new(2));

        assert_eq!(dirty.count(), 2);
        assert!(dirty.is_dirty(BlockIndex::new(2)));
        assert!(!dirty.is_dirty(BlockIndex::new(3)));
        assert!(!dirty.is_dirty(BlockIndex::new(100)));

        let slots: Vec<BlockIndex> = dirty.iter().collect();
        assert_eq!(slots, vec![BlockIndex::new(2), BlockIndex::new(7)]);

        dirty.clear();
        assert!(dirty.is_empty());
    }
}
