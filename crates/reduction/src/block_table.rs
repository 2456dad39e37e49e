#![forbid(unsafe_code)]

use std::fmt;

use itertools::Itertools;

use fbsim_graph::NodeIndex;

use crate::BlockIndex;

/// A block of nodes that share a class. Live blocks have at least two
/// members; a class with a single member is stored as a singleton in the
/// node-to-block mapping instead.
pub type Block = Vec<NodeIndex>;

/// The table of non-singleton blocks, indexed by [`BlockIndex`].
///
/// # Details
///
/// Slots of blocks that dissolved become holes. The table only grows in
/// length; holes are reused through the free-list carried by the mapping.
#[derive(Debug, Default)]
pub struct BlockTable {
    slots: Vec<Option<Block>>,
}

impl BlockTable {
    /// Creates a table with a single block holding the given nodes.
    pub fn new_single(nodes: Block) -> BlockTable {
        BlockTable { slots: vec![Some(nodes)] }
    }

    /// Returns the number of slots, including holes.
    pub fn num_of_slots(&self) -> usize {
        self.slots.len()
    }

    /// Returns the block in the given slot. Reading a hole is a programming
    /// error.
    pub fn block(&self, index: BlockIndex) -> &Block {
        self.slots[index].as_ref().expect("slot holds a hole, not a block")
    }

    /// Returns true iff the given slot is a hole.
    pub fn is_hole(&self, index: BlockIndex) -> bool {
        self.slots[index].is_none()
    }

    /// Removes and returns the block in the given slot, leaving a hole.
    pub fn take(&mut self, index: BlockIndex) -> Block {
        self.slots[index].take().expect("slot holds a hole, not a block")
    }

    /// Places a block into a hole.
    pub fn place(&mut self, index: BlockIndex, block: Block) {
        debug_assert!(self.slots[index].is_none(), "slot {index} is occupied");
        debug_assert!(block.len() >= 2, "a live block has at least two members");

        self.slots[index] = Some(block);
    }

    /// Appends a block at a fresh slot and returns its index.
    pub fn push(&mut self, block: Block) -> BlockIndex {
        debug_assert!(block.len() >= 2, "a live block has at least two members");

        self.slots.push(Some(block));
        BlockIndex::new(self.slots.len() - 1)
    }

    /// Iterates over the live blocks and their slots.
    pub fn iter_live(&self) -> impl Iterator<Item = (BlockIndex, &Block)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|block| (BlockIndex::new(index), block)))
    }
}

impl fmt::Display for BlockTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots_str = self.slots.iter().format_with(", ", |slot, f| match slot {
            Some(block) => f(&format_args!("{{{}}}", block.iter().format(", "))),
            None => f(&"_"),
        });

        write!(f, "{{{}}}", slots_str)
    }
}
