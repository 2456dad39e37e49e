#![forbid(unsafe_code)]

use std::thread;

use crossbeam_channel::Receiver;
use crossbeam_channel::select;
use crossbeam_channel::unbounded;
use log::trace;
use rayon::prelude::*;

use fbsim_graph::Graph;
use fbsim_graph::NodeIndex;
use fbsim_graph::ParentIndex;

use crate::Block;
use crate::BlockIndex;
use crate::BlockTable;
use crate::ClassId;
use crate::DirtyBlocks;
use crate::KBisimulationOutcome;
use crate::MappingNodeToBlock;
use crate::NodeToBlock;
use crate::refine_block::BlockRefinement;
use crate::refine_block::refine_block;

/// What happened to the slot of a refined dirty block.
enum SlotOutcome {
    /// The block did not split and returns to its slot untouched.
    Unchanged(Block),
    /// The block split; its largest fragment keeps the slot.
    Reused(Block),
    /// Every fragment was a singleton; the slot becomes a hole.
    Dissolved,
}

/// The nodes whose class changed during a step. All of them, including fresh
/// singletons, feed the dirty set of the next step through the parent index.
struct ChangedNodes {
    /// Slots that were freshly filled or reused after a split.
    slots: Vec<BlockIndex>,
    /// Nodes that became singletons.
    singletons: Vec<NodeIndex>,
}

/// Advances the partition by one refinement step: every dirty block is split
/// by the signatures of its nodes against the previous mapping, and the next
/// dirty set is derived from the changed nodes through the parent index.
///
/// # Details
///
/// The step is one synchronisation epoch. Worker tasks (one per dirty block)
/// run on the rayon pool and own the nodes of their block; the single gather
/// task owns the block table, the write-side mapping and its free-list. Block
/// ownership moves through three channels carrying exactly one message per
/// worker each, so the gather loop knows when to stop. The free-list is read
/// again only after the scope has joined every task.
pub fn refine_step(
    graph: &Graph,
    parents: &ParentIndex,
    previous: KBisimulationOutcome,
    min_support: u64,
) -> KBisimulationOutcome {
    let KBisimulationOutcome {
        mut blocks,
        mut dirty,
        node_to_block: previous_mapping,
    } = previous;

    let next_mapping = previous_mapping.modifiable_copy();

    // Pull the dirty blocks out of the table; the workers own their nodes
    // until the gather task puts the results back. Blocks below the support
    // threshold are left untouched.
    let dirty_slots: Vec<BlockIndex> = dirty.iter().collect();
    let mut work: Vec<(BlockIndex, Block)> = Vec::with_capacity(dirty_slots.len());
    for index in dirty_slots {
        if (blocks.block(index).len() as u64) < min_support {
            continue;
        }

        work.push((index, blocks.take(index)));
    }

    let num_of_workers = work.len();

    let (singleton_sender, singleton_receiver) = unbounded::<Vec<NodeIndex>>();
    let (fresh_sender, fresh_receiver) = unbounded::<Vec<Block>>();
    let (slot_sender, slot_receiver) = unbounded::<(BlockIndex, SlotOutcome)>();

    let previous_mapping: &dyn NodeToBlock = previous_mapping.as_ref();

    // The senders move into the scope so that they are dropped when a worker
    // panic unwinds the closure; the gather task then observes disconnected
    // channels instead of waiting forever.
    let (blocks, next_mapping, changed) = thread::scope(move |scope| {
        let gather = scope.spawn(move || {
            gather_refinements(
                blocks,
                next_mapping,
                singleton_receiver,
                fresh_receiver,
                slot_receiver,
                num_of_workers,
            )
        });

        work.into_par_iter().for_each(|(index, nodes)| {
            trace!("refining block {index} with {} nodes", nodes.len());

            match refine_block(graph, previous_mapping, nodes) {
                BlockRefinement::Unchanged(nodes) => {
                    singleton_sender.send(Vec::new()).expect("the gather task is running");
                    fresh_sender.send(Vec::new()).expect("the gather task is running");
                    slot_sender
                        .send((index, SlotOutcome::Unchanged(nodes)))
                        .expect("the gather task is running");
                }
                BlockRefinement::Split {
                    reused,
                    fresh,
                    singletons,
                } => {
                    singleton_sender.send(singletons).expect("the gather task is running");
                    fresh_sender.send(fresh).expect("the gather task is running");

                    let outcome = match reused {
                        Some(block) => SlotOutcome::Reused(block),
                        None => SlotOutcome::Dissolved,
                    };
                    slot_sender.send((index, outcome)).expect("the gather task is running");
                }
            }
        });

        gather.join().expect("the gather task panicked")
    });

    // Rebuild the dirty set: any block containing a parent of a changed node
    // may split in the next step. Singleton parents cannot split.
    dirty.clear();
    for &slot in &changed.slots {
        for &node in blocks.block(slot) {
            mark_parents_dirty(parents, &next_mapping, node, &mut dirty);
        }
    }
    for &node in &changed.singletons {
        mark_parents_dirty(parents, &next_mapping, node, &mut dirty);
    }

    KBisimulationOutcome {
        blocks,
        dirty,
        node_to_block: Box::new(next_mapping),
    }
}

fn mark_parents_dirty(
    parents: &ParentIndex,
    mapping: &MappingNodeToBlock,
    node: NodeIndex,
    dirty: &mut DirtyBlocks,
) {
    for parent in parents.parents(node) {
        if let Some(block) = mapping.class_of(parent).block_index() {
            dirty.set_dirty(block);
        }
    }
}

/// Consumes the emissions of all workers of one step. This task is the only
/// mutator of the block table and the write-side mapping, so slot writes and
/// mapping writes need no further synchronisation.
fn gather_refinements(
    mut blocks: BlockTable,
    mut mapping: MappingNodeToBlock,
    singleton_receiver: Receiver<Vec<NodeIndex>>,
    fresh_receiver: Receiver<Vec<Block>>,
    slot_receiver: Receiver<(BlockIndex, SlotOutcome)>,
    num_of_workers: usize,
) -> (BlockTable, MappingNodeToBlock, ChangedNodes) {
    let mut changed = ChangedNodes {
        slots: Vec::new(),
        singletons: Vec::new(),
    };

    let mut singleton_messages = num_of_workers;
    let mut fresh_messages = num_of_workers;
    let mut slot_messages = num_of_workers;

    // Consume messages as they arrive so that a slot freed by one worker can
    // be reused for another worker's fresh blocks within the same step.
    while singleton_messages + fresh_messages + slot_messages > 0 {
        select! {
            recv(singleton_receiver) -> message => {
                let nodes = message.expect("a worker stopped before sending all its results");
                singleton_messages -= 1;

                for &node in &nodes {
                    mapping.put_into_singleton(node);
                }
                changed.singletons.extend(nodes);
            }
            recv(fresh_receiver) -> message => {
                let fresh = message.expect("a worker stopped before sending all its results");
                fresh_messages -= 1;

                for block in fresh {
                    // Fill a hole when one is known, otherwise grow the table.
                    let slot = match mapping.pop_free_block() {
                        Some(slot) => {
                            blocks.place(slot, block);
                            slot
                        }
                        None => blocks.push(block),
                    };

                    let class = ClassId::block(slot);
                    for &node in blocks.block(slot) {
                        mapping.overwrite(node, class);
                    }

                    changed.slots.push(slot);
                }
            }
            recv(slot_receiver) -> message => {
                let (index, outcome) = message.expect("a worker stopped before sending all its results");
                slot_messages -= 1;

                match outcome {
                    SlotOutcome::Unchanged(block) => {
                        blocks.place(index, block);
                    }
                    SlotOutcome::Reused(block) => {
                        // The nodes already map to this slot; no mapping writes.
                        blocks.place(index, block);
                        changed.slots.push(index);
                    }
                    SlotOutcome::Dissolved => {
                        mapping.push_free_block(index);
                    }
                }
            }
        }
    }

    (blocks, mapping, changed)
}
