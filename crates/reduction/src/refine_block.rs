#![forbid(unsafe_code)]

use rayon::prelude::*;

use fbsim_graph::Graph;
use fbsim_graph::NodeIndex;

use crate::Block;
use crate::NodeToBlock;
use crate::SignatureBlockMap;
use crate::SignatureBuilder;

/// Number of nodes a single chunk task processes when computing signatures.
pub(crate) const SIGNATURE_CHUNK_SIZE: usize = 100;

/// The result of refining one dirty block.
pub(crate) enum BlockRefinement {
    /// All nodes share one signature; the block flows back to its slot
    /// untouched.
    Unchanged(Block),
    /// The block split into at least two groups.
    Split {
        /// The largest non-singleton group, destined for the original slot.
        /// None when the block dissolved into singletons only, which turns
        /// the slot into a hole.
        reused: Option<Block>,
        /// The remaining non-singleton groups, which need slots of their own.
        fresh: Vec<Block>,
        /// Nodes that ended up alone in their group.
        singletons: Vec<NodeIndex>,
    },
}

/// Splits one dirty block by the signatures of its nodes against the mapping
/// of the previous step.
pub(crate) fn refine_block(graph: &Graph, previous: &dyn NodeToBlock, nodes: Block) -> BlockRefinement {
    // Fixed-size chunks compute local signature groups concurrently; the
    // local maps are folded into one map for the whole block. The merge is
    // commutative up to signature equality, so arrival order does not matter.
    let merged = nodes
        .par_chunks(SIGNATURE_CHUNK_SIZE)
        .map(|chunk| {
            let mut groups = SignatureBlockMap::default();
            let mut builder = SignatureBuilder::default();

            for &node in chunk {
                for edge in graph.outgoing_edges(node) {
                    builder.push(edge.label, previous.class_of(edge.target));
                }

                groups.put(builder.build(), node);
            }

            groups
        })
        .reduce(SignatureBlockMap::default, SignatureBlockMap::merge_destructive);

    if merged.is_single_group() {
        return BlockRefinement::Unchanged(nodes);
    }

    let mut singletons = Vec::new();
    let mut candidates: Vec<Block> = Vec::new();

    for group in merged.into_groups() {
        if group.len() == 1 {
            singletons.push(group[0]);
        } else {
            candidates.push(group);
        }
    }

    // The largest group inherits the original slot so that its nodes need no
    // remapping; a tie goes to the group encountered first.
    let reused = if candidates.is_empty() {
        None
    } else {
        let mut largest = 0;
        for index in 1..candidates.len() {
            if candidates[index].len() > candidates[largest].len() {
                largest = index;
            }
        }

        Some(candidates.swap_remove(largest))
    };

    BlockRefinement::Split {
        reused,
        fresh: candidates,
        singletons,
    }
}
