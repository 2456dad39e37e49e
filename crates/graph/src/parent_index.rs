#![forbid(unsafe_code)]

use rustc_hash::FxHashSet;

use crate::Graph;
use crate::NodeIndex;

/// Stores, for every node, the distinct source nodes that have an edge to it.
///
/// # Details
///
/// Parallel edges are collapsed: a source appears at most once in the parent
/// sequence of a target, so consumers can iterate parents without seeing the
/// same node twice. The index is immutable after construction.
pub struct ParentIndex {
    /// Offset of every node's parent sequence in `sources`, plus a sentinel.
    offsets: Vec<usize>,
    sources: Vec<NodeIndex>,
}

impl ParentIndex {
    pub fn new(graph: &Graph) -> ParentIndex {
        // Collect the sources per target in a set first to remove duplicates.
        let mut unique: Vec<FxHashSet<NodeIndex>> = vec![FxHashSet::default(); graph.num_of_nodes()];
        for source in graph.iter_nodes() {
            for edge in graph.outgoing_edges(source) {
                unique[edge.target].insert(source);
            }
        }

        // Materialise the final compact index.
        let mut offsets = Vec::with_capacity(graph.num_of_nodes() + 1);
        let mut sources = Vec::new();

        offsets.push(0);
        for parents in &unique {
            sources.extend(parents.iter().copied());
            offsets.push(sources.len());
        }

        ParentIndex { offsets, sources }
    }

    /// Returns an iterator over the distinct parents of the given node.
    pub fn parents(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let start = self.offsets[node.value()];
        let end = self.offsets[node.value() + 1];

        self.sources[start..end].iter().copied()
    }

    /// Returns the number of nodes covered by the index.
    pub fn num_of_nodes(&self) -> usize {
        self.offsets.len() - 1
    }
}
