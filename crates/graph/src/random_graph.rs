#![forbid(unsafe_code)]

use rand::Rng;

use crate::EdgeLabel;
use crate::Graph;
use crate::NodeIndex;

/// Generates a random graph with the desired number of nodes and labels, and
/// at most the given out degree per node. Parallel edges can occur, which
/// exercises the deduplication in the parent index and in signatures.
pub fn random_graph(rng: &mut impl Rng, num_of_nodes: usize, num_of_labels: u32, outdegree: usize) -> Graph {
    let mut graph = Graph::with_capacity(num_of_nodes);
    graph.resize_to(num_of_nodes);

    for source in 0..num_of_nodes {
        for _ in 0..rng.random_range(0..=outdegree) {
            let label: EdgeLabel = rng.random_range(0..num_of_labels);
            let target = rng.random_range(0..num_of_nodes);

            graph.add_edge(NodeIndex::new(source), label, NodeIndex::new(target));
        }
    }

    graph
}
