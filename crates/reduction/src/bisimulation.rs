#![forbid(unsafe_code)]

use log::debug;
use log::info;
use log::trace;
use rustc_hash::FxHashMap;

use fbsim_graph::Graph;
use fbsim_graph::NodeIndex;
use fbsim_graph::ParentIndex;
use fbsim_utilities::TimeProgress;
use fbsim_utilities::Timing;

use crate::AllToZeroNodeToBlock;
use crate::Block;
use crate::BlockIndex;
use crate::BlockTable;
use crate::ClassId;
use crate::DirtyBlocks;
use crate::NodeToBlock;
use crate::Signature;
use crate::SignatureBuilder;
use crate::refine_step::refine_step;

/// The partition after k refinement steps: the block table, the dirty blocks
/// for the next step, and the node-to-class mapping.
pub struct KBisimulationOutcome {
    pub(crate) blocks: BlockTable,
    pub(crate) dirty: DirtyBlocks,
    pub(crate) node_to_block: Box<dyn NodeToBlock>,
}

impl KBisimulationOutcome {
    /// The fixed starting state of the refinement: a single block containing
    /// every node, marked dirty, mapped by the constant all-to-zero mapping.
    /// Requires a graph with at least two nodes.
    pub fn initial(graph: &Graph) -> KBisimulationOutcome {
        let nodes: Block = graph.iter_nodes().collect();
        let mapping = AllToZeroNodeToBlock::new(nodes.len());

        let mut dirty = DirtyBlocks::new(1);
        dirty.set_dirty(BlockIndex::new(0));

        KBisimulationOutcome {
            blocks: BlockTable::new_single(nodes),
            dirty,
            node_to_block: Box::new(mapping),
        }
    }

    /// Returns the class of the given node.
    pub fn class_of(&self, node: NodeIndex) -> ClassId {
        self.node_to_block.class_of(node)
    }

    /// Returns the number of singleton classes.
    pub fn singleton_count(&self) -> u64 {
        self.node_to_block.singleton_count()
    }

    /// Returns the number of live (non-hole) blocks in the table.
    pub fn live_block_count(&self) -> usize {
        self.blocks.num_of_slots() - self.node_to_block.free_block_count()
    }

    /// Returns the total number of classes in the partition.
    pub fn total_class_count(&self) -> u64 {
        self.live_block_count() as u64 + self.singleton_count()
    }

    /// Returns the counts summarising this partition.
    pub fn counts(&self) -> ClassCounts {
        ClassCounts {
            blocks: self.live_block_count(),
            singletons: self.singleton_count(),
        }
    }

    /// Returns the table of non-singleton blocks.
    pub fn blocks(&self) -> &BlockTable {
        &self.blocks
    }
}

/// Per-step summary of a partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassCounts {
    /// Number of live blocks, the classes with at least two members.
    pub blocks: usize,
    /// Number of singleton classes.
    pub singletons: u64,
}

/// Computes the full forward bisimulation of the graph: the partition is
/// refined until neither the block count nor the singleton count changes
/// between steps.
///
/// Returns the counts after every step together with the final partition.
/// The fixed point k is one less than the number of recorded steps, since
/// the last step only confirms stability.
pub fn full_forward_bisimulation(
    graph: &Graph,
    min_support: u64,
    timing: &mut Timing,
) -> (Vec<ClassCounts>, KBisimulationOutcome) {
    let mut timer = timing.start("parent index");
    let parents = ParentIndex::new(graph);
    timer.finish();

    let mut timer = timing.start("refinement");
    let mut outcome = KBisimulationOutcome::initial(graph);
    let mut previous = outcome.counts();
    let mut counts = Vec::new();

    let progress = TimeProgress::new(
        |(step, classes)| {
            info!("Step {step}, {classes} classes...");
        },
        5,
    );

    loop {
        outcome = refine_step(graph, &parents, outcome, min_support);

        let current = outcome.counts();
        counts.push(current);

        debug!(
            "step {}: {} blocks, {} singletons",
            counts.len(),
            current.blocks,
            current.singletons
        );
        progress.print((counts.len(), outcome.total_class_count()));

        if current == previous {
            break;
        }
        previous = current;
    }
    timer.finish();

    (counts, outcome)
}

/// Returns true iff the partition is a stable and maximal refinement: nodes
/// in the same class have equal signatures against the partition itself, and
/// no two classes share a signature.
pub fn is_stable_partition(graph: &Graph, outcome: &KBisimulationOutcome) -> bool {
    let mut builder = SignatureBuilder::default();
    let mut class_to_signature: FxHashMap<ClassId, Signature> = FxHashMap::default();
    let mut signature_to_class: FxHashMap<Signature, ClassId> = FxHashMap::default();

    for node in graph.iter_nodes() {
        for edge in graph.outgoing_edges(node) {
            builder.push(edge.label, outcome.class_of(edge.target));
        }
        let signature = builder.build();
        let class = outcome.class_of(node);

        if let Some(existing) = class_to_signature.get(&class) {
            if *existing != signature {
                trace!("node {node} disagrees with class {class} on the signature");
                return false;
            }
        } else {
            class_to_signature.insert(class, signature.clone());
        }

        match signature_to_class.get(&signature) {
            Some(existing) if *existing != class => {
                trace!("classes {existing} and {class} share the signature {signature:?}");
                return false;
            }
            Some(_) => {}
            None => {
                signature_to_class.insert(signature, class);
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use rustc_hash::FxHashMap;
    use test_log::test;

    use fbsim_graph::EdgeLabel;
    use fbsim_graph::random_graph;
    use fbsim_utilities::random_test;

    /// Whole-graph signature refinement without dirty tracking, as a
    /// reference. Classes are dense integers; singletons are ordinary classes
    /// here, which does not change the induced equivalence.
    fn naive_partition(graph: &Graph) -> Vec<usize> {
        let mut classes: Vec<usize> = vec![0; graph.num_of_nodes()];
        let mut num_of_classes = 1;

        loop {
            let mut keys: FxHashMap<(usize, Vec<(EdgeLabel, usize)>), usize> = FxHashMap::default();
            let mut next: Vec<usize> = Vec::with_capacity(graph.num_of_nodes());

            for node in graph.iter_nodes() {
                let mut signature: Vec<(EdgeLabel, usize)> = graph
                    .outgoing_edges(node)
                    .map(|edge| (edge.label, classes[edge.target.value()]))
                    .collect();
                signature.sort_unstable();
                signature.dedup();

                let fresh = keys.len();
                let class = *keys.entry((classes[node.value()], signature)).or_insert(fresh);
                next.push(class);
            }

            let count = keys.len();
            classes = next;

            if count == num_of_classes {
                return classes;
            }
            num_of_classes = count;
        }
    }

    /// Returns true iff both partitions induce the same equivalence relation.
    fn equivalent_partitions(graph: &Graph, outcome: &KBisimulationOutcome, reference: &[usize]) -> bool {
        let mut forward: FxHashMap<ClassId, usize> = FxHashMap::default();
        let mut backward: FxHashMap<usize, ClassId> = FxHashMap::default();

        for node in graph.iter_nodes() {
            let class = outcome.class_of(node);
            let expected = reference[node.value()];

            if *forward.entry(class).or_insert(expected) != expected {
                return false;
            }
            if *backward.entry(expected).or_insert(class) != class {
                return false;
            }
        }

        true
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Miri is too slow
    fn test_random_full_forward_bisimulation() {
        random_test(100, |rng| {
            let graph = random_graph(rng, 10, 3, 3);
            let mut timing = Timing::new();

            let (counts, outcome) = full_forward_bisimulation(&graph, 0, &mut timing);

            // The fixed point is stable and maximal, and matches the naive
            // whole-graph refinement.
            assert!(is_stable_partition(&graph, &outcome));
            assert!(equivalent_partitions(&graph, &outcome, &naive_partition(&graph)));

            // Class counts never decrease, and the last step confirms the
            // one before it.
            let mut total = 1;
            for count in &counts {
                let current = count.blocks as u64 + count.singletons;
                assert!(current >= total, "the class count decreased: {counts:?}");
                total = current;
            }
            assert!(counts.len() >= 2 || counts[0] == ClassCounts { blocks: 1, singletons: 0 });
        });
    }

    #[test]
    #[cfg_attr(miri, ignore)] // Miri is too slow
    fn test_random_stability_persists() {
        random_test(25, |rng| {
            let graph = random_graph(rng, 10, 3, 3);
            let parents = ParentIndex::new(&graph);

            let mut outcome = KBisimulationOutcome::initial(&graph);
            let mut previous = outcome.counts();

            loop {
                outcome = refine_step(&graph, &parents, outcome, 0);
                let current = outcome.counts();

                if current == previous {
                    break;
                }
                previous = current;
            }

            // Once stable, further steps change nothing.
            for _ in 0..2 {
                outcome = refine_step(&graph, &parents, outcome, 0);
                assert_eq!(outcome.counts(), previous, "the fixed point did not persist");
            }
            assert!(is_stable_partition(&graph, &outcome));
        });
    }

    #[test]
    fn test_initial_outcome() {
        let mut graph = Graph::new();
        graph.add_edge(NodeIndex::new(0), 0, NodeIndex::new(1));

        let outcome = KBisimulationOutcome::initial(&graph);

        assert_eq!(
            outcome.counts(),
            ClassCounts {
                blocks: 1,
                singletons: 0
            }
        );
        assert_eq!(outcome.class_of(NodeIndex::new(1)), ClassId::block(BlockIndex::new(0)));
        assert!(outcome.dirty.is_dirty(BlockIndex::new(0)));
    }

    #[test]
    #[should_panic]
    fn test_initial_outcome_rejects_single_node() {
        let mut graph = Graph::new();
        graph.resize_to(1);

        let _ = KBisimulationOutcome::initial(&graph);
    }
}
