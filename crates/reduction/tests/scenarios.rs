//! End-to-end refinement runs on small graphs loaded through the binary
//! triple format, checking the block and singleton counts after every step.

use std::io::Cursor;

use test_log::test;

use fbsim_graph::Graph;
use fbsim_graph::read_triple_graph;
use fbsim_reduction::ClassCounts;
use fbsim_reduction::full_forward_bisimulation;
use fbsim_reduction::is_stable_partition;
use fbsim_utilities::Timing;

/// Encodes one record of the triple format: 5-byte source, 4-byte label,
/// 5-byte target, all little endian.
fn triple_bytes(source: u64, label: u32, target: u64) -> [u8; 14] {
    let mut record = [0u8; 14];
    record[0..5].copy_from_slice(&source.to_le_bytes()[..5]);
    record[5..9].copy_from_slice(&label.to_le_bytes());
    record[9..14].copy_from_slice(&target.to_le_bytes()[..5]);
    record
}

fn graph_from_edges(edges: &[(u64, u32, u64)]) -> Graph {
    let mut stream = Vec::with_capacity(edges.len() * 14);
    for &(source, label, target) in edges {
        stream.extend_from_slice(&triple_bytes(source, label, target));
    }

    read_triple_graph(Cursor::new(stream)).expect("the test stream is well formed")
}

/// Runs the full loop and checks the counts after every step and the fixed
/// point, which is one step before the final confirming step.
fn assert_scenario(edges: &[(u64, u32, u64)], blocks: &[usize], singletons: &[u64], fixed_point: usize) {
    let graph = graph_from_edges(edges);
    let mut timing = Timing::new();

    let (counts, outcome) = full_forward_bisimulation(&graph, 0, &mut timing);

    let expected: Vec<ClassCounts> = blocks
        .iter()
        .zip(singletons)
        .map(|(&blocks, &singletons)| ClassCounts { blocks, singletons })
        .collect();

    assert_eq!(counts, expected, "per-step counts differ");
    assert_eq!(counts.len() - 1, fixed_point, "fixed point differs");
    assert!(is_stable_partition(&graph, &outcome));
}

#[test]
fn test_simple_chain() {
    // a -> b -> ... -> i over nine nodes, all with the same label. Every step
    // peels one more node off the tail until only singletons remain.
    let edges: Vec<(u64, u32, u64)> = (0..8).map(|node| (node, 0, node + 1)).collect();

    assert_scenario(
        &edges,
        &[1, 1, 1, 1, 1, 1, 1, 0, 0],
        &[1, 2, 3, 4, 5, 6, 7, 9, 9],
        8,
    );
}

#[test]
fn test_simple_cycle() {
    // A uniformly labelled cycle on nodes 1..=5; node 0 is materialised by
    // the loader and immediately becomes the only singleton.
    let edges = [(1, 0, 2), (2, 0, 3), (3, 0, 4), (4, 0, 5), (5, 0, 1)];

    assert_scenario(&edges, &[1, 1], &[1, 1], 1);
}

#[test]
fn test_simple_edge() {
    let edges = [(0, 0, 1)];

    assert_scenario(&edges, &[0, 0], &[2, 2], 1);
}

#[test]
fn test_simple_self_loop() {
    // Two disjoint self-loops with distinct labels.
    let edges = [(0, 0, 0), (1, 1, 1)];

    assert_scenario(&edges, &[0, 0], &[2, 2], 1);
}

#[test]
fn test_simple_dag() {
    // A nine-node DAG: a tail chain 7 -> 8 and 6 -> 7 producing one new
    // singleton per early step, then three pairs that split off one block at
    // a time.
    let edges = [
        (7, 0, 8),
        (6, 0, 7),
        (4, 0, 6),
        (5, 0, 6),
        (2, 0, 4),
        (3, 0, 5),
        (0, 0, 2),
        (1, 0, 3),
    ];

    assert_scenario(&edges, &[1, 1, 1, 2, 3, 3], &[1, 2, 3, 3, 3, 3], 5);
}

#[test]
fn test_heterogeneous_cycle() {
    // A four-cycle on nodes 1..=4 with alternating labels; node 0 is implied.
    // The cycle splits once into the two alternation classes.
    let edges = [(1, 1, 2), (2, 2, 3), (3, 1, 4), (4, 2, 1)];

    assert_scenario(&edges, &[2, 2], &[1, 1], 1);
}

#[test]
fn test_min_support_skips_small_blocks() {
    // With a support threshold above the block size nothing is ever
    // refined, so the starting counts are immediately stable.
    let edges: Vec<(u64, u32, u64)> = (0..8).map(|node| (node, 0, node + 1)).collect();
    let graph = graph_from_edges(&edges);
    let mut timing = Timing::new();

    let (counts, outcome) = full_forward_bisimulation(&graph, 100, &mut timing);

    assert_eq!(
        counts,
        vec![ClassCounts {
            blocks: 1,
            singletons: 0
        }]
    );
    assert_eq!(outcome.total_class_count(), 1);
}
