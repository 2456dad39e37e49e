#![forbid(unsafe_code)]

use std::collections::HashMap;

use fbsim_graph::NodeIndex;
use fbsim_utilities::BuildIdentityHasher;

use crate::Block;
use crate::Signature;

/// Groups the nodes of one block by their signature.
///
/// # Details
///
/// The outer table is keyed by the precomputed signature hash behind an
/// identity hasher; entries within a bucket are distinguished by full
/// signature equality, so hash collisions only cost a linear scan of a
/// usually tiny bucket. The map is transient: it lives for the refinement of
/// a single block.
#[derive(Default)]
pub struct SignatureBlockMap {
    buckets: HashMap<u64, Vec<(Signature, Block)>, BuildIdentityHasher>,
    num_of_groups: usize,
}

impl SignatureBlockMap {
    /// Adds the node to the group of the given signature.
    pub fn put(&mut self, signature: Signature, node: NodeIndex) {
        let bucket = self.buckets.entry(signature.hash64()).or_default();

        if let Some((_, nodes)) = bucket.iter_mut().find(|(existing, _)| *existing == signature) {
            nodes.push(node);
        } else {
            bucket.push((signature, vec![node]));
            self.num_of_groups += 1;
        }
    }

    /// Folds all groups of `other` into `self`. Taking `other` by value makes
    /// it unusable afterwards.
    pub fn merge_destructive(mut self, other: SignatureBlockMap) -> SignatureBlockMap {
        for (_, bucket) in other.buckets {
            for (signature, nodes) in bucket {
                self.insert_group(signature, nodes);
            }
        }

        self
    }

    fn insert_group(&mut self, signature: Signature, mut nodes: Block) {
        let bucket = self.buckets.entry(signature.hash64()).or_default();

        if let Some((_, existing)) = bucket.iter_mut().find(|(existing, _)| *existing == signature) {
            existing.append(&mut nodes);
        } else {
            bucket.push((signature, nodes));
            self.num_of_groups += 1;
        }
    }

    /// Returns the number of distinct signatures in the map.
    pub fn num_of_groups(&self) -> usize {
        self.num_of_groups
    }

    /// Returns true iff all nodes fell into a single group, meaning the block
    /// did not split.
    pub fn is_single_group(&self) -> bool {
        self.num_of_groups == 1
    }

    /// Consumes the map and returns the node groups.
    pub fn into_groups(self) -> impl Iterator<Item = Block> {
        self.buckets
            .into_iter()
            .flat_map(|(_, bucket)| bucket.into_iter().map(|(_, nodes)| nodes))
    }
}
