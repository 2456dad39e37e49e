#![forbid(unsafe_code)]

use std::hash::Hash;
use std::hash::Hasher;

use rustc_hash::FxHasher;

use fbsim_graph::EdgeLabel;

use crate::ClassId;

/// One observation of an outgoing edge: its label and the class of its
/// target in the previous partition.
pub type SignaturePiece = (EdgeLabel, ClassId);

/// The canonical signature of a node: its pieces sorted by (label, class)
/// with duplicates removed, plus a hash computed once over that canonical
/// form. A node without outgoing edges has the empty signature.
#[derive(Clone, Debug)]
pub struct Signature {
    pieces: Vec<SignaturePiece>,
    hash: u64,
}

impl Signature {
    fn new(pieces: Vec<SignaturePiece>) -> Signature {
        let hash = hash_pieces(&pieces);
        Signature { pieces, hash }
    }

    /// The canonical pieces of this signature.
    pub fn pieces(&self) -> &[SignaturePiece] {
        &self.pieces
    }

    /// The stable 64-bit hash of the canonical pieces.
    pub fn hash64(&self) -> u64 {
        self.hash
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        // Both sides are sorted, so a linear comparison suffices.
        self.pieces == other.pieces
    }
}

impl Eq for Signature {}

impl Hash for Signature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Hashes the byte serialisation of the pieces in order: 4 little-endian
/// label bytes followed by the 8 little-endian bytes of the sign-encoded
/// class.
fn hash_pieces(pieces: &[SignaturePiece]) -> u64 {
    let mut hasher = FxHasher::default();

    for (label, class) in pieces {
        hasher.write(&label.to_le_bytes());
        hasher.write(&class.to_unsigned().to_le_bytes());
    }

    hasher.finish()
}

/// Accumulates the pieces of one node's signature. The builder keeps its
/// storage across nodes; `build` leaves it empty and ready for the next node.
#[derive(Clone, Debug, Default)]
pub struct SignatureBuilder {
    pieces: Vec<SignaturePiece>,
}

impl SignatureBuilder {
    /// Appends a piece. A piece equal to the last appended one is dropped
    /// right away, since adjacency lists reasonably often repeat an edge;
    /// `build` still sorts and removes the remaining duplicates.
    pub fn push(&mut self, label: EdgeLabel, class: ClassId) {
        if self.pieces.last() == Some(&(label, class)) {
            return;
        }

        self.pieces.push((label, class));
    }

    /// Returns the number of pieces currently held.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// Returns true iff no piece has been appended.
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Produces the canonical signature: pieces sorted by (label ascending,
    /// class ascending under signed comparison) with adjacent duplicates
    /// removed.
    pub fn build(&mut self) -> Signature {
        self.pieces.sort_unstable();
        self.pieces.dedup();

        let signature = Signature::new(self.pieces.clone());
        self.pieces.clear();

        signature
    }
}
