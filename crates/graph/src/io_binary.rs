#![forbid(unsafe_code)]

use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use log::info;
use thiserror::Error;

use fbsim_utilities::LargeFormatter;
use fbsim_utilities::TimeProgress;

use crate::EdgeLabel;
use crate::Graph;
use crate::NodeIndex;

/// Number of bytes of a node id in the triple format (40-bit little endian).
pub const BYTES_PER_NODE: usize = 5;

/// Number of bytes of an edge label in the triple format (32-bit little endian).
pub const BYTES_PER_LABEL: usize = 4;

/// A record is source, label, target.
pub const BYTES_PER_TRIPLE: usize = 2 * BYTES_PER_NODE + BYTES_PER_LABEL;

/// Buffer size used when reading graph files.
const READ_BUFFER_SIZE: usize = 8 * 16184;

#[derive(Debug, Error)]
pub enum GraphReadError {
    #[error("failed to read the graph stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("the stream ended in the middle of a triple; its length must be a multiple of {BYTES_PER_TRIPLE} bytes")]
    TruncatedTriple,
}

/// Reads a graph from a stream of fixed-width binary triples.
///
/// # Details
///
/// Every record is 14 bytes: a 5-byte little-endian source id, a 4-byte
/// little-endian label and a 5-byte little-endian target id. The node table
/// grows to `max(source, target) + 1` for every record, so node ids that
/// never appear as an endpoint are still materialised when a larger id has
/// been seen. The stream ends at a record boundary; anything else is a
/// [`GraphReadError::TruncatedTriple`].
pub fn read_triple_graph(mut reader: impl Read) -> Result<Graph, GraphReadError> {
    let mut graph = Graph::new();

    let progress = TimeProgress::new(
        |count| {
            info!("Read {} triples...", LargeFormatter(count));
        },
        1,
    );

    let mut buffer = [0u8; BYTES_PER_TRIPLE];
    let mut triple_count = 0u64;

    while read_triple(&mut reader, &mut buffer)? {
        let source = decode_node(&buffer[0..BYTES_PER_NODE]);
        let label = decode_label(&buffer[BYTES_PER_NODE..BYTES_PER_NODE + BYTES_PER_LABEL]);
        let target = decode_node(&buffer[BYTES_PER_NODE + BYTES_PER_LABEL..BYTES_PER_TRIPLE]);

        graph.add_edge(source, label, target);

        triple_count += 1;
        progress.print(triple_count);
    }

    info!(
        "Read {} triples; the graph has {} nodes",
        LargeFormatter(triple_count),
        LargeFormatter(graph.num_of_nodes())
    );

    Ok(graph)
}

/// Reads a graph in the binary triple format from the given file.
pub fn read_triple_graph_from_file(path: impl AsRef<Path>) -> Result<Graph, GraphReadError> {
    let file = File::open(path)?;
    read_triple_graph(BufReader::with_capacity(READ_BUFFER_SIZE, file))
}

/// Fills the buffer with the next triple. Returns false at a clean end of
/// stream; a stream that ends inside a triple is an error.
fn read_triple(reader: &mut impl Read, buffer: &mut [u8; BYTES_PER_TRIPLE]) -> Result<bool, GraphReadError> {
    let mut filled = 0;

    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => {
                return if filled == 0 {
                    Ok(false)
                } else {
                    Err(GraphReadError::TruncatedTriple)
                };
            }
            Ok(count) => filled += count,
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error.into()),
        }
    }

    Ok(true)
}

fn decode_node(bytes: &[u8]) -> NodeIndex {
    let mut value = [0u8; 8];
    value[..BYTES_PER_NODE].copy_from_slice(bytes);

    NodeIndex::new(u64::from_le_bytes(value) as usize)
}

fn decode_label(bytes: &[u8]) -> EdgeLabel {
    let mut value = [0u8; 4];
    value.copy_from_slice(bytes);

    EdgeLabel::from_le_bytes(value)
}
