#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod bisimulation;
mod block_table;
mod class_id;
mod dirty;
mod node_to_block;
mod refine_block;
mod refine_step;
mod signature;
mod signature_block_map;

pub use bisimulation::*;
pub use block_table::*;
pub use class_id::*;
pub use dirty::*;
pub use node_to_block::*;
pub use refine_step::*;
pub use signature::*;
pub use signature_block_map::*;
