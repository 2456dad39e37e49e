#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

// Node ids in the triple format are 40 bits wide and are stored as usize.
#[cfg(not(target_pointer_width = "64"))]
compile_error!("fbsim_graph requires a 64-bit target since node indices may exceed 32 bits");

mod graph;
mod io_binary;
mod parent_index;
mod random_graph;

pub use graph::*;
pub use io_binary::*;
pub use parent_index::*;
pub use random_graph::*;
