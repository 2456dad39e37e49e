#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

mod error;
mod format;
mod identity_hasher;
mod progress;
mod random_test;
mod test_logger;
mod timing;
mod typed_index;

pub use error::*;
pub use format::*;
pub use identity_hasher::*;
pub use progress::*;
pub use random_test::*;
pub use test_logger::*;
pub use timing::*;
pub use typed_index::*;
