mod common;
mod image;
mod ops;

pub mod prelude;

#[cfg(feature = "bench")]
pub mod bench;

pub use prelude::*;
