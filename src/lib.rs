#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

mod config;
mod error;
mod graph;
mod node;
mod random;
#[cfg(feature = "concurrent")]
mod shared;
mod value;

pub use config::*;
pub use error::*;
pub use graph::*;
pub use node::*;
pub use random::*;
#[cfg(feature = "concurrent")]
pub use shared::*;
pub use value::*;
