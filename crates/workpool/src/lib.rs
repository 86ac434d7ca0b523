#![doc = include_str!("../README.md")]

mod error;
mod pool;
mod queue;

pub use crate::error::*;
pub use crate::pool::*;
pub use crate::queue::*;
