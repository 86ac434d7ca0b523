mod config;
mod manager;
mod stats;
#[cfg(test)]
mod tests;
mod worker;

pub use config::*;
pub use manager::*;
pub use stats::*;
pub use worker::{WorkerExit, WorkerId};
