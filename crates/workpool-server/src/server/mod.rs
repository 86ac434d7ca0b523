//! Server plumbing around the [`workpool`] core: configuration, telemetry and
//! the HTTP control API.

pub mod api;
pub mod config;
pub mod telemetry;
