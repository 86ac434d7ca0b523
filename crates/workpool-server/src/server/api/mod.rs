//! HTTP control surface over the worker pool.
//!
//! ## Structure
//!
//! - [`routes`] - router, shared state and CORS policy.
//! - [`handler`] - one handler per route.
//! - [`error`] - request validation errors.

pub mod error;
pub mod handler;
pub mod routes;
