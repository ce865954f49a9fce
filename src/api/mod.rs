//! HTTP API layer for the Store Rating service.
//!
//! Provides REST endpoints for accounts, stores and ratings.

mod extract;
pub mod handlers;
mod routes;
mod types;

pub use routes::{build_router, cors_layer};
