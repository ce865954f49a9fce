//! Storage layer.
//!
//! Provides database access via SQLx with SQLite.

mod models;
pub mod query;
mod repository;

pub use repository::StoreRatingRepository;

#[cfg(test)]
pub(crate) use repository::tests::setup_test_db;
