//! Domain types for the Store Rating API.
//!
//! This module contains the core business entities and value objects.

mod rating;
mod stats;
mod store;
mod user;
pub mod validation;

pub use rating::*;
pub use stats::*;
pub use store::*;
pub use user::*;
