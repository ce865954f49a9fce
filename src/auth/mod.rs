//! Authentication module.
//!
//! - JWT: bearer tokens issued at register/login
//! - Password: Argon2id hashing for stored credentials
//! - Middleware: token verification and the admin gate

mod jwt;
mod middleware;
mod password;

pub use jwt::*;
pub use middleware::*;
pub use password::*;
