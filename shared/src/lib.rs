//! Library Catalog Shared Library
//!
//! This crate contains the models, API types and validation helpers shared
//! between the backend and its clients.

pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use models::{Book, Role, User};
pub use types::*;
