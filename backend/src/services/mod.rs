//! Business logic services
//!
//! Services encapsulate business logic and coordinate between
//! repositories and external systems.

pub mod auth;
pub mod catalog;

pub use auth::{AuthService, SessionGrant};
pub use catalog::CatalogService;
