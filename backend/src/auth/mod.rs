//! Authentication module
//!
//! Cookie-carried JWT sessions with argon2 password hashing.

pub mod cookie;
mod jwt;
mod middleware;
mod password;

pub use jwt::{Claims, JwtService, TokenKind};
pub use middleware::SessionUser;
pub use password::PasswordService;
