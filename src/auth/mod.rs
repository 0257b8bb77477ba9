//! Authentication module
//!
//! Password hashing, bearer-token issue/verify, the session guard
//! middleware, and the account endpoints (signup, verification, login,
//! logout, current, avatar).

pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use jwt::{issue_token, verify_token, Claims};
pub use middleware::{authenticate, AuthUser};
pub use password::{hash_password, verify_password};
