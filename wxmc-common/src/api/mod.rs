//! Shared HTTP API functionality
//!
//! Framework-free: account/token logic and wire types. The server crate wraps
//! these with axum extractors and middleware.

pub mod auth;
pub mod types;

pub use auth::{authenticate, generate_token, hash_password, login, register, verify_password};
pub use types::{ErrorResponse, LoginForm, RegisterRequest, TokenResponse};
