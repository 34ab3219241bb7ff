//! HTTP API handlers for wxmc-server

pub mod accounts;
pub mod auth;
pub mod error;
pub mod forecast;
pub mod health;

pub use accounts::{protected_routes as account_routes, public_routes as registration_routes};
pub use auth::{auth_middleware, AuthUser};
pub use error::ApiError;
pub use forecast::forecast_routes;
pub use health::health_routes;
