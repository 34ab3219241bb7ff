//! Database schema, user accounts, sessions and model storage

pub mod init;
pub mod models;
pub mod sessions;
pub mod users;

pub use init::*;
pub use models::*;
pub use sessions::*;
pub use users::*;
