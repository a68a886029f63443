pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod storage;
pub mod utils;

pub use auth::{AuthService, Session};
pub use config::AccountsConfig;
pub use storage::CredentialStore;
