//! Authentication system
//!
//! Handles credential hashing, login, account management, sessions and form validation.

pub mod passwords;
pub mod results;
pub mod service;
pub mod session;
pub mod validator;

pub use passwords::PasswordService;
pub use results::LoginResult;
pub use service::AuthService;
pub use session::Session;
pub use validator::{CredentialChangeForm, LoginForm, NewAccountForm};
