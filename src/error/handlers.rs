//! Error handlers
//!
//! Maps errors to the messages shown by the administrative UI and logs them.

use crate::error::types::{AccountsError, AuthError, StoreError};
use log::{error, warn};

/// Shown for every failed login, whatever the underlying cause
pub const LOGIN_FAILED_MESSAGE: &str = "Invalid username or password.";

/// Log an error at a level matching its severity
pub fn handle_error(err: &AccountsError) {
    if is_internal(err) {
        error!("Account store error: {}", err);
    } else {
        warn!("Rejected account operation: {}", err);
    }
}

/// Whether the error comes from the store rather than from the caller's input
pub fn is_internal(err: &AccountsError) -> bool {
    matches!(
        err,
        AccountsError::Store(_) | AccountsError::Auth(AuthError::Store(_)) | AccountsError::Config(_)
    )
}

/// Convert an error to the message displayed to the user
pub fn user_message(err: &AccountsError) -> String {
    match err {
        AccountsError::Auth(auth) => auth_message(auth),
        AccountsError::Validation(e) => e.to_string(),
        AccountsError::Store(e) => store_message(e),
        AccountsError::Config(_) => "The account service is misconfigured.".into(),
    }
}

fn auth_message(err: &AuthError) -> String {
    match err {
        AuthError::AlreadyExists(_) => "User already exists.".into(),
        AuthError::NotFound(_) => "User not found.".into(),
        AuthError::IsProtected(_) => "The administrator account cannot be deleted.".into(),
        AuthError::WrongCredential(_) => "Current password is incorrect.".into(),
        AuthError::Unauthenticated => LOGIN_FAILED_MESSAGE.into(),
        AuthError::PermissionDenied => {
            "Access denied. Only administrators can access this page.".into()
        }
        AuthError::InvalidUsername(_) => "Username is invalid.".into(),
        AuthError::Store(e) => store_message(e),
    }
}

fn store_message(err: &StoreError) -> String {
    match err {
        StoreError::Corrupt { .. } => {
            "The account store is damaged. Contact an operator.".into()
        }
        _ => "The account store is unavailable. Try again.".into(),
    }
}
