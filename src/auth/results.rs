//! Authentication result types
//!
//! Defines result structures returned by authentication operations.

use crate::storage::Account;

/// Result of a login attempt.
///
/// A failure never says whether the username or the credential was wrong.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub login_successful: bool,
    pub account: Option<Account>,
}

impl LoginResult {
    pub fn success(account: Account) -> Self {
        Self {
            login_successful: true,
            account: Some(account),
        }
    }

    pub fn failure() -> Self {
        Self {
            login_successful: false,
            account: None,
        }
    }
}
