//! Session management
//!
//! A `Session` is the caller-held proof of a successful login. It replaces
//! process-wide "current user" state: whoever needs authorization context
//! passes the session in explicitly.

use log::debug;

use crate::storage::Account;

/// Authenticated operator session
#[derive(Debug, Clone)]
pub struct Session {
    account: Account,
}

impl Session {
    pub(crate) fn new(account: Account) -> Self {
        Self { account }
    }

    /// Returns the username the session was opened for.
    pub fn username(&self) -> &str {
        &self.account.username
    }

    /// Returns the display name shown as "logged in as".
    pub fn display_name(&self) -> &str {
        &self.account.display_name
    }

    /// Returns the account snapshot taken at login time.
    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Returns whether the session's account had administrator rights at login.
    pub fn is_admin(&self) -> bool {
        self.account.is_admin
    }

    /// Ends the session. The store is not touched.
    pub fn logout(self) {
        debug!("Session for '{}' closed", self.account.username);
    }
}
