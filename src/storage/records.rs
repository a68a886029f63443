//! Account records
//!
//! The persisted shape of an account and the views handed to callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The whole persisted account set, keyed by username.
///
/// Ordered so the file on disk diffs cleanly between writes.
pub type AccountSet = BTreeMap<String, AccountRecord>;

/// One stored account, as written under its username key.
///
/// Older stores used `password_hash`, `nome` and `is_admin`; those names are
/// still accepted when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    #[serde(alias = "password_hash")]
    pub credential_hash: String,
    #[serde(alias = "nome")]
    pub display_name: String,
    #[serde(alias = "is_admin", default)]
    pub is_admin: bool,
}

/// An account together with its username
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub display_name: String,
    pub credential_hash: String,
    pub is_admin: bool,
}

impl Account {
    pub fn from_record(username: &str, record: &AccountRecord) -> Self {
        Self {
            username: username.to_string(),
            display_name: record.display_name.clone(),
            credential_hash: record.credential_hash.clone(),
            is_admin: record.is_admin,
        }
    }
}

/// Row of the administrative account listing; never carries the hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub username: String,
    pub display_name: String,
    pub is_admin: bool,
}

impl AccountSummary {
    pub fn from_record(username: &str, record: &AccountRecord) -> Self {
        Self {
            username: username.to_string(),
            display_name: record.display_name.clone(),
            is_admin: record.is_admin,
        }
    }
}
