//! Account storage
//!
//! Handles the persisted account set, its on-disk format, and writer serialization.

pub mod persistence;
pub mod records;
pub mod store;

pub use records::{Account, AccountRecord, AccountSet, AccountSummary};
pub use store::{CredentialStore, StoreWriteGuard};
