//! On-disk persistence of the account set
//!
//! Reads the whole JSON document and replaces it atomically: the new set is
//! written to a fresh temporary file next to the target, synced, then renamed
//! over it.

use log::debug;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;

use crate::error::StoreError;
use crate::storage::records::AccountSet;

/// Reads the persisted set.
///
/// Returns `Ok(None)` when no file exists and `StoreError::Corrupt` when one
/// exists but cannot be read or parsed.
pub async fn read_account_set(path: &Path) -> Result<Option<AccountSet>, StoreError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StoreError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    serde_json::from_slice::<AccountSet>(&bytes)
        .map(Some)
        .map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Atomically replaces the persisted set with `accounts`.
///
/// Each write goes through its own uniquely named temporary file in the
/// target's directory, so concurrent writers never share a scratch file.
pub async fn write_account_set(path: &Path, accounts: &AccountSet) -> Result<(), StoreError> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).await?;

    let mut json = serde_json::to_vec_pretty(accounts)?;
    json.push(b'\n');
    let len = json.len();

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    })
    .await??;

    debug!(
        "Wrote {} accounts ({} bytes) to {}",
        accounts.len(),
        len,
        path.display()
    );
    Ok(())
}
