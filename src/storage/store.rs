//! Credential store
//!
//! Durable, all-or-nothing persistence of the account set. Every mutation is
//! a full read -> mutate -> write cycle performed while holding the store's
//! write lock; readers never take the lock and rely on atomic replacement.

use log::{info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, MutexGuard};

use crate::auth::passwords::PasswordService;
use crate::config::{AccountsConfig, BootstrapConfig, CorruptStorePolicy};
use crate::error::StoreError;
use crate::storage::persistence::{read_account_set, write_account_set};
use crate::storage::records::{AccountRecord, AccountSet};

/// Process-wide write locks, one per store file.
///
/// Every `CredentialStore` on the same file shares one lock, whether it was
/// cloned or built separately from the same configuration.
static STORE_LOCKS: LazyLock<std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| std::sync::Mutex::new(HashMap::new()));

/// Returns the shared write lock for the store file at `path`
fn write_lock_for(path: &Path) -> Arc<Mutex<()>> {
    let key = lock_key(path);
    let mut locks = STORE_LOCKS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(locks.entry(key).or_default())
}

/// Resolves `path` so that different spellings of one file map to one key.
///
/// The file itself may not exist yet, so only its directory is canonicalized.
fn lock_key(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(parent) => parent.join(name),
            Err(_) => absolute,
        },
        _ => absolute,
    }
}

/// Outcome of reading the store file under the configured corruption policy
enum LoadOutcome {
    Missing,
    Loaded(AccountSet),
    /// File existed but was unreadable and is being treated as empty
    Recovered,
}

struct StoreInner {
    path: PathBuf,
    on_corrupt: CorruptStorePolicy,
    bootstrap: BootstrapConfig,
    write_lock: Arc<Mutex<()>>,
}

/// Handle to the persisted account set.
///
/// All handles on the same file within a process share one write lock, so
/// their mutations are serialized against each other.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<StoreInner>,
}

impl CredentialStore {
    pub fn new(config: &AccountsConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path: config.store.path.clone(),
                on_corrupt: config.store.on_corrupt,
                bootstrap: config.bootstrap.clone(),
                write_lock: write_lock_for(&config.store.path),
            }),
        }
    }

    /// Location of the store file
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Username of the protected bootstrap administrator
    pub fn bootstrap_username(&self) -> &str {
        &self.inner.bootstrap.username
    }

    /// Creates the store with the bootstrap administrator if it does not exist yet.
    ///
    /// Idempotent: an existing store that already holds the bootstrap account
    /// is returned untouched. A store missing the bootstrap account gets it
    /// re-seeded, keeping every other account.
    pub async fn initialize(&self, passwords: &PasswordService) -> Result<AccountSet, StoreError> {
        let guard = self.lock().await;
        let bootstrap = &self.inner.bootstrap;

        let mut accounts = match self.read_with_policy().await? {
            LoadOutcome::Loaded(accounts) if accounts.contains_key(&bootstrap.username) => {
                return Ok(accounts);
            }
            LoadOutcome::Loaded(accounts) => {
                warn!(
                    "Account store {} has no '{}' account, re-seeding it",
                    self.path().display(),
                    bootstrap.username
                );
                accounts
            }
            LoadOutcome::Recovered => {
                self.preserve_unreadable_file().await?;
                AccountSet::new()
            }
            LoadOutcome::Missing => {
                info!("Creating account store at {}", self.path().display());
                AccountSet::new()
            }
        };

        let credential_hash = passwords.hash_password_async(&bootstrap.credential).await?;
        accounts.insert(
            bootstrap.username.clone(),
            AccountRecord {
                credential_hash,
                display_name: bootstrap.display_name.clone(),
                is_admin: true,
            },
        );

        guard.save(&accounts).await?;
        info!(
            "Bootstrap administrator '{}' written to {}",
            bootstrap.username,
            self.path().display()
        );
        Ok(accounts)
    }

    /// Returns the current persisted set.
    ///
    /// A missing store loads as empty. An unreadable one loads as empty or
    /// fails, depending on `store.on_corrupt`.
    pub async fn load(&self) -> Result<AccountSet, StoreError> {
        match self.read_with_policy().await? {
            LoadOutcome::Loaded(accounts) => Ok(accounts),
            LoadOutcome::Missing | LoadOutcome::Recovered => Ok(AccountSet::new()),
        }
    }

    /// Atomically replaces the persisted set, serialized with all other writers
    pub async fn save(&self, accounts: &AccountSet) -> Result<(), StoreError> {
        self.lock().await.save(accounts).await
    }

    /// Acquires the single-writer lock for a read-modify-write cycle
    pub async fn lock(&self) -> StoreWriteGuard<'_> {
        StoreWriteGuard {
            store: self,
            _guard: self.inner.write_lock.lock().await,
        }
    }

    async fn read_with_policy(&self) -> Result<LoadOutcome, StoreError> {
        match read_account_set(self.path()).await {
            Ok(Some(accounts)) => Ok(LoadOutcome::Loaded(accounts)),
            Ok(None) => Ok(LoadOutcome::Missing),
            Err(err @ StoreError::Corrupt { .. }) => match self.inner.on_corrupt {
                CorruptStorePolicy::TreatAsEmpty => {
                    warn!("{}; treating it as empty", err);
                    Ok(LoadOutcome::Recovered)
                }
                CorruptStorePolicy::Fail => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    /// Keeps a copy of an unreadable store before it is overwritten.
    ///
    /// Backups are timestamped and never replace an earlier one.
    async fn preserve_unreadable_file(&self) -> Result<(), StoreError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or(0);

        let mut attempt = 0u32;
        let backup = loop {
            let mut name = self.path().as_os_str().to_os_string();
            name.push(format!(".corrupt-{millis}"));
            if attempt > 0 {
                name.push(format!("-{attempt}"));
            }
            let candidate = PathBuf::from(name);
            if !tokio::fs::try_exists(&candidate).await? {
                break candidate;
            }
            attempt += 1;
        };

        tokio::fs::copy(self.path(), &backup).await?;
        warn!(
            "Unreadable account store copied to {} before re-initialization",
            backup.display()
        );
        Ok(())
    }
}

/// Exclusive access to the store for one read-modify-write cycle.
///
/// The lock is released when the guard is dropped.
pub struct StoreWriteGuard<'a> {
    store: &'a CredentialStore,
    _guard: MutexGuard<'a, ()>,
}

impl StoreWriteGuard<'_> {
    /// Loads the current set while holding the lock
    pub async fn load(&self) -> Result<AccountSet, StoreError> {
        self.store.load().await
    }

    /// Replaces the persisted set while holding the lock
    pub async fn save(&self, accounts: &AccountSet) -> Result<(), StoreError> {
        write_account_set(self.store.path(), accounts).await
    }
}
