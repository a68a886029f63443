//! Authentication service
//!
//! Stateless operations over the credential store: login, account creation
//! and deletion, credential changes and the privilege check. Nothing is
//! cached between calls; each one reads the store, and each mutation writes
//! the whole set back under the store's write lock.

use log::{debug, error, info, warn};

use crate::auth::passwords::PasswordService;
use crate::auth::results::LoginResult;
use crate::auth::session::Session;
use crate::config::AccountsConfig;
use crate::error::{AuthError, StoreError};
use crate::storage::{Account, AccountRecord, AccountSet, AccountSummary, CredentialStore};

#[derive(Clone)]
pub struct AuthService {
    store: CredentialStore,
    passwords: PasswordService,
}

impl AuthService {
    pub fn new(config: &AccountsConfig) -> Result<Self, StoreError> {
        let passwords = PasswordService::new(&config.hashing)?;
        Ok(Self::from_parts(CredentialStore::new(config), passwords))
    }

    pub fn from_parts(store: CredentialStore, passwords: PasswordService) -> Self {
        Self { store, passwords }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Ensures the store exists with its bootstrap administrator.
    ///
    /// Call once per process start before any other operation.
    pub async fn initialize(&self) -> Result<AccountSet, AuthError> {
        Ok(self.store.initialize(&self.passwords).await?)
    }

    /// Checks a login attempt.
    ///
    /// Unknown usernames and wrong credentials produce the same failure and
    /// cost a comparable amount of work.
    pub async fn authenticate(
        &self,
        username: &str,
        credential: &str,
    ) -> Result<LoginResult, AuthError> {
        let accounts = self.store.load().await?;

        let Some(record) = accounts.get(username) else {
            self.passwords.verify_absent_async(credential).await;
            debug!("Login rejected for '{}'", username);
            return Ok(LoginResult::failure());
        };

        let matched = match self
            .passwords
            .verify_password_async(credential, &record.credential_hash)
            .await
        {
            Ok(matched) => matched,
            Err(StoreError::Hashing(e)) => {
                error!("Stored credential hash for '{}' is unusable: {}", username, e);
                false
            }
            Err(e) => return Err(e.into()),
        };

        if !matched {
            debug!("Login rejected for '{}'", username);
            return Ok(LoginResult::failure());
        }

        if self.passwords.needs_rehash(&record.credential_hash) {
            if let Err(e) = self
                .upgrade_hash(username, credential, &record.credential_hash)
                .await
            {
                warn!("Could not upgrade credential hash for '{}': {}", username, e);
            }
        }

        info!("User '{}' logged in", username);
        Ok(LoginResult::success(Account::from_record(username, record)))
    }

    /// Authenticates and opens a session for the caller to hold.
    pub async fn login(&self, username: &str, credential: &str) -> Result<Session, AuthError> {
        match self.authenticate(username, credential).await? {
            LoginResult {
                login_successful: true,
                account: Some(account),
            } => Ok(Session::new(account)),
            _ => Err(AuthError::Unauthenticated),
        }
    }

    /// Adds a new account.
    ///
    /// Form policy (confirmation, minimum length) is the caller's job; only
    /// an empty username is refused here.
    pub async fn create_account(
        &self,
        username: &str,
        credential: &str,
        display_name: &str,
        is_admin: bool,
    ) -> Result<Account, AuthError> {
        if username.trim().is_empty() {
            return Err(AuthError::InvalidUsername(username.to_string()));
        }

        let credential_hash = self.passwords.hash_password_async(credential).await?;

        let guard = self.store.lock().await;
        let mut accounts = guard.load().await?;
        if accounts.contains_key(username) {
            return Err(AuthError::AlreadyExists(username.to_string()));
        }

        let record = AccountRecord {
            credential_hash,
            display_name: display_name.to_string(),
            is_admin,
        };
        let account = Account::from_record(username, &record);
        accounts.insert(username.to_string(), record);
        guard.save(&accounts).await?;

        info!("Created account '{}' (admin: {})", username, is_admin);
        Ok(account)
    }

    /// Removes an account. The bootstrap administrator can never be removed.
    pub async fn delete_account(&self, username: &str) -> Result<(), AuthError> {
        if username == self.store.bootstrap_username() {
            return Err(AuthError::IsProtected(username.to_string()));
        }

        let guard = self.store.lock().await;
        let mut accounts = guard.load().await?;
        if accounts.remove(username).is_none() {
            return Err(AuthError::NotFound(username.to_string()));
        }
        guard.save(&accounts).await?;

        info!("Deleted account '{}'", username);
        Ok(())
    }

    /// Replaces a credential after verifying the current one.
    ///
    /// This is the only way a stored credential changes.
    pub async fn change_credential(
        &self,
        username: &str,
        old_credential: &str,
        new_credential: &str,
    ) -> Result<(), AuthError> {
        let guard = self.store.lock().await;
        let mut accounts = guard.load().await?;

        let Some(record) = accounts.get_mut(username) else {
            return Err(AuthError::NotFound(username.to_string()));
        };

        if !self
            .passwords
            .verify_password_async(old_credential, &record.credential_hash)
            .await?
        {
            return Err(AuthError::WrongCredential(username.to_string()));
        }

        record.credential_hash = self.passwords.hash_password_async(new_credential).await?;
        guard.save(&accounts).await?;

        info!("Changed credential for '{}'", username);
        Ok(())
    }

    /// Pure privilege predicate; no account means no privileges.
    pub fn is_administrator(account: Option<&Account>) -> bool {
        account.is_some_and(|account| account.is_admin)
    }

    /// Username, display name and admin flag of every account, ordered by username.
    pub async fn list_accounts(&self) -> Result<Vec<AccountSummary>, AuthError> {
        let accounts = self.store.load().await?;
        Ok(accounts
            .iter()
            .map(|(username, record)| AccountSummary::from_record(username, record))
            .collect())
    }

    /// Usernames offered for deletion: everything except the bootstrap administrator.
    pub async fn deletable_accounts(&self) -> Result<Vec<String>, AuthError> {
        let accounts = self.store.load().await?;
        let protected = self.store.bootstrap_username();
        Ok(accounts
            .into_keys()
            .filter(|username| username != protected)
            .collect())
    }

    /// Rewrites a legacy hash with Argon2id, unless it changed since it was read.
    async fn upgrade_hash(
        &self,
        username: &str,
        credential: &str,
        legacy_hash: &str,
    ) -> Result<(), AuthError> {
        let credential_hash = self.passwords.hash_password_async(credential).await?;

        let guard = self.store.lock().await;
        let mut accounts = guard.load().await?;
        match accounts.get_mut(username) {
            Some(record) if record.credential_hash == legacy_hash => {
                record.credential_hash = credential_hash;
            }
            _ => return Ok(()),
        }
        guard.save(&accounts).await?;

        info!("Upgraded legacy credential hash for '{}'", username);
        Ok(())
    }
}
