//! Administrative console
//!
//! Entry point for the account administration forms. Opening the console
//! requires an administrator session; every operation validates its form
//! before calling into the authentication service.

use log::{info, warn};

use crate::auth::validator::validate_username;
use crate::auth::{AuthService, CredentialChangeForm, LoginForm, NewAccountForm, Session};
use crate::config::PolicyConfig;
use crate::error::{AccountsError, AuthError};
use crate::storage::{Account, AccountSummary};

/// Handles a submitted login form and opens a session on success.
pub async fn login(service: &AuthService, form: &LoginForm) -> Result<Session, AccountsError> {
    form.validate()?;
    Ok(service.login(&form.username, &form.credential).await?)
}

/// Privilege-gated access to account administration
pub struct AdminConsole<'a> {
    service: &'a AuthService,
    session: &'a Session,
    policy: &'a PolicyConfig,
}

impl<'a> AdminConsole<'a> {
    /// Opens the console for `session`, refusing non-administrators outright.
    pub fn open(
        service: &'a AuthService,
        session: &'a Session,
        policy: &'a PolicyConfig,
    ) -> Result<Self, AccountsError> {
        if !AuthService::is_administrator(Some(session.account())) {
            warn!(
                "User '{}' was denied access to account administration",
                session.username()
            );
            return Err(AuthError::PermissionDenied.into());
        }

        Ok(Self {
            service,
            session,
            policy,
        })
    }

    /// The administrator operating the console
    pub fn operator(&self) -> &Session {
        self.session
    }

    pub async fn create_account(&self, form: &NewAccountForm) -> Result<Account, AccountsError> {
        form.validate(self.policy)?;
        let account = self
            .service
            .create_account(
                &form.username,
                &form.credential,
                form.display_name.trim(),
                form.is_admin,
            )
            .await?;

        info!(
            "'{}' created account '{}'",
            self.session.username(),
            account.username
        );
        Ok(account)
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountSummary>, AccountsError> {
        Ok(self.service.list_accounts().await?)
    }

    /// Candidates for the delete selector; the bootstrap administrator is never offered.
    pub async fn deletable_accounts(&self) -> Result<Vec<String>, AccountsError> {
        Ok(self.service.deletable_accounts().await?)
    }

    pub async fn delete_account(&self, username: &str) -> Result<(), AccountsError> {
        validate_username(username, self.policy)?;
        self.service.delete_account(username).await?;

        info!("'{}' deleted account '{}'", self.session.username(), username);
        Ok(())
    }

    /// Changing any account's credential, including another user's, needs its current credential.
    pub async fn change_credential(&self, form: &CredentialChangeForm) -> Result<(), AccountsError> {
        form.validate(self.policy)?;
        self.service
            .change_credential(&form.username, &form.current, &form.new)
            .await?;

        info!(
            "'{}' changed the credential of '{}'",
            self.session.username(),
            form.username
        );
        Ok(())
    }
}
