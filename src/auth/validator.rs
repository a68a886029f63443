//! Form validation
//!
//! Policy checks applied at the boundary before anything reaches the store:
//! required fields, confirmation match, minimum credential length and
//! username shape. Checks run in a fixed order and the first failure wins.

use crate::config::PolicyConfig;
use crate::error::ValidationError;

/// Login form input
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub credential: String,
}

/// "Create account" form input
#[derive(Debug, Clone, Default)]
pub struct NewAccountForm {
    pub username: String,
    pub display_name: String,
    pub credential: String,
    pub confirmation: String,
    pub is_admin: bool,
}

/// "Change credential" form input
#[derive(Debug, Clone, Default)]
pub struct CredentialChangeForm {
    pub username: String,
    pub current: String,
    pub new: String,
    pub confirmation: String,
}

/// Rejects control characters that could corrupt logs or the store document.
fn has_control_chars(input: &str) -> bool {
    input.chars().any(char::is_control)
}

/// Shared username checks for every form.
pub fn validate_username(username: &str, policy: &PolicyConfig) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::MissingField("Username"));
    }

    if username.chars().count() > policy.max_username_length {
        return Err(ValidationError::UsernameTooLong {
            max: policy.max_username_length,
        });
    }

    if has_control_chars(username) || username.trim() != username {
        return Err(ValidationError::InvalidCharacters("Username"));
    }

    Ok(())
}

/// New credential plus its confirmation.
fn validate_new_credential(
    credential: &str,
    confirmation: &str,
    field: &'static str,
    policy: &PolicyConfig,
) -> Result<(), ValidationError> {
    if credential.is_empty() {
        return Err(ValidationError::MissingField(field));
    }

    if credential != confirmation {
        return Err(ValidationError::ConfirmationMismatch);
    }

    if credential.chars().count() < policy.min_credential_length {
        return Err(ValidationError::CredentialTooShort {
            min: policy.min_credential_length,
        });
    }

    Ok(())
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.is_empty() {
            return Err(ValidationError::MissingField("Username"));
        }
        if self.credential.is_empty() {
            return Err(ValidationError::MissingField("Password"));
        }
        Ok(())
    }
}

impl NewAccountForm {
    pub fn validate(&self, policy: &PolicyConfig) -> Result<(), ValidationError> {
        validate_username(&self.username, policy)?;

        if self.display_name.trim().is_empty() {
            return Err(ValidationError::MissingField("Full name"));
        }
        if has_control_chars(&self.display_name) {
            return Err(ValidationError::InvalidCharacters("Full name"));
        }

        validate_new_credential(&self.credential, &self.confirmation, "Password", policy)
    }
}

impl CredentialChangeForm {
    pub fn validate(&self, policy: &PolicyConfig) -> Result<(), ValidationError> {
        if self.username.is_empty() {
            return Err(ValidationError::MissingField("Username"));
        }
        if self.current.is_empty() {
            return Err(ValidationError::MissingField("Current password"));
        }

        validate_new_credential(&self.new, &self.confirmation, "New password", policy)
    }
}
