//! Credential policy enforced when registering users.

use std::fmt;

use astral_core::error::AppError;
use astral_core::result::AppResult;

/// Pluggable check applied to `{login, password}` before a user is created.
pub trait UserDataValidator: Send + Sync + fmt::Debug + 'static {
    /// Returns `ValidationFailed` listing every violated rule.
    fn validate_user_data(&self, login: &str, password: &str) -> AppResult<()>;
}

/// A single credential rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialRule {
    LoginTooShort,
    LoginNotAlphanumeric,
    PasswordTooShort,
    PasswordMissingCase,
    PasswordMissingDigit,
    PasswordMissingSpecial,
}

impl fmt::Display for CredentialRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::LoginTooShort => "login must be at least 8 characters long",
            Self::LoginNotAlphanumeric => "login must contain only latin letters and digits",
            Self::PasswordTooShort => "password must be at least 8 characters long",
            Self::PasswordMissingCase => {
                "password must contain at least 2 letters in different cases"
            }
            Self::PasswordMissingDigit => "password must contain at least 1 digit",
            Self::PasswordMissingSpecial => "password must contain at least 1 special character",
        };
        f.write_str(message)
    }
}

/// Default rules: alphanumeric login and a mixed password, both with a
/// minimum length.
#[derive(Debug, Clone)]
pub struct CredentialPolicy {
    min_login_length: usize,
    min_password_length: usize,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            min_login_length: 8,
            min_password_length: 8,
        }
    }
}

impl CredentialPolicy {
    /// Every rule the pair breaks, in a stable order.
    pub fn violations(&self, login: &str, password: &str) -> Vec<CredentialRule> {
        let mut violated = Vec::new();

        if login.chars().count() < self.min_login_length {
            violated.push(CredentialRule::LoginTooShort);
        }
        if !login.chars().all(|c| c.is_ascii_alphanumeric()) {
            violated.push(CredentialRule::LoginNotAlphanumeric);
        }

        if password.chars().count() < self.min_password_length {
            violated.push(CredentialRule::PasswordTooShort);
        }
        let has_upper = password.chars().any(char::is_uppercase);
        let has_lower = password.chars().any(char::is_lowercase);
        if !(has_upper && has_lower) {
            violated.push(CredentialRule::PasswordMissingCase);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            violated.push(CredentialRule::PasswordMissingDigit);
        }
        if !password.chars().any(|c| !c.is_alphanumeric()) {
            violated.push(CredentialRule::PasswordMissingSpecial);
        }

        violated
    }
}

impl UserDataValidator for CredentialPolicy {
    fn validate_user_data(&self, login: &str, password: &str) -> AppResult<()> {
        let violated = self.violations(login, password);
        if violated.is_empty() {
            return Ok(());
        }

        let message = violated
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(AppError::validation(message))
    }
}
