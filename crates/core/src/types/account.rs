//! Account fields submitted by the register and update-user forms.
//!
//! The backend owns the accounts; these types only reject input that could
//! never succeed so the form can answer without a round trip.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when validating account fields.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// The username is empty after trimming.
    #[error("username cannot be empty")]
    EmptyUsername,
    /// The username is too long.
    #[error("username must be at most {max} characters")]
    UsernameTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The username contains whitespace or control characters.
    #[error("username cannot contain spaces")]
    UsernameWhitespace,
    /// The email is not of the form `local@domain`.
    #[error("invalid email address")]
    InvalidEmail,
    /// The password is shorter than the minimum.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum required length.
        min: usize,
    },
    /// The password and its confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,
}

/// A login name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Maximum length of a username.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a username, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, too long, or contains
    /// inner whitespace.
    pub fn parse(s: &str) -> Result<Self, AccountError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AccountError::EmptyUsername);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(AccountError::UsernameTooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(AccountError::UsernameWhitespace);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An email address with a non-empty local part and domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an email address.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidEmail`] unless the input has exactly one
    /// `@` with text on both sides and fits in 254 characters.
    pub fn parse(s: &str) -> Result<Self, AccountError> {
        let trimmed = s.trim();
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(AccountError::InvalidEmail);
        }
        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(trimmed.to_owned()))
            }
            _ => Err(AccountError::InvalidEmail),
        }
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A new password, checked against its confirmation.
///
/// `Debug` is redacted; the value is only ever forwarded to the backend.
#[derive(Clone, Serialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    /// Minimum password length.
    pub const MIN_LENGTH: usize = 8;

    /// Validate a new password against its confirmation field.
    ///
    /// # Errors
    ///
    /// Returns an error if the two fields differ or the password is too short.
    pub fn new_checked(password: &str, confirmation: &str) -> Result<Self, AccountError> {
        if password != confirmation {
            return Err(AccountError::PasswordMismatch);
        }
        if password.chars().count() < Self::MIN_LENGTH {
            return Err(AccountError::PasswordTooShort {
                min: Self::MIN_LENGTH,
            });
        }
        Ok(Self(password.to_owned()))
    }

    /// Expose the raw password for the outgoing request body.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_username_trims() {
        assert_eq!(Username::parse("  maria ").unwrap().as_str(), "maria");
    }

    #[test]
    fn test_username_rejects_empty_and_spaces() {
        assert_eq!(Username::parse("   "), Err(AccountError::EmptyUsername));
        assert_eq!(
            Username::parse("maria jose"),
            Err(AccountError::UsernameWhitespace)
        );
    }

    #[test]
    fn test_username_too_long() {
        let long = "a".repeat(Username::MAX_LENGTH + 1);
        assert!(matches!(
            Username::parse(&long),
            Err(AccountError::UsernameTooLong { .. })
        ));
    }

    #[test]
    fn test_email_shapes() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("a@b").is_ok());
        assert_eq!(Email::parse("no-at"), Err(AccountError::InvalidEmail));
        assert_eq!(Email::parse("@example.com"), Err(AccountError::InvalidEmail));
        assert_eq!(Email::parse("user@"), Err(AccountError::InvalidEmail));
        assert_eq!(Email::parse("a@b@c"), Err(AccountError::InvalidEmail));
    }

    #[test]
    fn test_password_checks() {
        assert_eq!(
            Password::new_checked("longenough", "different").unwrap_err(),
            AccountError::PasswordMismatch
        );
        assert!(matches!(
            Password::new_checked("short", "short"),
            Err(AccountError::PasswordTooShort { min: 8 })
        ));
        assert_eq!(
            Password::new_checked("longenough", "longenough")
                .unwrap()
                .expose(),
            "longenough"
        );
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new_checked("hunter2hunter2", "hunter2hunter2").unwrap();
        assert!(!format!("{password:?}").contains("hunter2"));
    }
}
