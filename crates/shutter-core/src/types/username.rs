//! Username type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated, normalised username.
///
/// Usernames are lowercase ASCII letters, digits, `.` and `_`, 1 to 30
/// characters long. They may not start or end with `.` or contain `..`.
/// Input is lowercased before validation.
///
/// # Example
///
/// ```
/// use shutter_core::Username;
///
/// let name = Username::new("Jane.Doe").unwrap();
/// assert_eq!(name.as_str(), "jane.doe");
/// assert!(Username::new("jane..doe").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Maximum username length.
    pub const MAX_LEN: usize = 30;

    /// Create a new username, lowercasing and validating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the normalised string is not a valid username.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref().trim().to_ascii_lowercase();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns the username string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        let invalid = |reason: &str| -> Error {
            InvalidInputError::Username {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into()
        };

        if s.is_empty() {
            return Err(invalid("cannot be empty"));
        }

        if s.len() > Self::MAX_LEN {
            return Err(invalid("exceeds maximum length of 30 characters"));
        }

        if s.starts_with('.') || s.ends_with('.') {
            return Err(invalid("cannot start or end with '.'"));
        }

        if s.contains("..") {
            return Err(invalid("cannot contain consecutive dots"));
        }

        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_')
        {
            return Err(invalid(
                "may only contain letters, digits, '.' and '_'",
            ));
        }

        Ok(())
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Username {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Username {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
