//! Document identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// Maximum identifier length, in bytes.
const MAX_ID_LEN: usize = 128;

fn validate_id(kind: &'static str, s: &str) -> Result<(), Error> {
    let invalid = |reason: String| -> Error {
        InvalidInputError::Id {
            kind,
            value: s.to_string(),
            reason,
        }
        .into()
    };

    if s.is_empty() {
        return Err(invalid("cannot be empty".to_string()));
    }

    if s.len() > MAX_ID_LEN {
        return Err(invalid(format!(
            "exceeds maximum length of {} characters",
            MAX_ID_LEN
        )));
    }

    if let Some(c) = s
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
    {
        return Err(invalid(format!("contains invalid character '{}'", c)));
    }

    Ok(())
}

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier, validating the format.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is empty, too long, or contains
            /// characters outside `[A-Za-z0-9_-]`.
            pub fn new(s: impl Into<String>) -> Result<Self, Error> {
                let s = s.into();
                validate_id($kind, &s)?;
                Ok(Self(s))
            }

            /// Returns the identifier string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

document_id!(
    /// Identifier of a user profile.
    UserId,
    "user id"
);

document_id!(
    /// Identifier of a post.
    PostId,
    "post id"
);

document_id!(
    /// Identifier of a comment.
    CommentId,
    "comment id"
);

document_id!(
    /// Identifier of a follow relationship.
    ///
    /// Derived from both participants, so one user can follow another at most once.
    FollowId,
    "follow id"
);

impl FollowId {
    /// The identifier of `follower` following `followee`.
    pub fn between(follower: &UserId, followee: &UserId) -> Self {
        // Both halves are valid ids, '_' is a valid separator, and the
        // combined length stays within two ids plus one.
        Self(format!("{}_{}", follower, followee))
    }
}
