//! Validation error types

use std::fmt;

/// Caller-fixable failure of a registration request.
///
/// The `Display` text is sent back verbatim as the `400` response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is missing or blank
    Missing { field: &'static str },

    /// Request carries no tags
    NoTags,

    /// Tag name has no row in the tag table
    UndefinedTag { name: String },

    /// Another customer already uses this username
    UsernameTaken { username: String },

    /// Another customer already uses this email
    EmailTaken { email: String },

    /// Insert affected no row, or the row could not be read back
    InsertFailed { username: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { field } => write!(f, "Please provide a {}.", field),
            Self::NoTags => write!(f, "Please provide a tag or tags."),
            Self::UndefinedTag { name } => write!(f, "Undefined tag: {}", name),
            Self::UsernameTaken { username } => {
                write!(f, "Username already exists: {}", username)
            }
            Self::EmailTaken { email } => write!(f, "Email already exists: {}", email),
            Self::InsertFailed { username } => {
                write!(f, "Insert customer failed: {}", username)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
