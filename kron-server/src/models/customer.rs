//! Customer registration request and its validated form

use serde::Deserialize;

use super::ValidationError;

/// Registration payload as received on the wire.
///
/// Every field is optional so a missing value is reported by [`validate`]
/// with the same message as a blank one.
///
/// [`validate`]: RegisterCustomerRequest::validate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterCustomerRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// A registration request whose required fields are all present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub username: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    /// Tag names in request order, duplicates kept
    pub tags: Vec<String>,
}

impl RegisterCustomerRequest {
    /// Check required fields in order: username, name, surname, email, tags.
    ///
    /// Stops at the first failure. Values are kept as given; trimming is only
    /// used to detect blank input.
    pub fn validate(self) -> Result<NewCustomer, ValidationError> {
        let username = required(self.username, "username")?;
        let name = required(self.name, "name")?;
        let surname = required(self.surname, "surname")?;
        let email = required(self.email, "email")?;

        let tags = match self.tags {
            Some(tags) if !tags.is_empty() => tags,
            _ => return Err(ValidationError::NoTags),
        };

        Ok(NewCustomer {
            username,
            name,
            surname,
            email,
            tags,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::Missing { field }),
    }
}
