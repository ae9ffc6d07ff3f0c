//! Registered user model.

use serde::{Deserialize, Serialize};

use super::{Role, UserId};

/// A registered storefront account.
///
/// The password is kept and compared as plaintext. That is a known weakness
/// of the stored format and is preserved so exported data stays compatible;
/// deployments facing real users should substitute a salted hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Login name: a username, or an email address (stored lowercased).
    #[serde(alias = "username", alias = "email")]
    pub identifier: String,
    /// Login password.
    pub password: String,
    /// Access level.
    pub role: Role,
}

impl User {
    /// Returns `true` if the user holds the admin role.
    #[inline]
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Normalizes a login identifier.
///
/// Surrounding whitespace is dropped. Identifiers that look like email
/// addresses (contain `@`) are lowercased; plain usernames keep their case.
#[inline]
#[must_use]
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains('@') {
        trimmed.to_lowercase()
    } else {
        trimmed.to_owned()
    }
}
