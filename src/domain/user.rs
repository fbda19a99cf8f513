//! User identity and authentication tokens.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::todo::Timestamp;

/// Number of random bytes in an authentication token.
const TOKEN_BYTES: usize = 20;

// =============================================================================
// UserId
// =============================================================================

/// Unique identifier for a user, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Empty when the user did not provide one.
    pub email: String,
    pub date_joined: Timestamp,
}

/// Data for a user that has not been stored yet.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// A user together with the stored password hash, used only at login.
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("UserCredentials")
            .field("user", &self.user)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// AuthToken
// =============================================================================

/// Opaque bearer token: 40 lowercase hex characters.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AuthToken(String);

impl AuthToken {
    /// Generates a fresh token from 20 random bytes.
    ///
    /// **Note**: This is an impure function (side effect: random number generation).
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; TOKEN_BYTES] = rand::random();
        let mut key = String::with_capacity(TOKEN_BYTES * 2);
        for byte in bytes {
            let _ = write!(key, "{byte:02x}");
        }
        Self(key)
    }

    /// Wraps a key presented by a client or loaded from the store.
    #[must_use]
    pub fn from_string(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("AuthToken(<redacted>)")
    }
}
