// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use anywho::anywho;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Server-assigned identifier of an [`Authenticator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthenticatorId(pub u64);

impl fmt::Display for AuthenticatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the server listing.
///
/// `remaining_time` is only authoritative at fetch time, the countdown takes
/// over from the first tick after the snapshot lands.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Authenticator {
    pub id: AuthenticatorId,
    pub name: String,
    pub email: String,
    pub totp_code: String,
    pub remaining_time: u64,
}

/// The whole item set of one listing together with the server clock reading
/// taken while producing it. Replaced, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub items: Vec<Authenticator>,
    pub server_time: i64,
}

/// An authenticator the user wants the server to start generating codes for
#[derive(Debug, Clone)]
pub struct NewAuthenticator {
    name: String,
    email: String,
    secret: SecretString,
}

impl NewAuthenticator {
    /// Builds a submission from raw form input.
    ///
    /// Every field is required. The secret is trimmed and upper-cased, the
    /// server is the one deciding whether it is a usable key.
    pub fn new(name: &str, email: &str, secret: &str) -> Result<Self, anywho::Error> {
        let name = name.trim();
        let email = email.trim();
        let secret = secret.trim().to_uppercase();

        if name.is_empty() {
            return Err(anywho!("Name cannot be empty"));
        }
        if email.is_empty() {
            return Err(anywho!("Email cannot be empty"));
        }
        if !email.contains('@') {
            return Err(anywho!("Email must contain an @"));
        }
        if secret.is_empty() {
            return Err(anywho!("Secret key cannot be empty"));
        }

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            secret: SecretString::from(secret),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub(crate) fn secret(&self) -> &str {
        self.secret.expose_secret()
    }
}
