//! Opaque login credential.
//!
//! The data layer never interprets the credential: it is stored verbatim
//! (the legacy `password` field of the user record) and matched by exact
//! comparison at login. `Debug` output is redacted so credentials do not
//! leak into logs.

use serde::{Deserialize, Serialize};

/// An opaque credential, compared only by exact match.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw credential string.
    #[must_use]
    pub const fn new(secret: String) -> Self {
        Self(secret)
    }

    /// Exact-match comparison against a candidate.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }

    /// Expose the raw credential for persistence.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl From<String> for Credential {
    fn from(secret: String) -> Self {
        Self(secret)
    }
}

impl From<&str> for Credential {
    fn from(secret: &str) -> Self {
        Self(secret.to_owned())
    }
}
