//! Stream identity and authority metadata.
//!
//! # Responsibility
//! - Represent ledger stream identifiers as a dedicated type.
//! - Carry opaque authority (key) metadata attached to streams.
//!
//! # Invariants
//! - Minted ids are exactly `STREAM_ID_LEN` lowercase hex characters.
//! - Ids received from the ledger are kept verbatim; well-formedness is
//!   checked only where a rule asks for it.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Length of every identifier the ledger hands out.
pub const STREAM_ID_LEN: usize = 64;

/// Ledger identifier for a piece of state (todo item or identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    /// Wraps an identifier exactly as supplied by the ledger.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mints a fresh identifier from two random v4 UUIDs.
    pub fn mint() -> Self {
        Self(format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        ))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether the id has the ledger's fixed length.
    pub fn has_ledger_length(&self) -> bool {
        self.0.chars().count() == STREAM_ID_LEN
    }

    /// Returns whether the id has ledger length and only hex digits.
    pub fn is_well_formed(&self) -> bool {
        self.has_ledger_length() && self.0.chars().all(|c| c.is_ascii_hexdigit())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for StreamId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for StreamId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StreamId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One signing key registered for a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityKey {
    /// Key algorithm label, e.g. `secp256k1` or `rsa`.
    #[serde(rename = "type")]
    pub key_type: String,
    /// Encoded public key material.
    pub public: String,
}

/// Signature/permission metadata of a stream.
///
/// Opaque to the contract: it is only ever copied from a parent stream to a
/// child stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    /// Key used when a single authority is requested.
    pub primary: AuthorityKey,
    /// Full key set, including delegates.
    #[serde(default)]
    pub keys: Vec<AuthorityKey>,
}

impl Authority {
    /// Authority with one key that is both primary and the whole key set.
    pub fn single(key_type: impl Into<String>, public: impl Into<String>) -> Self {
        let key = AuthorityKey {
            key_type: key_type.into(),
            public: public.into(),
        };
        Self {
            keys: vec![key.clone()],
            primary: key,
        }
    }
}
