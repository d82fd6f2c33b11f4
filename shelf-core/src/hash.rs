//! Content hashing: SHA-256 truncated to 128 bits, 32 lowercase hex chars.
//!
//! The digest is always taken over the exact bytes that get persisted, so
//! re-hashing a stored archive reproduces the hash in its file name.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters in a rendered digest.
pub const HASH_HEX_LEN: usize = 32;

/// A 128-bit content digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash `bytes`.
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(hex::encode(&digest[..HASH_HEX_LEN / 2]))
    }

    /// Accept an already-rendered digest. Only 32 lowercase hex chars qualify;
    /// anything else is not a name this store could have produced.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = s.len() == HASH_HEX_LEN
            && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
