//! Entity Identifiers
//!
//! Identifiers are opaque strings. Generated ones are Time-Sorted IDs (TSID)
//! encoded as 13-character Crockford Base32, so they sort by creation time.
//! Externally supplied identifiers are accepted as-is.

use std::fmt;
use std::sync::atomic::{AtomicU16, Ordering};

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Crockford Base32 alphabet (excludes I, L, O, U)
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const ENCODED_LEN: usize = 13;

static COUNTER: AtomicU16 = AtomicU16::new(0);

/// Opaque, immutable identifier of an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a new time-sorted identifier.
    pub fn generate() -> Self {
        Self(TsidGenerator::generate())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// TSID generator
///
/// Layout (64 bits): 42 bits milliseconds since epoch | 10 random bits |
/// 12 bits per-process counter.
pub struct TsidGenerator;

impl TsidGenerator {
    pub fn generate() -> String {
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) as u64;
        let random: u64 = rand::thread_rng().gen_range(0..1024);

        let tsid = ((millis & 0x3FF_FFFF_FFFF) << 22) | (random << 12) | (counter & 0xFFF);
        encode_crockford(tsid)
    }

    /// Decode a TSID back to its numeric form. Returns `None` for
    /// identifiers that were not produced by this generator.
    pub fn decode(tsid: &str) -> Option<u64> {
        if tsid.len() != ENCODED_LEN {
            return None;
        }
        tsid.chars().try_fold(0u64, |acc, c| {
            let upper = c.to_ascii_uppercase() as u8;
            let value = ALPHABET.iter().position(|&a| a == upper)? as u64;
            Some((acc << 5) | value)
        })
    }
}

fn encode_crockford(mut value: u64) -> String {
    let mut out = [b'0'; ENCODED_LEN];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(value & 0x1F) as usize];
        value >>= 5;
    }
    out.iter().map(|&b| b as char).collect()
}
