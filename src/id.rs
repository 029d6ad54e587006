//! Store identifiers.
//!
//! An `ObjectId` is the 12-byte key the document store assigns on insert.
//! On the wire it is always the 24-character lowercase hex string.
//!
//! The only way to turn client text into an `ObjectId` is [`validate`], so a
//! malformed identifier can never reach the store.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Length of the hex form of an identifier.
pub const HEX_LEN: usize = 24;

const COUNTER_MASK: u32 = 0x00ff_ffff;

/// The store's native identifier type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

/// Returned by [`validate`] for anything that is not 24 lowercase hex chars.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id: {raw:?}")]
pub struct InvalidId {
    pub raw: String,
}

/// Check a client-supplied identifier.
///
/// Accepts exactly 24 characters of `[0-9a-f]`. No trimming, no case folding.
pub fn validate(raw: &str) -> Result<ObjectId, InvalidId> {
    let well_formed = raw.len() == HEX_LEN
        && raw
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !well_formed {
        return Err(InvalidId {
            raw: raw.to_string(),
        });
    }

    let mut bytes = [0u8; 12];
    hex::decode_to_slice(raw, &mut bytes).map_err(|_| InvalidId {
        raw: raw.to_string(),
    })?;
    Ok(ObjectId(bytes))
}

impl ObjectId {
    /// Generate a fresh identifier.
    ///
    /// Layout: 4-byte big-endian seconds, 5 bytes of per-process randomness,
    /// 3-byte big-endian counter.
    pub fn new() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        Self::from_parts(secs, *process_unique(), next_counter())
    }

    fn from_parts(secs: u32, unique: [u8; 5], counter: u32) -> Self {
        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&unique);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        ObjectId(bytes)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Lowercase hex form, as sent on the wire.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

fn process_unique() -> &'static [u8; 5] {
    static UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
    UNIQUE.get_or_init(rand::random)
}

fn next_counter() -> u32 {
    static COUNTER: OnceLock<AtomicU32> = OnceLock::new();
    COUNTER
        .get_or_init(|| AtomicU32::new(rand::random::<u32>() & COUNTER_MASK))
        .fetch_add(1, Ordering::Relaxed)
        & COUNTER_MASK
}
