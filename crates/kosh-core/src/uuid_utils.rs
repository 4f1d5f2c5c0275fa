//! UUID v7 utilities for time-ordered identifiers.
//!
//! Ledger rows (resolution results, review records) use UUIDv7 so that
//! primary-key order matches insertion order, which the recent-reviews
//! read path exploits.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// UUIDv7 embeds a Unix timestamp (milliseconds) in the first 48 bits,
/// providing natural time-ordering.
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a "floor" UUIDv7 for a specific timestamp, with zeroed random
/// bits. Useful as a boundary value for temporal range queries.
pub fn v7_from_timestamp(ts: &DateTime<Utc>) -> Uuid {
    let millis = ts.timestamp_millis() as u64;
    let bytes = [
        ((millis >> 40) & 0xFF) as u8,
        ((millis >> 32) & 0xFF) as u8,
        ((millis >> 24) & 0xFF) as u8,
        ((millis >> 16) & 0xFF) as u8,
        ((millis >> 8) & 0xFF) as u8,
        (millis & 0xFF) as u8,
        0x70, // version 7, zero rand_a high bits
        0x00,
        0x80, // variant 10, zero rand_b high bits
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
    ];
    Uuid::from_bytes(bytes)
}

/// Check whether a UUID is version 7.
pub fn is_v7(id: &Uuid) -> bool {
    id.get_version_num() == 7
}

/// Extract the embedded millisecond timestamp from a UUIDv7.
///
/// Returns `None` for non-v7 UUIDs.
pub fn extract_timestamp(id: &Uuid) -> Option<DateTime<Utc>> {
    if !is_v7(id) {
        return None;
    }
    let bytes = id.as_bytes();
    let mut millis: u64 = 0;
    for byte in &bytes[..6] {
        millis = (millis << 8) | u64::from(*byte);
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}
