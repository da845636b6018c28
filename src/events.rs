//! Wire encoding of logical input events.
//!
//! Accepted events leave the hub as wireless notifications in one of two
//! shapes:
//!
//! ```text
//! named event  : "<name>:<timestamp_ms>"          ASCII, ≤ 50 bytes
//! gate batch   : [F1, F2, F3, reserved]           4 × u32 little-endian
//! ```
//!
//! Encoding is allocation-free so it can run from any task context.

use core::fmt::Write as _;

/// Upper bound of a named-event notification.
pub const EVENT_PAYLOAD_MAX: usize = 50;

/// Size of the raw timing-gate batch.
pub const GATE_BATCH_LEN: usize = 16;

pub type EventPayload = heapless::String<EVENT_PAYLOAD_MAX>;

/// Format a named event as `"<name>:<timestamp>"`.
///
/// The timestamp is never cut; an over-long name is truncated on a char
/// boundary so the payload stays within [`EVENT_PAYLOAD_MAX`].
pub fn encode_named(name: &str, timestamp_ms: u32) -> EventPayload {
    let mut stamp: heapless::String<11> = heapless::String::new();
    let _ = write!(stamp, ":{timestamp_ms}");

    let budget = EVENT_PAYLOAD_MAX - stamp.len();
    let mut cut = name.len().min(budget);
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }

    let mut out = EventPayload::new();
    let _ = out.push_str(&name[..cut]);
    let _ = out.push_str(&stamp);
    out
}

/// Serialise gate timestamps as the raw little-endian batch.
pub fn encode_gate_batch(times: &[u32; 4]) -> [u8; GATE_BATCH_LEN] {
    let mut out = [0u8; GATE_BATCH_LEN];
    for (chunk, t) in out.chunks_exact_mut(4).zip(times) {
        chunk.copy_from_slice(&t.to_le_bytes());
    }
    out
}
