//! Single-slot cross-context mailbox.
//!
//! Hands one byte payload from a producer context (BLE write callback, ISR,
//! HTTP handler) to a single consumer task without locks.  It is not a
//! queue: a new deposit overwrites any payload that has not been drained
//! yet (last write wins).
//!
//! ```text
//!  producer                              consumer
//!  ────────                              ────────
//!  seq ← odd   (write in progress)
//!  bytes, len, timestamp                 s1 ← seq        (odd or == drained → empty)
//!  seq ← even  (published)               copy len, then bytes
//!                                        s2 ← seq        (≠ s1 → torn, retry later)
//!                                        drained ← s1
//! ```
//!
//! "Ready" is `seq != drained`.  `seq` is written only by the producer side
//! and `drained` only by the consumer, so each field has a single writer.
//! Several logical producers must not deposit concurrently; callers either
//! serialise them or run them from one context.
//!
//! Every field is an atomic, so the slot is sound without `unsafe`.

use core::sync::atomic::{AtomicU8, AtomicU32, AtomicUsize, Ordering, fence};

use crate::error::MailboxError;

/// Largest payload a BLE bridge write may carry.
pub const MAILBOX_CAPACITY: usize = 255;

/// A drained payload — a private copy owned by the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload<const N: usize = MAILBOX_CAPACITY> {
    pub bytes: heapless::Vec<u8, N>,
    /// Clock reading passed to [`Mailbox::deposit`].
    pub timestamp_ms: u32,
}

pub struct Mailbox<const N: usize = MAILBOX_CAPACITY> {
    seq: AtomicU32,
    drained: AtomicU32,
    len: AtomicUsize,
    timestamp_ms: AtomicU32,
    bytes: [AtomicU8; N],
}

impl<const N: usize> Default for Mailbox<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Mailbox<N> {
    pub const fn new() -> Self {
        Self {
            seq: AtomicU32::new(0),
            drained: AtomicU32::new(0),
            len: AtomicUsize::new(0),
            timestamp_ms: AtomicU32::new(0),
            bytes: [const { AtomicU8::new(0) }; N],
        }
    }

    /// Slot capacity in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Copy `data` into the slot and publish it.
    ///
    /// Never blocks and never logs, so it is callable from interrupt
    /// context.  Empty and oversized payloads are rejected whole; the
    /// caller decides whether to log.
    pub fn deposit(&self, data: &[u8], now_ms: u32) -> Result<(), MailboxError> {
        if data.is_empty() {
            return Err(MailboxError::EmptyPayload);
        }
        if data.len() > N {
            return Err(MailboxError::TooLarge {
                len: data.len(),
                capacity: N,
            });
        }

        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        for (slot, byte) in self.bytes.iter().zip(data) {
            slot.store(*byte, Ordering::Relaxed);
        }
        self.len.store(data.len(), Ordering::Relaxed);
        self.timestamp_ms.store(now_ms, Ordering::Relaxed);

        self.seq.store(seq.wrapping_add(2), Ordering::Release);
        Ok(())
    }

    /// Take the pending payload, if any.  Consumer only.
    ///
    /// Returns `None` when nothing is pending, and also when a deposit is
    /// in progress or lands mid-copy; the newer payload then stays pending
    /// for the next call.
    pub fn drain(&self) -> Option<Payload<N>> {
        let published = self.seq.load(Ordering::Acquire);
        if published & 1 == 1 || published == self.drained.load(Ordering::Relaxed) {
            return None;
        }

        let len = self.len.load(Ordering::Relaxed).min(N);
        let timestamp_ms = self.timestamp_ms.load(Ordering::Relaxed);
        let mut bytes = heapless::Vec::new();
        for slot in &self.bytes[..len] {
            let _ = bytes.push(slot.load(Ordering::Relaxed));
        }

        fence(Ordering::Acquire);
        if self.seq.load(Ordering::Relaxed) != published {
            return None;
        }

        self.drained.store(published, Ordering::Relaxed);
        Some(Payload {
            bytes,
            timestamp_ms,
        })
    }

    /// Whether an undrained payload is waiting.  Diagnostic only.
    pub fn is_ready(&self) -> bool {
        let published = self.seq.load(Ordering::Acquire);
        published & 1 == 0 && published != self.drained.load(Ordering::Relaxed)
    }
}
