//! Interrupt-driven edge capture for the timing gates (F1, F2, F3).
//!
//! Each gate pin fires on its falling edge.  The ISR calls
//! [`EdgeCaptureBank::on_edge`], which records the edge time if the
//! channel's debounce window has passed since its last accepted edge, and
//! raises the bank's shared "new value" flag.  The input task later picks
//! the values up with [`EdgeCaptureBank::take`].
//!
//! Ownership: each channel's fields are written only by that channel's ISR;
//! the pending flag is set by any ISR (Release, after the values) and
//! cleared only by the consuming task (Acquire).

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

struct EdgeChannel {
    last_accepted_ms: AtomicU32,
    value_ms: AtomicU32,
}

impl EdgeChannel {
    const fn new() -> Self {
        Self {
            last_accepted_ms: AtomicU32::new(0),
            value_ms: AtomicU32::new(0),
        }
    }
}

/// `N` edge-captured channels sharing one pending flag.
pub struct EdgeCaptureBank<const N: usize> {
    window_ms: AtomicU32,
    channels: [EdgeChannel; N],
    pending: AtomicBool,
}

impl<const N: usize> EdgeCaptureBank<N> {
    pub const fn new(window_ms: u32) -> Self {
        Self {
            window_ms: AtomicU32::new(window_ms),
            channels: [const { EdgeChannel::new() }; N],
            pending: AtomicBool::new(false),
        }
    }

    /// Change the debounce window.  Call at boot, before the ISRs are attached.
    pub fn set_window(&self, window_ms: u32) {
        self.window_ms.store(window_ms, Ordering::Relaxed);
    }

    /// ISR entry point.  Returns whether the edge was accepted.
    ///
    /// Lock-free and allocation-free; a bounced edge is dropped silently.
    pub fn on_edge(&self, channel: usize, now_ms: u32) -> bool {
        let Some(ch) = self.channels.get(channel) else {
            return false;
        };

        let last = ch.last_accepted_ms.load(Ordering::Relaxed);
        if now_ms.wrapping_sub(last) <= self.window_ms.load(Ordering::Relaxed) {
            return false;
        }

        ch.value_ms.store(now_ms, Ordering::Relaxed);
        ch.last_accepted_ms.store(now_ms, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
        true
    }

    /// Consume the pending flag and return every channel's latest value.
    pub fn take(&self) -> Option<[u32; N]> {
        if !self.pending.swap(false, Ordering::Acquire) {
            return None;
        }
        Some(core::array::from_fn(|i| {
            self.channels[i].value_ms.load(Ordering::Relaxed)
        }))
    }

    /// Whether an accepted edge is waiting to be taken.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Latest accepted edge time of one channel (0 if none yet).
    pub fn value(&self, channel: usize) -> Option<u32> {
        self.channels
            .get(channel)
            .map(|ch| ch.value_ms.load(Ordering::Relaxed))
    }
}
