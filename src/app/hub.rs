//! Hub tasks — the periodic units of work the scheduler runs.
//!
//! ```text
//!  ┌──────────── link task (20 ms) ────────────┐
//!  │ poll central → LinkState (connected, since)│──┐ announce pending
//!  │ on connect: firmware info                  │  │
//!  └────────────────────────────────────────────┘  ▼
//!  ┌──────────── input task (10 ms) ───────────────────────────┐
//!  │ keypad (always) · switches + gates (while connected)      │──▶ LinkPort
//!  └───────────────────────────────────────────────────────────┘
//!  BLE bridge write ──deposit──▶ Mailbox ──drain──▶ radio task (200 ms) ──▶ APC220
//! ```
//!
//! Each task owns its peripherals.  The only state crossing tasks is
//! [`LinkState`] (written by the link task) and the bridge [`Mailbox`].

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::{debug, info, warn};

use super::commands::send_firmware_info;
use super::ports::{Clock, EventSink, LinkEventSink, LinkPort, SerialPort};
use crate::inputs::{EdgeCaptureBank, KeyMatrix, MatrixScanner, SwitchInput};
use crate::mailbox::Mailbox;
use crate::radio::RadioSession;

// ───────────────────────────────────────────────────────────────
// Link connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTransition {
    Connected,
    Disconnected,
    Unchanged,
}

/// Connection flag shared by the link task (sole writer) and its readers.
pub struct LinkState {
    connected: AtomicBool,
    connected_since_ms: AtomicU32,
    announce_pending: AtomicBool,
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkState {
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            connected_since_ms: AtomicU32::new(0),
            announce_pending: AtomicBool::new(false),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// How long the current central has been connected.
    pub fn connected_for_ms(&self, now_ms: u32) -> Option<u32> {
        self.is_connected()
            .then(|| now_ms.wrapping_sub(self.connected_since_ms.load(Ordering::Relaxed)))
    }

    /// Record the link's current connection state.  Link task only.
    pub fn observe(&self, connected: bool, now_ms: u32) -> LinkTransition {
        match (self.connected.load(Ordering::Relaxed), connected) {
            (false, true) => {
                self.connected_since_ms.store(now_ms, Ordering::Relaxed);
                self.announce_pending.store(true, Ordering::Relaxed);
                self.connected.store(true, Ordering::Release);
                LinkTransition::Connected
            }
            (true, false) => {
                self.connected.store(false, Ordering::Release);
                LinkTransition::Disconnected
            }
            _ => LinkTransition::Unchanged,
        }
    }

    /// Consume the "announce initial switch states" request.
    pub fn take_announce(&self) -> bool {
        self.announce_pending.swap(false, Ordering::AcqRel)
    }
}

/// Link task body: track the central and greet it on connect.
pub fn track_link(state: &LinkState, link: &mut impl LinkPort, now_ms: u32) -> LinkTransition {
    let transition = state.observe(link.is_connected(), now_ms);
    match transition {
        LinkTransition::Connected => {
            info!("Link: central connected at {}ms", now_ms);
            send_firmware_info(link);
        }
        LinkTransition::Disconnected => info!("Link: central disconnected"),
        LinkTransition::Unchanged => {}
    }
    transition
}

// ───────────────────────────────────────────────────────────────
// Input scanning
// ───────────────────────────────────────────────────────────────

/// Everything the input task samples.
pub struct InputScanner<'a, O, I, P>
where
    O: OutputPin,
    I: InputPin,
    P: InputPin,
{
    matrix: MatrixScanner<O, I, 3, 3>,
    keys: KeyMatrix<3, 3>,
    switches: [SwitchInput<P>; 3],
    gates: &'a EdgeCaptureBank<3>,
}

impl<'a, O, I, P> InputScanner<'a, O, I, P>
where
    O: OutputPin,
    I: InputPin,
    P: InputPin,
{
    pub fn new(
        matrix: MatrixScanner<O, I, 3, 3>,
        keys: KeyMatrix<3, 3>,
        switches: [SwitchInput<P>; 3],
        gates: &'a EdgeCaptureBank<3>,
    ) -> Self {
        Self {
            matrix,
            keys,
            switches,
            gates,
        }
    }

    /// Input task body.  The keypad is always scanned; switches and gates
    /// only while a central is connected, so gate values wait for it.
    pub fn scan(&mut self, now_ms: u32, state: &LinkState, link: &mut impl LinkPort) {
        let mut sink = LinkEventSink(link);

        if let Some(key) = self.matrix.scan() {
            debug!("Inputs: key '{}' at {}ms", key, now_ms);
            self.keys.on_key(key, now_ms, &mut sink);
        }

        if !state.is_connected() {
            return;
        }

        if state.take_announce() {
            info!("Inputs: sending initial switch states");
            for sw in &mut self.switches {
                sw.announce(now_ms, &mut sink);
            }
        }

        for sw in &mut self.switches {
            sw.poll(now_ms, &mut sink);
        }

        if let Some([f1, f2, f3]) = self.gates.take() {
            info!("Inputs: F1={} F2={} F3={}", f1, f2, f3);
            sink.emit_gate_times(&[f1, f2, f3, 0]);
        }
    }

    pub fn switches(&self) -> &[SwitchInput<P>; 3] {
        &self.switches
    }
}

// ───────────────────────────────────────────────────────────────
// Serial bridge (link → radio)
// ───────────────────────────────────────────────────────────────

/// Bridge-characteristic write handler.  Returns whether it was accepted.
pub fn accept_bridge_write<const N: usize>(mailbox: &Mailbox<N>, data: &[u8], now_ms: u32) -> bool {
    match mailbox.deposit(data, now_ms) {
        Ok(()) => {
            debug!("Bridge: {} byte(s) queued at {}ms", data.len(), now_ms);
            true
        }
        Err(e) => {
            warn!("Bridge: write dropped: {}", e);
            false
        }
    }
}

/// Radio task body: forward the pending bridge payload, if any.
/// Returns the number of bytes sent.
pub fn forward_bridge<const N: usize, S, P, D, C>(
    mailbox: &Mailbox<N>,
    radio: &mut RadioSession<S, P, D, C>,
) -> Option<usize>
where
    S: SerialPort,
    P: OutputPin,
    D: DelayNs,
    C: Clock,
{
    let payload = mailbox.drain()?;
    match radio.forward(&payload.bytes) {
        Ok(()) => {
            info!(
                "Bridge: link -> radio {} byte(s) (received at {}ms)",
                payload.bytes.len(),
                payload.timestamp_ms
            );
            Some(payload.bytes.len())
        }
        Err(e) => {
            warn!("Bridge: radio write failed: {:?}", e);
            None
        }
    }
}
