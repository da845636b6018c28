//! Port traits — the hexagonal boundary between the hub core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ capture / radio / tasks (domain)
//! ```
//!
//! Digital pins and delays use the `embedded-hal` 1.0 traits directly.
//! Everything the HAL does not cover (monotonic time, the radio UART, the
//! wireless link) is a port defined here, so the domain never touches
//! ESP-IDF and every module runs on the host against mocks.

// ───────────────────────────────────────────────────────────────
// Time source
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock (wraps at `u32::MAX`, ~49 days).
///
/// All elapsed-time arithmetic in the crate uses `wrapping_sub`, so the
/// wrap is harmless.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// Serial stream (radio UART)
// ───────────────────────────────────────────────────────────────

/// Byte stream to the radio transceiver.
pub trait SerialPort {
    type Error: core::fmt::Debug;

    /// Restart the stream at `baud` with the given blocking-read timeout.
    fn reconfigure(&mut self, baud: u32, read_timeout_ms: u32) -> Result<(), Self::Error>;

    /// Non-blocking single byte read.
    fn read_byte(&mut self) -> Option<u8>;

    /// Queue `bytes` for transmission.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Block until queued bytes have left the transmitter.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Discard everything waiting in the receive buffer.
    fn discard_input(&mut self) {
        while self.read_byte().is_some() {}
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink (capture engine → wireless notifications)
// ───────────────────────────────────────────────────────────────

/// Receives accepted logical input events.
pub trait EventSink {
    /// A named event (`"Inicio"`, `"Input1 ON"`, …) with its acceptance time.
    fn emit(&mut self, name: &str, timestamp_ms: u32);

    /// Timing-gate batch `[F1, F2, F3, reserved]`.
    fn emit_gate_times(&mut self, times: &[u32; 4]);
}

// ───────────────────────────────────────────────────────────────
// Wireless link (BLE peripheral)
// ───────────────────────────────────────────────────────────────

/// The short-range wireless peripheral as seen by the core.
///
/// Service declaration and advertising live in the adapter; the core only
/// asks whether a central is connected and pushes notifications.
pub trait LinkPort {
    /// Whether a central is currently connected.
    fn is_connected(&mut self) -> bool;

    /// Notify on the input-event characteristic.
    fn notify_events(&mut self, payload: &[u8]);

    /// Write the firmware/info characteristic.
    fn notify_info(&mut self, payload: &[u8]);
}

/// Routes [`EventSink`] traffic onto a [`LinkPort`]'s event characteristic.
pub struct LinkEventSink<'a, L: LinkPort>(pub &'a mut L);

impl<L: LinkPort> EventSink for LinkEventSink<'_, L> {
    fn emit(&mut self, name: &str, timestamp_ms: u32) {
        let payload = crate::events::encode_named(name, timestamp_ms);
        log::debug!("Link: event {}", payload);
        self.0.notify_events(payload.as_bytes());
    }

    fn emit_gate_times(&mut self, times: &[u32; 4]) {
        log::debug!(
            "Link: gates F1={} F2={} F3={}",
            times[0],
            times[1],
            times[2]
        );
        self.0.notify_events(&crate::events::encode_gate_batch(times));
    }
}
