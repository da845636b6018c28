//! Console link adapter.
//!
//! Implements [`LinkPort`] by writing every notification to the logger
//! (UART / USB-CDC in production).  It stands in for the BLE peripheral:
//! the GATT service, advertising and pairing live outside this crate, and a
//! BLE adapter would implement the same trait.  Writes from the central
//! arrive as console lines, see [`crate::app::console`].
//!
//! Handles are cheap clones sharing one "central attached" flag, so the
//! link-tracking task and the input task can each own one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::app::ports::LinkPort;

#[derive(Debug, Clone, Default)]
pub struct ConsoleLink {
    attached: Arc<AtomicBool>,
}

impl ConsoleLink {
    /// A link whose central is the serial console, always attached.
    pub fn attached() -> Self {
        let link = Self::default();
        link.set_attached(true);
        link
    }

    pub fn set_attached(&self, attached: bool) {
        self.attached.store(attached, Ordering::Release);
    }
}

impl LinkPort for ConsoleLink {
    fn is_connected(&mut self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    fn notify_events(&mut self, payload: &[u8]) {
        match core::str::from_utf8(payload) {
            Ok(text) if text.contains(':') => info!("EVENT | {}", text),
            _ => info!("EVENT | raw {:02x?}", payload),
        }
    }

    fn notify_info(&mut self, payload: &[u8]) {
        info!("INFO  | {}", String::from_utf8_lossy(payload));
    }
}
