//! System configuration parameters
//!
//! All tunable parameters for the Kroner-Hub.  Nothing is persisted on the
//! device; [`SystemConfig::default()`] holds the values the hub ships with.

use core::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Device model reported over the link and in the boot banner.
pub const DEVICE_MODEL: &str = "Kroner-Hub-v1";
/// Firmware version (tracks the crate version).
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Build identifier injected by CI, `dev` for local builds.
pub const BUILD_ID: &str = match option_env!("KRONER_BUILD_ID") {
    Some(id) => id,
    None => "dev",
};

/// Settings written to the APC220 at boot:
/// 435 MHz, 9600 bps air rate, 20 mW, 9600 bps UART, no parity.
pub const DEFAULT_RADIO_SETTINGS: &str = "PARA 435000 3 9 3 0";

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Input debounce ---
    /// Minimum gap between accepted timing-gate edges (milliseconds)
    pub edge_debounce_ms: u32,
    /// Minimum gap between accepted presses of the same key (milliseconds)
    pub keypad_debounce_ms: u32,
    /// Minimum gap between accepted switch level changes (milliseconds)
    pub switch_debounce_ms: u32,

    // --- Radio ---
    /// UART baud rate between the MCU and the APC220
    pub radio_uart_baud: u32,
    /// Stream read timeout and read-back window (milliseconds)
    pub radio_timeout_ms: u32,
    /// Settings string applied at boot
    pub radio_settings: heapless::String<32>,

    // --- Task periods ---
    /// Keypad / switch / timing-gate scan period (milliseconds)
    pub input_period_ms: u32,
    /// Wireless link connection poll period (milliseconds)
    pub link_period_ms: u32,
    /// Mailbox → radio forwarding period (milliseconds)
    pub radio_period_ms: u32,
    /// Status report period (milliseconds)
    pub status_period_ms: u32,
    /// Console line poll period (milliseconds)
    pub console_period_ms: u32,

    // --- Network ---
    /// Access-point SSID (open network), reported in the status line
    pub ap_ssid: heapless::String<32>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Debounce
            edge_debounce_ms: 500,
            keypad_debounce_ms: 500,
            switch_debounce_ms: 100,

            // Radio
            radio_uart_baud: 9600,
            radio_timeout_ms: 500,
            radio_settings: heapless::String::try_from(DEFAULT_RADIO_SETTINGS)
                .unwrap_or_default(),

            // Task periods
            input_period_ms: 10,    // 100 Hz
            link_period_ms: 20,     // 50 Hz
            radio_period_ms: 200,   // 5 Hz
            status_period_ms: 5000, // 0.2 Hz
            console_period_ms: 50,  // 20 Hz

            // Network
            ap_ssid: heapless::String::try_from("Kroner").unwrap_or_default(),
        }
    }
}

/// Firmware identity line sent over the link: `FW:<ver>|Model:<model>|Build:<id>`.
pub fn firmware_info() -> heapless::String<100> {
    let mut s = heapless::String::new();
    let _ = write!(s, "FW:{FIRMWARE_VERSION}|Model:{DEVICE_MODEL}|Build:{BUILD_ID}");
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert!(c.edge_debounce_ms > 0);
        assert!(c.keypad_debounce_ms > 0);
        assert!(c.switch_debounce_ms > 0);
        assert!(c.radio_uart_baud > 0);
        assert_eq!(c.radio_settings.as_str(), DEFAULT_RADIO_SETTINGS);
        assert_eq!(c.ap_ssid.as_str(), "Kroner");
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn input_scan_outpaces_debounce() {
        let c = SystemConfig::default();
        assert!(
            c.input_period_ms < c.switch_debounce_ms,
            "switches must be sampled several times per debounce window"
        );
        assert!(c.radio_period_ms < c.status_period_ms);
        assert!(c.console_period_ms < c.radio_period_ms);
    }

    #[test]
    fn firmware_info_fits_info_characteristic() {
        let info = firmware_info();
        assert!(info.starts_with("FW:"));
        assert!(info.contains("|Model:Kroner-Hub-v1|"));
        assert!(info.len() <= 50);
    }
}
