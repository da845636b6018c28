//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter  | Implements        | Connects to                   |
//! |----------|-------------------|-------------------------------|
//! | `link`   | LinkPort          | Serial log (BLE stand-in)     |
//! | `time`   | Clock, DelayNs    | ESP32 system timer / FreeRTOS |
//! | `uart`   | SerialPort        | ESP32 UART2 → APC220          |

pub mod link;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod uart;
