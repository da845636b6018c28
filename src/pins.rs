//! GPIO / peripheral pin assignments for the Kroner-Hub main board (ESP32).
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Timing gates (falling-edge interrupts, internal pull-up)
// ---------------------------------------------------------------------------

pub const F1_GPIO: i32 = 22;
pub const F2_GPIO: i32 = 21;
pub const F3_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// 3×3 keypad matrix
// ---------------------------------------------------------------------------

/// Row lines, driven low one at a time during a scan.
pub const KEYPAD_ROW_GPIOS: [i32; 3] = [14, 12, 13];
/// Column lines, inputs with pull-up; a pressed key pulls its column low.
pub const KEYPAD_COL_GPIOS: [i32; 3] = [32, 33, 27];

// ---------------------------------------------------------------------------
// Discrete switches (polled, internal pull-down). HIGH = ON.
// ---------------------------------------------------------------------------

pub const SWITCH_GPIOS: [i32; 3] = [15, 4, 5];

// ---------------------------------------------------------------------------
// APC220 radio (UART2)
// ---------------------------------------------------------------------------

pub const APC_RX_GPIO: i32 = 16;
pub const APC_TX_GPIO: i32 = 17;
/// SET line: LOW = configuration mode, HIGH = transparent operation.
pub const APC_SET_GPIO: i32 = 23;
