//! Edge/level capture engine — raw pin activity in, debounced logical events out.
//!
//! | Input            | Policy        | Context      | Output                      |
//! |------------------|---------------|--------------|-----------------------------|
//! | Timing gates F1–3| edge capture  | GPIO ISR     | `[F1, F2, F3, 0]` batch     |
//! | Switches 1–3     | level debounce| input task   | `"Input<n> ON"` / `"… OFF"` |
//! | 3×3 keypad       | per-key window| input task   | cell name (`"Inicio"`, …)   |
//!
//! Debounce rejections are not errors; a bounced transition is dropped
//! and leaves the channel state untouched.

pub mod edge;
pub mod keypad;
pub mod switch;

pub use edge::EdgeCaptureBank;
pub use keypad::{KeyCell, KeyMatrix, KeyPress, MatrixScanner, RACE_KEYPAD};
pub use switch::{LevelDebouncer, SwitchInput};
