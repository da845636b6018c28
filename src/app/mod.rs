//! Application core — the hub's periodic work, independent of the board.
//!
//! Everything here talks to hardware through the **port traits** in
//! [`ports`] or the `embedded-hal` traits, so it runs unchanged against
//! host mocks.

pub mod commands;
pub mod console;
pub mod hub;
pub mod ports;
pub mod status;
