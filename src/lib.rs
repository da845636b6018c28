//! Kroner-Hub firmware library.
//!
//! Exposes the hub core for integration testing: input capture, the
//! link → radio mailbox, the APC220 protocol and both task schedulers.
//! All ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod inputs;
pub mod mailbox;
pub mod pins;
pub mod radio;
pub mod scheduler;

pub mod adapters;
pub mod drivers;
