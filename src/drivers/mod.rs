//! Board bring-up and pin drivers.

pub mod gpio;
pub mod hw_init;
