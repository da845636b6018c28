//! `embedded-hal` pins over raw ESP-IDF GPIO calls.
//!
//! Pins are configured once in [`hw_init`](super::hw_init); these handles
//! only read and write levels.  Off-target, levels live in a simulated
//! 40-pin bank so the hub can be exercised on the host.

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{ESP_OK, gpio_get_level, gpio_set_level};

/// Raw ESP-IDF error code from a GPIO call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioError(pub i32);

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

// ── Simulated level bank ──────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: core::sync::atomic::AtomicU64 = core::sync::atomic::AtomicU64::new(0);

/// Drive a simulated pin (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level(gpio: i32, high: bool) {
    use core::sync::atomic::Ordering;
    let bit = 1u64 << (gpio & 63);
    if high {
        SIM_LEVELS.fetch_or(bit, Ordering::Relaxed);
    } else {
        SIM_LEVELS.fetch_and(!bit, Ordering::Relaxed);
    }
}

/// Read a simulated pin (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_level(gpio: i32) -> bool {
    SIM_LEVELS.load(core::sync::atomic::Ordering::Relaxed) & (1u64 << (gpio & 63)) != 0
}

#[cfg(target_os = "espidf")]
fn read_level(gpio: i32) -> bool {
    // SAFETY: register read on a pin configured as input by hw_init.
    (unsafe { gpio_get_level(gpio) }) != 0
}

#[cfg(not(target_os = "espidf"))]
fn read_level(gpio: i32) -> bool {
    sim_level(gpio)
}

#[cfg(target_os = "espidf")]
fn write_level(gpio: i32, high: bool) -> Result<(), GpioError> {
    // SAFETY: register write on a pin configured as output by hw_init.
    let ret = unsafe { gpio_set_level(gpio, u32::from(high)) };
    if ret != ESP_OK as i32 {
        return Err(GpioError(ret));
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn write_level(gpio: i32, high: bool) -> Result<(), GpioError> {
    sim_set_level(gpio, high);
    Ok(())
}

// ── Pin handles ───────────────────────────────────────────────

/// A configured input pin.
#[derive(Debug)]
pub struct GpioInput {
    gpio: i32,
}

impl GpioInput {
    pub const fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

impl ErrorType for GpioInput {
    type Error = GpioError;
}

impl InputPin for GpioInput {
    fn is_high(&mut self) -> Result<bool, GpioError> {
        Ok(read_level(self.gpio))
    }

    fn is_low(&mut self) -> Result<bool, GpioError> {
        Ok(!read_level(self.gpio))
    }
}

/// A configured push-pull output pin.
#[derive(Debug)]
pub struct GpioOutput {
    gpio: i32,
}

impl GpioOutput {
    pub const fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

impl ErrorType for GpioOutput {
    type Error = GpioError;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), GpioError> {
        write_level(self.gpio, false)
    }

    fn set_high(&mut self) -> Result<(), GpioError> {
        write_level(self.gpio, true)
    }
}
