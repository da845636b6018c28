//! One-shot GPIO initialisation and the timing-gate interrupt handlers.
//!
//! Configures every board pin with raw ESP-IDF sys calls.  Called once from
//! `main()` before any task starts.  Off-target both entry points only log.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

use crate::error::InitError;
use crate::inputs::EdgeCaptureBank;
#[cfg(target_os = "espidf")]
use crate::pins;

/// Edge state for gates F1, F2, F3, written by their ISRs.
pub static GATE_EDGES: EdgeCaptureBank<3> = EdgeCaptureBank::new(500);

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), InitError> {
    // SAFETY: called once from main() before tasks start; single-threaded.
    unsafe {
        init_inputs()?;
        init_outputs()?;
    }
    info!("hw_init: GPIO configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), InitError> {
    log::info!("hw_init(sim): GPIO init skipped");
    Ok(())
}

// ── GPIO inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn config_input(pin: i32, pull_up: bool, intr: gpio_int_type_t) -> Result<(), InitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: if pull_up {
            gpio_pullup_t_GPIO_PULLUP_ENABLE
        } else {
            gpio_pullup_t_GPIO_PULLUP_DISABLE
        },
        pull_down_en: if pull_up {
            gpio_pulldown_t_GPIO_PULLDOWN_DISABLE
        } else {
            gpio_pulldown_t_GPIO_PULLDOWN_ENABLE
        },
        intr_type: intr,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(InitError::Gpio(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_inputs() -> Result<(), InitError> {
    // Gates: pull-up, falling edge.
    for pin in [pins::F1_GPIO, pins::F2_GPIO, pins::F3_GPIO] {
        unsafe { config_input(pin, true, gpio_int_type_t_GPIO_INTR_NEGEDGE)? };
    }
    // Keypad columns: pull-up, a pressed key pulls them low.
    for pin in pins::KEYPAD_COL_GPIOS {
        unsafe { config_input(pin, true, gpio_int_type_t_GPIO_INTR_DISABLE)? };
    }
    // Switches: pull-down, HIGH = ON.
    for pin in pins::SWITCH_GPIOS {
        unsafe { config_input(pin, false, gpio_int_type_t_GPIO_INTR_DISABLE)? };
    }
    info!("hw_init: GPIO inputs configured");
    Ok(())
}

// ── GPIO outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_outputs() -> Result<(), InitError> {
    // Keypad rows idle high; APC220 SET high = operational.
    let mut outputs = [0i32; 4];
    outputs[..3].copy_from_slice(&pins::KEYPAD_ROW_GPIOS);
    outputs[3] = pins::APC_SET_GPIO;

    for pin in outputs {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(InitError::Gpio(ret));
        }
        unsafe { gpio_set_level(pin, 1) };
    }

    info!("hw_init: GPIO outputs configured");
    Ok(())
}

// ── Gate ISRs ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn isr_now_ms() -> u32 {
    // SAFETY: esp_timer_get_time is an RTC counter read; safe in ISR context.
    (unsafe { esp_timer_get_time() } / 1_000) as u32
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn gate_isr(arg: *mut core::ffi::c_void) {
    // The handler argument carries the channel index, not a pointer.
    GATE_EDGES.on_edge(arg as usize, isr_now_ms());
}

/// Install the per-pin GPIO ISR service and attach the gate handlers.
/// Call after [`init_peripherals`] and after the gate window is set.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), InitError> {
    // SAFETY: ESP_ERR_INVALID_STATE means the service is already installed.
    // The handlers only touch the lock-free GATE_EDGES bank.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(InitError::Gpio(ret));
        }

        for (channel, pin) in [pins::F1_GPIO, pins::F2_GPIO, pins::F3_GPIO]
            .into_iter()
            .enumerate()
        {
            let ret = gpio_isr_handler_add(pin, Some(gate_isr), channel as *mut core::ffi::c_void);
            if ret != ESP_OK as i32 {
                return Err(InitError::Gpio(ret));
            }
            gpio_intr_enable(pin);
        }
    }
    info!("hw_init: ISR service installed (F1, F2, F3)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), InitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
