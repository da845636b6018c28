//! Kroner-Hub Firmware — Main Entry Point
//!
//! Boots the board, configures the APC220 and hands control to the
//! core-affine scheduler.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioInput/Output   UartSerial     ConsoleLink   SystemClock   │
//! │  (embedded-hal)     (SerialPort)   (LinkPort)    (Clock)       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  Core 0 (PRO)                    Core 1 (APP)                  │
//! │  ┌───────────────┐               ┌──────────┐ ┌──────────┐     │
//! │  │ Radio  200 ms │◀── Mailbox ───│ Link 20ms│ │Inputs 10 │     │
//! │  └───────────────┘               └──────────┘ └──────────┘     │
//! │        ▲                         ┌────────────────┐            │
//! │        └──── BRIDGE lines ────── │ Console 50 ms  │◀── stdin   │
//! │                                  ├────────────────┤            │
//! │  GPIO ISRs → GATE_EDGES ───────▶ │ Status 5 s     │            │
//! │                                  └────────────────┘            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::io::Read as _;

use anyhow::Result;
use esp_idf_hal::gpio::IOPin;
use esp_idf_hal::peripherals::Peripherals;
use log::{error, info, warn};

use kroner_hub::adapters::link::ConsoleLink;
use kroner_hub::adapters::time::{SystemClock, TaskDelay};
use kroner_hub::adapters::uart::UartSerial;
use kroner_hub::app::commands::CommandOutcome;
use kroner_hub::app::console::{LineBuffer, route_line};
use kroner_hub::app::hub::{InputScanner, LinkState, forward_bridge, track_link};
use kroner_hub::app::ports::Clock;
use kroner_hub::app::status::StatusReport;
use kroner_hub::config::{BUILD_ID, DEVICE_MODEL, FIRMWARE_VERSION, SystemConfig};
use kroner_hub::drivers::gpio::{GpioInput, GpioOutput};
use kroner_hub::drivers::hw_init::{self, GATE_EDGES};
use kroner_hub::inputs::{KeyMatrix, MatrixScanner, RACE_KEYPAD, SwitchInput};
use kroner_hub::mailbox::Mailbox;
use kroner_hub::pins;
use kroner_hub::radio::RadioSession;
use kroner_hub::scheduler::{AffineJob, AffineScheduler, Core, TaskScheduler};

// ── Cross-task state ──────────────────────────────────────────

/// Link → radio handoff.  Written by the console task.
static BRIDGE: Mailbox = Mailbox::new();

/// Written by the link task only.
static LINK_STATE: LinkState = LinkState::new();

macro_rules! halt {
    ($($arg:tt)*) => {{
        // Boot failure is fatal; the task watchdog resets the chip.
        error!($($arg)*);
        #[allow(clippy::empty_loop)]
        loop {}
    }};
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("=================================");
    info!("Device: {}", DEVICE_MODEL);
    info!("Firmware Version: {}", FIRMWARE_VERSION);
    info!("Build: {}", BUILD_ID);
    info!("=================================");

    let config = SystemConfig::default();
    let clock = SystemClock::new();

    // ── 2. GPIO and gate interrupts ───────────────────────────
    GATE_EDGES.set_window(config.edge_debounce_ms);
    if let Err(e) = hw_init::init_peripherals() {
        halt!("HAL init failed: {} — halting", e);
    }
    if let Err(e) = hw_init::init_isr_service() {
        halt!("ISR service init failed: {} — halting", e);
    }

    // ── 3. APC220 radio ───────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let uart = match UartSerial::new(
        peripherals.uart2,
        peripherals.pins.gpio17.downgrade(),
        peripherals.pins.gpio16.downgrade(),
        config.radio_uart_baud,
    ) {
        Ok(u) => u,
        Err(e) => halt!("Radio UART open failed: {} — halting", e),
    };

    let mut radio = RadioSession::new(uart, GpioOutput::new(pins::APC_SET_GPIO), TaskDelay, clock);
    if let Err(e) = radio.initialize(config.radio_uart_baud, config.radio_timeout_ms) {
        halt!("Radio init failed: {} — halting", e);
    }
    radio.apply_settings(&config.radio_settings);
    radio.read_settings(config.radio_timeout_ms);

    // ── 4. Wireless link ──────────────────────────────────────
    // The console stands in for the BLE central: notifications go to the
    // log, writes arrive as stdin lines.
    let link = ConsoleLink::attached();
    info!("Link: bridge ready ({} byte slot)", BRIDGE.capacity());

    // ── 5. Inputs ─────────────────────────────────────────────
    let keys = KeyMatrix::new(RACE_KEYPAD, config.keypad_debounce_ms);
    let matrix = MatrixScanner::new(
        pins::KEYPAD_ROW_GPIOS.map(GpioOutput::new),
        pins::KEYPAD_COL_GPIOS.map(GpioInput::new),
        keys.keymap(),
    );
    let mut n = 0;
    let switches = pins::SWITCH_GPIOS.map(|gpio| {
        n += 1;
        SwitchInput::new(&format!("Input{n}"), GpioInput::new(gpio), config.switch_debounce_ms)
    });
    let mut scanner = InputScanner::new(matrix, keys, switches, &GATE_EDGES);

    // ── 6. Tasks ──────────────────────────────────────────────
    let mut sched = AffineScheduler::new(clock);

    sched.add_task(
        "Radio",
        AffineJob::new(Core::Pro, 2, move || {
            forward_bridge(&BRIDGE, &mut radio);
        }),
        config.radio_period_ms,
    )?;

    let mut link_task = link.clone();
    sched.add_task(
        "Link",
        AffineJob::new(Core::App, 3, move || {
            track_link(&LINK_STATE, &mut link_task, clock.now_ms());
        }),
        config.link_period_ms,
    )?;

    let mut input_link = link.clone();
    sched.add_task(
        "Inputs",
        AffineJob::new(Core::App, 3, move || {
            scanner.scan(clock.now_ms(), &LINK_STATE, &mut input_link);
        }),
        config.input_period_ms,
    )?;

    let mut console_link = link;
    let mut lines = LineBuffer::new();
    sched.add_task(
        "Console",
        AffineJob::new(Core::App, 1, move || {
            let mut chunk = [0u8; 64];
            // The console VFS is non-blocking: nothing pending is an error.
            let Ok(n) = std::io::stdin().lock().read(&mut chunk) else {
                return;
            };
            for &byte in &chunk[..n] {
                let Some(line) = lines.push(byte) else {
                    continue;
                };
                if route_line(&line, &BRIDGE, &mut console_link, clock.now_ms()) == CommandOutcome::RestartRequested {
                    warn!("Restarting on request");
                    esp_idf_hal::reset::restart();
                }
            }
        }),
        config.console_period_ms,
    )?;

    // Live view of the table, Status itself included.
    let monitor = sched.monitor();
    let ap_ssid = config.ap_ssid.clone();
    sched.add_task(
        "Status",
        AffineJob::new(Core::App, 1, move || {
            let tasks = monitor.tasks();
            // SAFETY: heap statistics read, no preconditions.
            let free_heap = unsafe { esp_idf_svc::sys::esp_get_free_heap_size() };
            StatusReport::collect(clock.now_ms(), &LINK_STATE, BRIDGE.is_ready(), &ap_ssid, &tasks)
                .with_free_heap(free_heap)
                .log();
        })
        .stack_kb(3),
        config.status_period_ms,
    )?;

    if let Err(e) = sched.start() {
        halt!("Task start failed: {} — halting", e);
    }
    sched.log_tasks();
    info!("System ready.");

    // ── 7. Idle ───────────────────────────────────────────────
    // `sched` must outlive the tasks: dropping it stops them.
    loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
    }
}
