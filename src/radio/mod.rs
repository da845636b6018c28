//! APC220 radio: configuration protocol and transparent forwarding.
//!
//! The transceiver has one control line (SET).  HIGH is the transparent
//! operational mode where every UART byte goes over the air; LOW puts it in
//! configuration mode, where it answers line commands:
//!
//! ```text
//!   SET ──┐                       ┌──────── HIGH (operational)
//!         └───────────────────────┘
//!           settle │ "WR <p>\r\n" │ collect ≤ window │ restore │ settle
//!                                   ◀── "PARA <p>\r\n"
//! ```
//!
//! Every exchange holds a [`ConfigWindow`] guard, which drives SET back HIGH
//! when it goes out of scope, so no return path leaves the radio in
//! configuration mode.  Response collection polls an injected [`Clock`] and
//! always ends at its deadline.

pub mod settings;

use core::fmt::Write as _;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, error, info, warn};

use crate::app::ports::{Clock, SerialPort};
use crate::error::InitError;

pub use settings::{Parity, RadioSettings, RfDataRate, UartRate, canonical_params};

/// Longest response kept from one exchange; extra bytes are dropped.
pub const RESPONSE_CAPACITY: usize = 128;

/// Text collected from the radio during one exchange.
pub type Response = heapless::String<RESPONSE_CAPACITY>;

/// State of the SET control line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioMode {
    /// SET HIGH, bytes are forwarded over the air.
    Operational,
    /// SET LOW, the radio parses `RD` / `WR` commands.
    Configuring,
}

/// Outcome of a settings write.  Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The radio echoed `PARA <params>`.
    Confirmed,
    /// The radio answered with something else.
    Mismatch,
    /// Nothing arrived before the deadline.
    NoResponse,
}

/// Delays around a configuration exchange (milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioTiming {
    /// After pulling SET low for a write.
    pub write_settle_ms: u32,
    /// After pulling SET low for a read-back.
    pub read_settle_ms: u32,
    /// After releasing SET, before the radio accepts traffic again.
    pub exit_settle_ms: u32,
    /// How long to collect the answer to a write.
    pub write_window_ms: u32,
}

impl Default for RadioTiming {
    fn default() -> Self {
        Self {
            write_settle_ms: 10,
            read_settle_ms: 1000,
            exit_settle_ms: 200,
            write_window_ms: 600,
        }
    }
}

/// Holds SET low for as long as it lives.
struct ConfigWindow<'a, P: OutputPin> {
    set_pin: &'a mut P,
    mode: &'a mut RadioMode,
}

impl<'a, P: OutputPin> ConfigWindow<'a, P> {
    fn enter(set_pin: &'a mut P, mode: &'a mut RadioMode) -> Self {
        if let Err(e) = set_pin.set_low() {
            warn!("Radio: SET low failed: {:?}", e);
        }
        *mode = RadioMode::Configuring;
        Self { set_pin, mode }
    }
}

impl<P: OutputPin> Drop for ConfigWindow<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.set_pin.set_high() {
            error!("Radio: SET high failed: {:?}", e);
        }
        *self.mode = RadioMode::Operational;
    }
}

/// Drain `stream` until `window_ms` has elapsed on `clock`.
fn collect<S: SerialPort, C: Clock>(stream: &mut S, clock: &C, window_ms: u32) -> Response {
    let mut out = Response::new();
    let start = clock.now_ms();
    while clock.now_ms().wrapping_sub(start) < window_ms {
        while let Some(b) = stream.read_byte() {
            let _ = out.push(char::from(b));
        }
    }
    out
}

/// Owns the radio UART, its SET line, a delay and a clock.
pub struct RadioSession<S, P, D, C>
where
    S: SerialPort,
    P: OutputPin,
    D: DelayNs,
    C: Clock,
{
    stream: S,
    set_pin: P,
    delay: D,
    clock: C,
    mode: RadioMode,
    timing: RadioTiming,
}

impl<S, P, D, C> RadioSession<S, P, D, C>
where
    S: SerialPort,
    P: OutputPin,
    D: DelayNs,
    C: Clock,
{
    pub fn new(stream: S, set_pin: P, delay: D, clock: C) -> Self {
        Self {
            stream,
            set_pin,
            delay,
            clock,
            mode: RadioMode::Operational,
            timing: RadioTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: RadioTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Drive SET high, restart the stream at `baud` with `timeout_ms` read
    /// timeout and drop stale input.
    pub fn initialize(&mut self, baud: u32, timeout_ms: u32) -> Result<(), InitError> {
        self.set_pin.set_high().map_err(|e| {
            error!("Radio: SET line init failed: {:?}", e);
            InitError::RadioControlLine
        })?;
        self.mode = RadioMode::Operational;

        self.stream.reconfigure(baud, timeout_ms).map_err(|e| {
            error!("Radio: stream init at {} baud failed: {:?}", baud, e);
            InitError::RadioStream
        })?;
        self.stream.discard_input();

        info!("Radio: ready at {} baud, timeout {}ms", baud, timeout_ms);
        Ok(())
    }

    /// Write a parameter set and check the radio's echo.
    ///
    /// Accepts `"PARA <p>"`, `"WR <p>"` or bare `<p>`.  The echo matches when
    /// the trimmed response starts with `"PARA <p>"`.
    pub fn apply_settings(&mut self, settings: &str) -> Verification {
        let params = canonical_params(settings);

        let mut command: heapless::String<64> = heapless::String::new();
        let mut expected: heapless::String<64> = heapless::String::new();
        if write!(command, "WR {params}").is_err() || write!(expected, "PARA {params}").is_err() {
            warn!("Radio: settings '{}' too long, not sent", params);
            return Verification::Mismatch;
        }

        info!("Radio: applying '{}'", params);
        let settle = self.timing.write_settle_ms;
        let window = self.timing.write_window_ms;
        let response = self.exchange(&command, settle, window);
        let response = response.trim();

        if response.is_empty() {
            warn!("Radio: no response to '{}'", command);
            Verification::NoResponse
        } else if response.starts_with(expected.as_str()) {
            info!("Radio: settings confirmed ({})", response);
            Verification::Confirmed
        } else {
            warn!("Radio: expected '{}', got '{}'", expected, response);
            Verification::Mismatch
        }
    }

    /// Typed variant of [`apply_settings`](Self::apply_settings).
    pub fn apply(&mut self, settings: &RadioSettings) -> Verification {
        let mut text: heapless::String<48> = heapless::String::new();
        let _ = write!(text, "{settings}");
        self.apply_settings(&text)
    }

    /// Ask the radio for its current parameters.  Returns whatever arrived
    /// within `timeout_ms`, trimmed; empty when the radio stayed silent.
    pub fn read_settings(&mut self, timeout_ms: u32) -> Response {
        let settle = self.timing.read_settle_ms;
        let raw = self.exchange("RD", settle, timeout_ms);

        let mut out = Response::new();
        let _ = out.push_str(raw.trim());
        if out.is_empty() {
            warn!("Radio: no response to read-back within {}ms", timeout_ms);
        } else {
            info!("Radio: current settings '{}'", out);
        }
        out
    }

    /// Send raw bytes over the air.  Only meaningful in operational mode,
    /// which is the only mode observable outside an exchange.
    pub fn forward(&mut self, bytes: &[u8]) -> Result<(), S::Error> {
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }

    pub fn mode(&self) -> RadioMode {
        self.mode
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// One command/response round in configuration mode.
    fn exchange(&mut self, command: &str, settle_ms: u32, window_ms: u32) -> Response {
        let Self {
            stream,
            set_pin,
            delay,
            clock,
            mode,
            timing,
        } = self;

        let response = {
            let _window = ConfigWindow::enter(set_pin, mode);
            delay.delay_ms(settle_ms);
            stream.discard_input();

            debug!("Radio: >> {}", command);
            let sent = stream
                .write_all(command.as_bytes())
                .and_then(|()| stream.write_all(b"\r\n"))
                .and_then(|()| stream.flush());
            match sent {
                Ok(()) => collect(stream, clock, window_ms),
                Err(e) => {
                    warn!("Radio: '{}' not sent: {:?}", command, e);
                    Response::new()
                }
            }
        };

        delay.delay_ms(timing.exit_settle_ms);
        debug!("Radio: << {:?}", response.as_str());
        response
    }
}
