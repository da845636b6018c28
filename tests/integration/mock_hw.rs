//! Mock board for integration tests.
//!
//! Pins share their level through `Rc<Cell<_>>` so a test can flip an input
//! or watch an output while the code under test owns the pin.  The APC220
//! stub answers configuration commands only while its SET line is LOW,
//! like the real module.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use kroner_hub::app::ports::{Clock, LinkPort, SerialPort};

// ── Clock & delay ─────────────────────────────────────────────

/// Settable clock.  `step` is added after every reading so busy-wait loops
/// make progress.
#[derive(Clone)]
pub struct MockClock {
    now: Rc<Cell<u32>>,
    step: u32,
}

#[allow(dead_code)]
impl MockClock {
    pub fn manual() -> Self {
        Self {
            now: Rc::new(Cell::new(0)),
            step: 0,
        }
    }

    pub fn ticking() -> Self {
        Self {
            now: Rc::new(Cell::new(0)),
            step: 1,
        }
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u32 {
        let t = self.now.get();
        self.now.set(t.wrapping_add(self.step));
        t
    }
}

/// Adds every requested delay to a shared total.
#[derive(Clone, Default)]
pub struct MockDelay {
    pub total_ns: Rc<Cell<u64>>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
    }
}

// ── Pins ──────────────────────────────────────────────────────

/// A pin whose level is shared with the test.
#[derive(Clone, Default)]
pub struct SharedPin {
    pub level: Rc<Cell<bool>>,
}

#[allow(dead_code)]
impl SharedPin {
    pub fn high() -> Self {
        Self {
            level: Rc::new(Cell::new(true)),
        }
    }

    pub fn set(&self, high: bool) {
        self.level.set(high);
    }

    pub fn get(&self) -> bool {
        self.level.get()
    }
}

impl ErrorType for SharedPin {
    type Error = Infallible;
}

impl InputPin for SharedPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level.get())
    }
    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level.get())
    }
}

impl OutputPin for SharedPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.level.set(false);
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Infallible> {
        self.level.set(true);
        Ok(())
    }
}

// ── Keypad matrix ─────────────────────────────────────────────

/// Electrical model of a 3×3 matrix: a column reads LOW while the row of
/// the pressed key is driven LOW.
#[derive(Clone, Default)]
pub struct KeypadSim {
    rows_low: Rc<RefCell<[bool; 3]>>,
    pressed: Rc<Cell<Option<(usize, usize)>>>,
}

#[allow(dead_code)]
impl KeypadSim {
    pub fn press(&self, row: usize, col: usize) {
        self.pressed.set(Some((row, col)));
    }

    pub fn release(&self) {
        self.pressed.set(None);
    }

    pub fn rows(&self) -> [RowPin; 3] {
        core::array::from_fn(|idx| RowPin {
            idx,
            sim: self.clone(),
        })
    }

    pub fn cols(&self) -> [ColPin; 3] {
        core::array::from_fn(|idx| ColPin {
            idx,
            sim: self.clone(),
        })
    }
}

pub struct RowPin {
    idx: usize,
    sim: KeypadSim,
}

impl ErrorType for RowPin {
    type Error = Infallible;
}

impl OutputPin for RowPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.sim.rows_low.borrow_mut()[self.idx] = true;
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Infallible> {
        self.sim.rows_low.borrow_mut()[self.idx] = false;
        Ok(())
    }
}

pub struct ColPin {
    idx: usize,
    sim: KeypadSim,
}

impl ErrorType for ColPin {
    type Error = Infallible;
}

impl InputPin for ColPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        self.is_low().map(|low| !low)
    }
    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(match self.sim.pressed.get() {
            Some((r, c)) => c == self.idx && self.sim.rows_low.borrow()[r],
            None => false,
        })
    }
}

// ── Wireless link ─────────────────────────────────────────────

/// Records every notification a central would receive.
#[derive(Default)]
pub struct MockLink {
    pub connected: bool,
    pub events: Vec<Vec<u8>>,
    pub info: Vec<Vec<u8>>,
}

#[allow(dead_code)]
impl MockLink {
    /// Text events, in order.  Gate batches are skipped.
    pub fn named_events(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| std::str::from_utf8(e).ok())
            .filter(|s| s.contains(':'))
            .map(str::to_owned)
            .collect()
    }

    /// Decoded timing-gate batches, in order.  Test times must avoid a
    /// `':'` byte.
    pub fn gate_batches(&self) -> Vec<[u32; 4]> {
        self.events
            .iter()
            .filter(|e| e.len() == 16 && !e.contains(&b':'))
            .map(|e| core::array::from_fn(|i| u32::from_le_bytes([e[4 * i], e[4 * i + 1], e[4 * i + 2], e[4 * i + 3]])))
            .collect()
    }
}

impl LinkPort for MockLink {
    fn is_connected(&mut self) -> bool {
        self.connected
    }

    fn notify_events(&mut self, payload: &[u8]) {
        self.events.push(payload.to_vec());
    }

    fn notify_info(&mut self, payload: &[u8]) {
        self.info.push(payload.to_vec());
    }
}

// ── APC220 stub ───────────────────────────────────────────────

/// Behaves like an APC220: parses `WR` / `RD` lines while SET is LOW and
/// forwards everything else "over the air".
pub struct Apc220Stub {
    pub set_line: SharedPin,
    pub params: String,
    pub air: Vec<u8>,
    pub commands: Vec<String>,
    pub baud: Option<u32>,
    line: Vec<u8>,
    rx: VecDeque<u8>,
}

#[allow(dead_code)]
impl Apc220Stub {
    pub fn new(set_line: SharedPin, params: &str) -> Self {
        Self {
            set_line,
            params: params.to_owned(),
            air: Vec::new(),
            commands: Vec::new(),
            baud: None,
            line: Vec::new(),
            rx: VecDeque::new(),
        }
    }

    /// Queue bytes as if the radio had received them.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    fn on_line(&mut self, line: &str) {
        self.commands.push(line.to_owned());
        if let Some(p) = line.strip_prefix("WR ") {
            self.params = p.to_owned();
        } else if line != "RD" {
            self.rx.extend(b"ERROR\r\n");
            return;
        }
        let reply = format!("PARA {}\r\n", self.params);
        self.rx.extend(reply.bytes());
    }
}

impl SerialPort for Apc220Stub {
    type Error = ();

    fn reconfigure(&mut self, baud: u32, _read_timeout_ms: u32) -> Result<(), ()> {
        self.baud = Some(baud);
        Ok(())
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ()> {
        if self.set_line.get() {
            self.air.extend_from_slice(bytes);
            return Ok(());
        }
        self.line.extend_from_slice(bytes);
        while let Some(end) = self.line.windows(2).position(|w| w == b"\r\n") {
            let line: Vec<u8> = self.line.drain(..end + 2).take(end).collect();
            self.on_line(&String::from_utf8_lossy(&line));
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }
}
