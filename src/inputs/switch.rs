//! Polled discrete switches with level debounce.
//!
//! A switch is sampled by the input task.  A level is accepted when it
//! differs from the last accepted level *and* the debounce window has
//! passed since the last accepted change; the switch then emits
//! `"<label> ON"` or `"<label> OFF"` stamped with the poll time.

use core::fmt::Write as _;

use embedded_hal::digital::InputPin;
use log::debug;

use crate::app::ports::EventSink;

/// Pure level-debounce state machine, independent of any pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelDebouncer {
    window_ms: u32,
    level: bool,
    /// `None` until the first accepted change (no baseline).
    last_accepted_ms: Option<u32>,
}

impl LevelDebouncer {
    /// Accepted level starts LOW with no baseline timestamp, so the first
    /// differing read is accepted immediately.
    pub const fn new(window_ms: u32) -> Self {
        Self {
            window_ms,
            level: false,
            last_accepted_ms: None,
        }
    }

    /// Start from an accepted `level` at `at_ms`.
    pub const fn with_baseline(window_ms: u32, level: bool, at_ms: u32) -> Self {
        Self {
            window_ms,
            level,
            last_accepted_ms: Some(at_ms),
        }
    }

    /// Force the accepted state, e.g. when announcing the initial level.
    pub fn rebaseline(&mut self, level: bool, at_ms: u32) {
        self.level = level;
        self.last_accepted_ms = Some(at_ms);
    }

    /// Feed one sample.  Returns the newly accepted level, if any.
    pub fn update(&mut self, level: bool, now_ms: u32) -> Option<bool> {
        if level == self.level {
            return None;
        }
        if let Some(last) = self.last_accepted_ms {
            if now_ms.wrapping_sub(last) <= self.window_ms {
                return None;
            }
        }
        self.level = level;
        self.last_accepted_ms = Some(now_ms);
        Some(level)
    }

    /// Last accepted level.
    pub fn level(&self) -> bool {
        self.level
    }
}

/// A discrete input pin (HIGH = ON) behind a [`LevelDebouncer`].
pub struct SwitchInput<P: InputPin> {
    label: heapless::String<16>,
    pin: P,
    debouncer: LevelDebouncer,
}

impl<P: InputPin> SwitchInput<P> {
    /// The accepted state starts LOW at t=0, matching a pulled-down input
    /// at boot.
    pub fn new(label: &str, pin: P, window_ms: u32) -> Self {
        let mut l = heapless::String::new();
        for c in label.chars() {
            if l.push(c).is_err() {
                break;
            }
        }
        Self {
            label: l,
            pin,
            debouncer: LevelDebouncer::with_baseline(window_ms, false, 0),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Last accepted level.
    pub fn is_on(&self) -> bool {
        self.debouncer.level()
    }

    /// Sample the pin once and emit an event on an accepted change.
    pub fn poll(&mut self, now_ms: u32, sink: &mut impl EventSink) -> Option<bool> {
        let level = self.read()?;
        let accepted = self.debouncer.update(level, now_ms)?;
        self.emit(accepted, now_ms, sink);
        Some(accepted)
    }

    /// Read the pin, adopt its level as the accepted state and emit it
    /// unconditionally.  Used when a central connects.
    pub fn announce(&mut self, now_ms: u32, sink: &mut impl EventSink) {
        let Some(level) = self.read() else {
            return;
        };
        self.debouncer.rebaseline(level, now_ms);
        self.emit(level, now_ms, sink);
        debug!(
            "Inputs: initial {} = {}",
            self.label,
            if level { "ON" } else { "OFF" }
        );
    }

    fn read(&mut self) -> Option<bool> {
        match self.pin.is_high() {
            Ok(level) => Some(level),
            Err(e) => {
                debug!("Inputs: {} read failed: {:?}", self.label, e);
                None
            }
        }
    }

    fn emit(&self, level: bool, now_ms: u32, sink: &mut impl EventSink) {
        let mut name: heapless::String<24> = heapless::String::new();
        let _ = write!(name, "{} {}", self.label, if level { "ON" } else { "OFF" });
        sink.emit(&name, now_ms);
    }
}
