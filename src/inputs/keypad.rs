//! 3×3 keypad: matrix scanning and per-key debounce.
//!
//! Two halves:
//!
//! - [`MatrixScanner`] walks the matrix over `embedded-hal` pins and yields
//!   at most one candidate key per scan, only on a fresh press.
//! - [`KeyMatrix`] owns the key layout and a last-press timestamp per cell.
//!   A candidate key is matched row-major (first match wins); it is accepted
//!   when more than the debounce window has passed since that cell's last
//!   accepted press, and the cell's display name is emitted.

use embedded_hal::digital::{InputPin, OutputPin};
use log::debug;

use crate::app::ports::EventSink;

/// One keypad cell: the key character reported by the scanner and the
/// name sent to the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCell {
    pub key: char,
    pub name: &'static str,
}

const fn cell(key: char, name: &'static str) -> KeyCell {
    KeyCell { key, name }
}

/// Race-control layout printed on the Kroner keypad overlay.
pub const RACE_KEYPAD: [[KeyCell; 3]; 3] = [
    [cell('I', "Inicio"), cell('C', "Carrera"), cell('P', "Pausa")],
    [cell('F', "Fin"), cell('6', "6 Segundos"), cell('4', "4 Puntos")],
    [cell('R', "Reset"), cell('E', "Eliminado"), cell('X', "Perilla")],
];

/// An accepted key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub row: usize,
    pub col: usize,
    pub name: &'static str,
    pub timestamp_ms: u32,
}

pub struct KeyMatrix<const R: usize, const C: usize> {
    cells: [[KeyCell; C]; R],
    last_pressed_ms: [[u32; C]; R],
    window_ms: u32,
}

impl<const R: usize, const C: usize> KeyMatrix<R, C> {
    pub const fn new(cells: [[KeyCell; C]; R], window_ms: u32) -> Self {
        Self {
            cells,
            last_pressed_ms: [[0; C]; R],
            window_ms,
        }
    }

    /// Key characters in scanner order.
    pub fn keymap(&self) -> [[char; C]; R] {
        core::array::from_fn(|r| core::array::from_fn(|c| self.cells[r][c].key))
    }

    /// Handle one candidate key from the scanner.
    pub fn on_key(&mut self, key: char, now_ms: u32, sink: &mut impl EventSink) -> Option<KeyPress> {
        for (r, row) in self.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if cell.key != key {
                    continue;
                }
                let since = now_ms.wrapping_sub(self.last_pressed_ms[r][c]);
                if since > self.window_ms {
                    self.last_pressed_ms[r][c] = now_ms;
                    debug!("Keypad: '{}' accepted -> {}", key, cell.name);
                    sink.emit(cell.name, now_ms);
                    return Some(KeyPress {
                        row: r,
                        col: c,
                        name: cell.name,
                        timestamp_ms: now_ms,
                    });
                }
                debug!("Keypad: '{}' ignored ({}ms since last press)", key, since);
            }
        }
        None
    }
}

/// Row-driven matrix scanner.
///
/// Rows idle HIGH; a scan pulls one row LOW at a time and reads the
/// pulled-up columns, a LOW column meaning the key at that crossing is
/// pressed.  A key is reported once when it goes down, not while held.
pub struct MatrixScanner<O: OutputPin, I: InputPin, const R: usize, const C: usize> {
    rows: [O; R],
    cols: [I; C],
    keymap: [[char; C]; R],
    held: Option<char>,
}

impl<O: OutputPin, I: InputPin, const R: usize, const C: usize> MatrixScanner<O, I, R, C> {
    pub fn new(mut rows: [O; R], cols: [I; C], keymap: [[char; C]; R]) -> Self {
        for row in &mut rows {
            let _ = row.set_high();
        }
        Self {
            rows,
            cols,
            keymap,
            held: None,
        }
    }

    /// Scan the matrix once.  Returns a key only on a new press.
    pub fn scan(&mut self) -> Option<char> {
        let down = self.first_pressed();
        if down == self.held {
            return None;
        }
        self.held = down;
        down
    }

    fn first_pressed(&mut self) -> Option<char> {
        for (r, row) in self.rows.iter_mut().enumerate() {
            if row.set_low().is_err() {
                continue;
            }
            let hit = self
                .cols
                .iter_mut()
                .position(|col| col.is_low().unwrap_or(false));
            let _ = row.set_high();
            if let Some(c) = hit {
                return Some(self.keymap[r][c]);
            }
        }
        None
    }
}
