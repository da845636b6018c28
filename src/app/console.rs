//! Inbound console lines — the write side of the link.
//!
//! The console carries both characteristic writes a central can make:
//!
//! ```text
//!   "BRIDGE <payload>\n"  ──▶ accept_bridge_write ──▶ Mailbox ──▶ radio
//!   "<command>\n"         ──▶ on_info_write       ──▶ LinkPort / restart
//! ```
//!
//! Bytes arrive in arbitrary chunks; [`LineBuffer`] reassembles them into
//! lines terminated by `\n` (a trailing `\r` is dropped).

use log::warn;

use super::commands::{CommandOutcome, on_info_write};
use super::hub::accept_bridge_write;
use super::ports::LinkPort;
use crate::mailbox::{MAILBOX_CAPACITY, Mailbox};

/// Prefix that routes a line to the serial bridge.
pub const BRIDGE_PREFIX: &[u8] = b"BRIDGE ";

/// Longest accepted console line: a full bridge payload plus its prefix.
pub const MAX_LINE_LEN: usize = MAILBOX_CAPACITY + BRIDGE_PREFIX.len();

pub type Line = heapless::Vec<u8, MAX_LINE_LEN>;

/// Splits a byte stream into lines.
///
/// A line longer than [`MAX_LINE_LEN`] is discarded whole, up to and
/// including its terminator.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Line,
    overflowed: bool,
}

impl LineBuffer {
    pub const fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            overflowed: false,
        }
    }

    /// Feed one byte.  Returns a line when `byte` completes it.
    pub fn push(&mut self, byte: u8) -> Option<Line> {
        if byte == b'\n' {
            let line = core::mem::take(&mut self.buf);
            if core::mem::take(&mut self.overflowed) {
                warn!("Console: line over {} bytes dropped", MAX_LINE_LEN);
                return None;
            }
            let end = if line.last() == Some(&b'\r') { line.len() - 1 } else { line.len() };
            return Some(line.iter().take(end).copied().collect());
        }
        if !self.overflowed && self.buf.push(byte).is_err() {
            self.overflowed = true;
            self.buf.clear();
        }
        None
    }
}

/// Dispatch one complete console line.
pub fn route_line<const N: usize>(
    line: &[u8],
    bridge: &Mailbox<N>,
    link: &mut impl LinkPort,
    now_ms: u32,
) -> CommandOutcome {
    match line.strip_prefix(BRIDGE_PREFIX) {
        Some(payload) => {
            accept_bridge_write(bridge, payload, now_ms);
            CommandOutcome::Done
        }
        None => on_info_write(line, link),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct InfoRecorder {
        info: Vec<Vec<u8>>,
    }

    impl LinkPort for InfoRecorder {
        fn is_connected(&mut self) -> bool {
            true
        }
        fn notify_events(&mut self, _payload: &[u8]) {}
        fn notify_info(&mut self, payload: &[u8]) {
            self.info.push(payload.to_vec());
        }
    }

    fn feed(lb: &mut LineBuffer, bytes: &[u8]) -> Vec<Vec<u8>> {
        bytes.iter().filter_map(|b| lb.push(*b)).map(|l| l.to_vec()).collect()
    }

    #[test]
    fn lines_split_across_chunks() {
        let mut lb = LineBuffer::new();
        assert!(feed(&mut lb, b"HE").is_empty());
        assert_eq!(feed(&mut lb, b"LP\r\nRESET\n"), vec![b"HELP".to_vec(), b"RESET".to_vec()]);
    }

    #[test]
    fn overlong_line_is_dropped_whole() {
        let mut lb = LineBuffer::new();
        let mut long = vec![b'x'; MAX_LINE_LEN + 10];
        long.push(b'\n');
        assert!(feed(&mut lb, &long).is_empty());
        assert_eq!(feed(&mut lb, b"ok\n"), vec![b"ok".to_vec()]);
    }

    #[test]
    fn full_bridge_payload_fits_one_line() {
        let mut lb = LineBuffer::new();
        let mut line = BRIDGE_PREFIX.to_vec();
        line.extend(std::iter::repeat_n(b'a', MAILBOX_CAPACITY));
        line.push(b'\n');
        let lines = feed(&mut lb, &line);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), MAX_LINE_LEN);
    }

    #[test]
    fn bridge_lines_reach_the_mailbox() {
        let mb: Mailbox = Mailbox::new();
        let mut link = InfoRecorder::default();
        assert_eq!(route_line(b"BRIDGE hola", &mb, &mut link, 42), CommandOutcome::Done);
        let p = mb.drain().unwrap();
        assert_eq!(p.bytes.as_slice(), b"hola");
        assert_eq!(p.timestamp_ms, 42);
        assert!(link.info.is_empty());
    }

    #[test]
    fn empty_bridge_payload_is_rejected() {
        let mb: Mailbox = Mailbox::new();
        let mut link = InfoRecorder::default();
        route_line(b"BRIDGE ", &mb, &mut link, 1);
        assert!(!mb.is_ready());
    }

    #[test]
    fn other_lines_are_commands() {
        let mb: Mailbox = Mailbox::new();
        let mut link = InfoRecorder::default();
        assert_eq!(route_line(b"HELP", &mb, &mut link, 1), CommandOutcome::Done);
        assert_eq!(link.info, vec![b"Help | FW Version | RESET".to_vec()]);
        assert_eq!(route_line(b"RESET", &mb, &mut link, 2), CommandOutcome::RestartRequested);
        assert!(!mb.is_ready());
    }
}
