//! Commands written to the firmware characteristic.
//!
//! A central writes plain text; it is trimmed and matched against a fixed
//! vocabulary.  Answers go back on the same characteristic.

use log::{info, warn};

use super::ports::LinkPort;
use crate::config::firmware_info;

/// Reply to `HELP`.
pub const HELP_TEXT: &str = "Help | FW Version | RESET";

/// Longest command kept for logging.
pub const MAX_COMMAND_LEN: usize = 50;

/// Commands a central can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCommand {
    /// Report firmware version, model and build.
    FirmwareVersion,

    /// Report the command list.
    Help,

    /// Restart the device.
    Reset,

    /// Anything else, kept for the log.
    Unknown(heapless::String<MAX_COMMAND_LEN>),
}

impl LinkCommand {
    /// Parse a raw characteristic write.  `None` for empty or blank input.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(match text {
            "FW Version" | "FW_VERSION" | "fw version" => Self::FirmwareVersion,
            "HELP" | "Help" | "help" => Self::Help,
            "RESET" => Self::Reset,
            other => {
                let mut kept = heapless::String::new();
                for c in other.chars() {
                    if kept.push(c).is_err() {
                        break;
                    }
                }
                Self::Unknown(kept)
            }
        })
    }
}

/// What the caller must do after a command was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    RestartRequested,
}

/// Send the firmware identity line on the info characteristic.
pub fn send_firmware_info(link: &mut impl LinkPort) {
    let info = firmware_info();
    info!("Link: sending firmware info {}", info);
    link.notify_info(info.as_bytes());
}

/// Execute one command against the link.
pub fn handle_command(command: &LinkCommand, link: &mut impl LinkPort) -> CommandOutcome {
    info!("Link: command {:?}", command);
    match command {
        LinkCommand::FirmwareVersion => {
            send_firmware_info(link);
            CommandOutcome::Done
        }
        LinkCommand::Help => {
            link.notify_info(HELP_TEXT.as_bytes());
            CommandOutcome::Done
        }
        LinkCommand::Reset => {
            warn!("Link: restart requested");
            CommandOutcome::RestartRequested
        }
        LinkCommand::Unknown(text) => {
            warn!("Link: unrecognised command '{}'", text);
            CommandOutcome::Done
        }
    }
}

/// Parse and execute a firmware-characteristic write.
pub fn on_info_write(raw: &[u8], link: &mut impl LinkPort) -> CommandOutcome {
    match LinkCommand::parse(raw) {
        Some(command) => handle_command(&command, link),
        None => CommandOutcome::Done,
    }
}
