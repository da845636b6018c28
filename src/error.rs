//! Unified error types for the Kroner-Hub firmware.
//!
//! Every subsystem owns a small `Copy` error enum and the crate-level
//! [`Error`] wraps them, so the boot sequence in `main()` can funnel every
//! failure through one type.  None of these are fatal at runtime: capacity
//! errors are returned to the caller and logged, radio mismatches are only
//! logged.  The single fatal path is peripheral bring-up at boot.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Task table operation rejected.
    Scheduler(SchedulerError),
    /// Mailbox deposit rejected.
    Mailbox(MailboxError),
    /// Radio settings string could not be parsed.
    Settings(SettingsError),
    /// Peripheral initialisation failed.
    Init(InitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduler(e) => write!(f, "scheduler: {e}"),
            Self::Mailbox(e) => write!(f, "mailbox: {e}"),
            Self::Settings(e) => write!(f, "radio settings: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Scheduler errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// The task table has no free slot.
    TableFull,
    /// A task with the same name is already registered.
    DuplicateName,
    /// No task with the given name exists.
    NotFound,
    /// Task names are bounded; longer names are refused, not truncated.
    NameTooLong,
    /// The table is frozen because its tasks are already running.
    AlreadyStarted,
    /// The OS refused to create the task thread.
    SpawnFailed,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableFull => write!(f, "task table full"),
            Self::DuplicateName => write!(f, "task name already registered"),
            Self::NotFound => write!(f, "task not found"),
            Self::NameTooLong => write!(f, "task name too long"),
            Self::AlreadyStarted => write!(f, "tasks already started"),
            Self::SpawnFailed => write!(f, "task thread could not be spawned"),
        }
    }
}

impl std::error::Error for SchedulerError {}

impl From<SchedulerError> for Error {
    fn from(e: SchedulerError) -> Self {
        Self::Scheduler(e)
    }
}

// ---------------------------------------------------------------------------
// Mailbox errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxError {
    /// Zero-length payloads are never deposited.
    EmptyPayload,
    /// Payload exceeds the slot capacity; it is rejected, not truncated.
    TooLarge { len: usize, capacity: usize },
}

impl fmt::Display for MailboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "empty payload"),
            Self::TooLarge { len, capacity } => {
                write!(f, "payload of {len} bytes exceeds {capacity}")
            }
        }
    }
}

impl std::error::Error for MailboxError {}

impl From<MailboxError> for Error {
    fn from(e: MailboxError) -> Self {
        Self::Mailbox(e)
    }
}

// ---------------------------------------------------------------------------
// Radio settings errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// Fewer or more than five parameters.
    FieldCount(usize),
    /// A field is not a decimal number.
    NotANumber(&'static str),
    /// A field holds a code outside its enumeration.
    OutOfRange(&'static str),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldCount(n) => write!(f, "expected 5 parameters, got {n}"),
            Self::NotANumber(field) => write!(f, "{field} is not a number"),
            Self::OutOfRange(field) => write!(f, "{field} out of range"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<SettingsError> for Error {
    fn from(e: SettingsError) -> Self {
        Self::Settings(e)
    }
}

// ---------------------------------------------------------------------------
// Peripheral initialisation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// GPIO could not be configured (raw driver code).
    Gpio(i32),
    /// Radio UART could not be opened (raw driver code).
    Uart(i32),
    /// Radio SET line could not be driven.
    RadioControlLine,
    /// Radio stream rejected the baud rate or timeout.
    RadioStream,
    /// Wireless link stack failed to start.
    Link,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(rc) => write!(f, "GPIO config failed (rc={rc})"),
            Self::Uart(rc) => write!(f, "radio UART failed (rc={rc})"),
            Self::RadioControlLine => write!(f, "radio SET line not drivable"),
            Self::RadioStream => write!(f, "radio stream reconfigure failed"),
            Self::Link => write!(f, "wireless link stack failed to start"),
        }
    }
}

impl std::error::Error for InitError {}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
