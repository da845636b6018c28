//! APC220 parameter set: `<freq kHz> <rf rate> <power> <uart rate> <parity>`.
//!
//! The radio echoes a successful write back as `PARA <params>`, and the same
//! text with either `PARA ` or `WR ` in front is accepted as input.

use core::fmt;
use core::str::FromStr;

use crate::error::SettingsError;

/// Strip a leading `"PARA "` or `"WR "` and surrounding whitespace.
pub fn canonical_params(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("PARA ")
        .or_else(|| s.strip_prefix("WR "))
        .unwrap_or(s)
        .trim()
}

/// Over-the-air data rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RfDataRate {
    Bps2400 = 1,
    Bps4800 = 2,
    Bps9600 = 3,
    Bps19200 = 4,
}

impl RfDataRate {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Bps2400),
            2 => Some(Self::Bps4800),
            3 => Some(Self::Bps9600),
            4 => Some(Self::Bps19200),
            _ => None,
        }
    }

    pub fn bps(self) -> u32 {
        match self {
            Self::Bps2400 => 2400,
            Self::Bps4800 => 4800,
            Self::Bps9600 => 9600,
            Self::Bps19200 => 19200,
        }
    }
}

/// UART rate between host and radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UartRate {
    Bps1200 = 0,
    Bps2400 = 1,
    Bps4800 = 2,
    Bps9600 = 3,
    Bps19200 = 4,
    Bps38400 = 5,
    Bps57600 = 6,
}

impl UartRate {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Bps1200),
            1 => Some(Self::Bps2400),
            2 => Some(Self::Bps4800),
            3 => Some(Self::Bps9600),
            4 => Some(Self::Bps19200),
            5 => Some(Self::Bps38400),
            6 => Some(Self::Bps57600),
            _ => None,
        }
    }

    pub fn baud(self) -> u32 {
        match self {
            Self::Bps1200 => 1200,
            Self::Bps2400 => 2400,
            Self::Bps4800 => 4800,
            Self::Bps9600 => 9600,
            Self::Bps19200 => 19200,
            Self::Bps38400 => 38400,
            Self::Bps57600 => 57600,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Parity {
    None = 0,
    Even = 1,
    Odd = 2,
}

impl Parity {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Even),
            2 => Some(Self::Odd),
            _ => None,
        }
    }
}

/// Highest output power code (20 mW).
pub const MAX_POWER: u8 = 9;

/// A validated APC220 parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioSettings {
    pub frequency_khz: u32,
    pub rf_rate: RfDataRate,
    /// 0 (lowest) ..= 9 (20 mW).
    pub power: u8,
    pub uart_rate: UartRate,
    pub parity: Parity,
}

fn field<T: FromStr>(raw: &str, name: &'static str) -> Result<T, SettingsError> {
    raw.parse().map_err(|_| SettingsError::NotANumber(name))
}

impl FromStr for RadioSettings {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: heapless::Vec<&str, 5> = heapless::Vec::new();
        let mut count = 0;
        for part in canonical_params(s).split_whitespace() {
            count += 1;
            let _ = parts.push(part);
        }
        if count != 5 {
            return Err(SettingsError::FieldCount(count));
        }

        let frequency_khz = field(parts[0], "frequency")?;
        let rf_rate = RfDataRate::from_code(field(parts[1], "rf rate")?)
            .ok_or(SettingsError::OutOfRange("rf rate"))?;
        let power: u8 = field(parts[2], "power")?;
        if power > MAX_POWER {
            return Err(SettingsError::OutOfRange("power"));
        }
        let uart_rate = UartRate::from_code(field(parts[3], "uart rate")?)
            .ok_or(SettingsError::OutOfRange("uart rate"))?;
        let parity = Parity::from_code(field(parts[4], "parity")?)
            .ok_or(SettingsError::OutOfRange("parity"))?;

        Ok(Self {
            frequency_khz,
            rf_rate,
            power,
            uart_rate,
            parity,
        })
    }
}

/// Canonical parameter text, without any command prefix.
impl fmt::Display for RadioSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.frequency_khz, self.rf_rate as u8, self.power, self.uart_rate as u8, self.parity as u8
        )
    }
}
