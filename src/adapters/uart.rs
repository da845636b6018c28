//! APC220 UART adapter.
//!
//! Implements [`SerialPort`] over the ESP-IDF UART driver on UART2
//! (RX = GPIO16, TX = GPIO17).  Only built for the device; host tests use
//! scripted serial stubs instead.

use esp_idf_hal::delay::{NON_BLOCK, TickType};
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::uart::{self, UartDriver};
use esp_idf_hal::units::Hertz;
use esp_idf_svc::sys::EspError;
use log::{debug, info};

use crate::app::ports::SerialPort;

pub struct UartSerial {
    driver: UartDriver<'static>,
    /// Bound on blocking waits (transmit drain), in FreeRTOS ticks.
    wait_ticks: u32,
}

impl UartSerial {
    /// Open `uart` at `baud` on the given pins.
    pub fn new(
        uart: impl Peripheral<P = impl uart::Uart> + 'static,
        tx: AnyIOPin,
        rx: AnyIOPin,
        baud: u32,
    ) -> Result<Self, EspError> {
        let config = uart::config::Config::new().baudrate(Hertz(baud));
        let driver = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &config,
        )?;
        info!("uart: radio UART open at {} baud", baud);
        Ok(Self {
            driver,
            wait_ticks: TickType::new_millis(500).ticks(),
        })
    }
}

impl SerialPort for UartSerial {
    type Error = EspError;

    fn reconfigure(&mut self, baud: u32, read_timeout_ms: u32) -> Result<(), EspError> {
        self.driver.change_baudrate(Hertz(baud))?;
        // Reads are polled non-blocking inside the caller's window, so the
        // timeout bounds the blocking transmit drain instead.
        self.wait_ticks = TickType::new_millis(u64::from(read_timeout_ms)).ticks();
        info!("uart: {} baud, timeout {}ms", baud, read_timeout_ms);
        Ok(())
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.driver.read(&mut buf, NON_BLOCK) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }

    fn write_all(&mut self, mut bytes: &[u8]) -> Result<(), EspError> {
        while !bytes.is_empty() {
            let n = self.driver.write(bytes)?;
            bytes = &bytes[n..];
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), EspError> {
        self.driver.wait_tx_done(self.wait_ticks)
    }

    fn discard_input(&mut self) {
        if let Err(e) = self.driver.clear_rx() {
            debug!("uart: rx clear failed: {}", e);
        }
    }
}
