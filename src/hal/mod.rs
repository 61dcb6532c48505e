//! Hardware Abstraction Layer for SoilLogger.
//!
//! Thin wrappers around the board peripherals.
//! Business logic stays in core modules, HAL is just I/O.

pub mod ads1115;
pub mod i2c_scan;
pub mod moisture;
pub mod st7032;

pub use ads1115::Ads1115;
pub use moisture::{moisture_pct, Calibration, Probe};
pub use st7032::St7032;

/// Peripheral error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// I2C communication error
    I2cError,
    /// ADC conversion failed
    AdcError,
    /// GPIO write failed
    GpioError,
    /// Operator did not respond in time
    Timeout,
    /// Invalid parameter passed to driver
    InvalidConfig,
}

impl HalError {
    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::I2cError => "I2C error",
            Self::AdcError => "ADC error",
            Self::GpioError => "GPIO error",
            Self::Timeout => "timeout",
            Self::InvalidConfig => "invalid config",
        }
    }
}

impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// Everything the console needs from the board besides the flash log.
///
/// Every call blocks until the peripheral answers or its bound expires.
pub trait Board {
    /// Drive the status LED.
    fn set_led(&mut self, on: bool) -> Result<(), HalError>;

    /// Raw ADC reading of a moisture probe.
    fn read_moisture(&mut self, probe: Probe) -> Result<u16, HalError>;

    /// True if a device ACKs at the 7-bit address `addr`.
    fn i2c_probe(&mut self, addr: u8) -> bool;

    /// Single-shot conversion of ADS1115 channel 0-3.
    fn read_ads(&mut self, channel: u8) -> Result<i16, HalError>;

    /// Write `text` at the start of LCD line `line` (0 or 1).
    fn lcd_write(&mut self, line: u8, text: &str) -> Result<(), HalError>;

    /// Milliseconds since boot.
    fn uptime_ms(&mut self) -> u32;

    /// Block until the operator presses a key.
    fn wait_for_key(&mut self) -> Result<u8, HalError>;
}
