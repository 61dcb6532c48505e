//! Module: config
//!
//! Purpose: Board and firmware configuration for SoilLogger.
//!
//! Architecture:
//! - One const `FirmwareConfig` (`CONFIG`) is the single source of truth
//! - Capacities used as const generics are re-exported as plain consts
//! - Nothing here is mutable at runtime; calibration lives in the station
//!
//! Moisture probe ADC pins are chosen in `main.rs`: the ADC driver needs
//! typed pins.

use crate::hal::moisture::Calibration;

/// SPI NOR page size in bytes.
pub const PAGE_SIZE: u32 = 256;

/// SPI NOR sector (erase unit) size in bytes.
pub const SECTOR_SIZE: u32 = 4096;

/// Size of one persisted log record in bytes.
pub const RECORD_SIZE: u32 = 16;

/// Console line buffer size (one byte reserved, 63 usable characters).
pub const LINE_SIZE: usize = 64;

/// Number of history entries.
pub const HISTORY_SIZE: usize = 8;

/// Maximum tokens per command line, command name included.
pub const MAX_ARGS: usize = 10;

/// Command table capacity.
pub const MAX_COMMANDS: usize = 20;

/// Console RX ring size in bytes.
pub const RX_RING_SIZE: usize = 256;

/// SPI bus configuration.
#[derive(Debug, Clone, Copy)]
pub struct SpiPins {
    pub sclk: i32,
    pub mosi: i32,
    pub miso: i32,
    pub cs: i32,
    pub baud_hz: u32,
}

/// I2C bus configuration.
#[derive(Debug, Clone, Copy)]
pub struct I2cPins {
    pub sda: i32,
    pub scl: i32,
    pub baud_hz: u32,
}

/// Console UART configuration.
#[derive(Debug, Clone, Copy)]
pub struct UartPins {
    pub tx: i32,
    pub rx: i32,
    pub baud_rate: u32,
}

/// Firmware configuration.
#[derive(Debug, Clone, Copy)]
pub struct FirmwareConfig {
    /// Total size of the SPI NOR part in bytes.
    pub flash_total_size: u32,
    /// Bytes reserved for the record log, starting at address 0.
    pub log_region_size: u32,
    /// Sector used by `ftest`; its contents are saved and restored.
    pub scratch_sector_addr: u32,
    /// Upper bound for one sector erase.
    pub erase_timeout_ms: u32,
    /// Upper bound for one page program.
    pub program_timeout_ms: u32,
    /// Status register polling interval while busy.
    pub busy_poll_us: u32,
    /// Console poll period.
    pub console_poll_ms: u32,
    /// Period of the ADS1115 readout on the LCD.
    pub display_refresh_ms: u32,
    /// How long `moistcal` waits for an operator keypress.
    pub key_wait_timeout_ms: u32,
    /// ADS1115 7-bit address.
    pub ads1115_addr: u8,
    /// ST7032 7-bit address.
    pub st7032_addr: u8,
    /// Default calibration for both moisture probes.
    pub default_calibration: Calibration,
    pub spi: SpiPins,
    pub i2c: I2cPins,
    pub uart: UartPins,
    pub led_pin: i32,
}

/// Active configuration.
pub const CONFIG: FirmwareConfig = FirmwareConfig {
    flash_total_size: 64 * 1024,
    log_region_size: 64 * 1024,
    scratch_sector_addr: 60 * 1024,
    erase_timeout_ms: 400,
    program_timeout_ms: 10,
    busy_poll_us: 500,
    console_poll_ms: 50,
    display_refresh_ms: 1000,
    key_wait_timeout_ms: 60_000,
    ads1115_addr: 0x48,
    st7032_addr: 0x3E,
    default_calibration: Calibration { dry: 3000, wet: 1500 },
    #[cfg(not(feature = "esp32c3"))]
    spi: SpiPins { sclk: 12, mosi: 11, miso: 13, cs: 10, baud_hz: 8_000_000 },
    #[cfg(feature = "esp32c3")]
    spi: SpiPins { sclk: 6, mosi: 7, miso: 2, cs: 10, baud_hz: 8_000_000 },
    #[cfg(not(feature = "esp32c3"))]
    i2c: I2cPins { sda: 8, scl: 9, baud_hz: 100_000 },
    #[cfg(feature = "esp32c3")]
    i2c: I2cPins { sda: 4, scl: 5, baud_hz: 100_000 },
    #[cfg(not(feature = "esp32c3"))]
    uart: UartPins { tx: 43, rx: 44, baud_rate: 115_200 },
    #[cfg(feature = "esp32c3")]
    uart: UartPins { tx: 21, rx: 20, baud_rate: 115_200 },
    #[cfg(not(feature = "esp32c3"))]
    led_pin: 38,
    #[cfg(feature = "esp32c3")]
    led_pin: 8,
};

const _: () = assert!(PAGE_SIZE % RECORD_SIZE == 0, "records must not straddle pages");
const _: () = assert!(CONFIG.log_region_size % SECTOR_SIZE == 0);
const _: () = assert!(CONFIG.scratch_sector_addr % SECTOR_SIZE == 0);
const _: () = assert!(CONFIG.scratch_sector_addr + SECTOR_SIZE <= CONFIG.flash_total_size);
const _: () = assert!(CONFIG.log_region_size <= CONFIG.flash_total_size);
