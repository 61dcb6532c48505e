//! ST7032 character LCD driver (2x16, I2C)
//!
//! Every transfer is a control byte followed by one command or data byte.
//! Reference: ST7032i datasheet

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::HalError;

/// Control byte: following byte is a command
const CONTROL_CMD: u8 = 0x00;
/// Control byte: following byte is display data
const CONTROL_DATA: u8 = 0x40;

/// Characters per line
pub const COLUMNS: u8 = 16;

/// Power-on command sequence (function set, oscillator, contrast, follower)
const INIT_EXTENDED: [u8; 6] = [0x38, 0x39, 0x14, 0x70, 0x56, 0x6C];
/// Back to normal instruction set, display on, clear
const INIT_NORMAL: [u8; 3] = [0x38, 0x0C, 0x01];

const CMD_SET_DDRAM: u8 = 0x80;

/// ST7032 driver
#[derive(Debug, Clone, Copy)]
pub struct St7032 {
    addr: u8,
}

impl St7032 {
    /// Create new driver at 7-bit address `addr`
    pub const fn new(addr: u8) -> Self {
        Self { addr }
    }

    /// Initialize the controller
    pub fn init(&self, i2c: &mut impl I2c, delay: &mut impl DelayNs) -> Result<(), HalError> {
        delay.delay_ms(50);
        for cmd in INIT_EXTENDED {
            self.command(i2c, cmd)?;
        }
        // Follower circuit settle time
        delay.delay_ms(200);
        for cmd in INIT_NORMAL {
            self.command(i2c, cmd)?;
        }
        delay.delay_ms(2);
        Ok(())
    }

    /// DDRAM address for `row`, `col`; rows above 0 map to the second line
    pub fn cursor_address(row: u8, col: u8) -> u8 {
        let base = if row == 0 { 0x00 } else { 0x40 };
        base + col.min(COLUMNS - 1)
    }

    /// Move the cursor
    pub fn set_cursor(&self, i2c: &mut impl I2c, row: u8, col: u8) -> Result<(), HalError> {
        self.command(i2c, CMD_SET_DDRAM | Self::cursor_address(row, col))
    }

    /// Write text at the cursor, cut at the line width
    pub fn write_str(&self, i2c: &mut impl I2c, text: &str) -> Result<(), HalError> {
        for byte in text.bytes().take(COLUMNS as usize) {
            self.write_reg(i2c, CONTROL_DATA, byte)?;
        }
        Ok(())
    }

    fn command(&self, i2c: &mut impl I2c, cmd: u8) -> Result<(), HalError> {
        self.write_reg(i2c, CONTROL_CMD, cmd)
    }

    fn write_reg(&self, i2c: &mut impl I2c, control: u8, val: u8) -> Result<(), HalError> {
        i2c.write(self.addr, &[control, val])
            .map_err(|_| HalError::I2cError)
    }
}
