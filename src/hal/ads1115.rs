//! ADS1115 16-bit ADC driver
//!
//! Single-shot, single-ended conversions on AIN0..AIN3, ±4.096 V range,
//! 128 SPS. Reference: ADS1115 datasheet (SBAS444)

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::HalError;

/// ADS1115 register addresses
mod regs {
    pub const CONVERSION: u8 = 0x00;
    pub const CONFIG: u8 = 0x01;
}

/// Config MSB: start single shot, AIN0 vs GND, ±4.096 V, single-shot mode.
/// Channel selects the MUX via bits 12..14.
const CONFIG_MSB_BASE: u8 = 0xC1;
/// Config LSB: 128 SPS, comparator disabled.
const CONFIG_LSB: u8 = 0x83;

/// Conversion wait at 128 SPS, with margin
const CONVERSION_MS: u32 = 10;

/// Number of single-ended inputs
pub const CHANNELS: u8 = 4;

/// ADS1115 driver
#[derive(Debug, Clone, Copy)]
pub struct Ads1115 {
    addr: u8,
}

impl Ads1115 {
    /// Create new driver at 7-bit address `addr`
    pub const fn new(addr: u8) -> Self {
        Self { addr }
    }

    /// Config register bytes for a single-ended conversion on `channel`
    pub fn config_bytes(channel: u8) -> [u8; 3] {
        [regs::CONFIG, CONFIG_MSB_BASE | (channel << 4), CONFIG_LSB]
    }

    /// Run one conversion on `channel` (0-3) and return the signed result
    pub fn read_channel(
        &self,
        i2c: &mut impl I2c,
        delay: &mut impl DelayNs,
        channel: u8,
    ) -> Result<i16, HalError> {
        if channel >= CHANNELS {
            return Err(HalError::InvalidConfig);
        }

        i2c.write(self.addr, &Self::config_bytes(channel))
            .map_err(|_| HalError::I2cError)?;

        delay.delay_ms(CONVERSION_MS);

        let mut result = [0u8; 2];
        i2c.write_read(self.addr, &[regs::CONVERSION], &mut result)
            .map_err(|_| HalError::I2cError)?;

        Ok(i16::from_be_bytes(result))
    }
}
