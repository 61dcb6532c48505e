//! Persisted log record layout
//!
//! ```text
//! offset  size  field
//! 0       4     timestamp_ms  (u32 LE)
//! 4       2     sensor_a      (u16 LE)
//! 6       2     sensor_b      (u16 LE)
//! 8       8     aux[0..4]     (i16 LE each)
//! ```
//!
//! Must stay byte-for-byte compatible with records already on flash.

use crate::config::RECORD_SIZE;

/// Encoded record length in bytes
pub const RECORD_LEN: usize = RECORD_SIZE as usize;

/// One sample written to the flash log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogRecord {
    /// Milliseconds since boot when the sample was taken.
    pub timestamp_ms: u32,
    /// Moisture probe M1, raw ADC.
    pub sensor_a: u16,
    /// Moisture probe M2, raw ADC.
    pub sensor_b: u16,
    /// ADS1115 channels 0-3.
    pub aux: [i16; 4],
}

impl LogRecord {
    /// Encode to the on-flash layout
    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        out[0..4].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        out[4..6].copy_from_slice(&self.sensor_a.to_le_bytes());
        out[6..8].copy_from_slice(&self.sensor_b.to_le_bytes());
        for (i, value) in self.aux.iter().enumerate() {
            let at = 8 + i * 2;
            out[at..at + 2].copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Decode from the on-flash layout
    pub fn from_bytes(bytes: &[u8; RECORD_LEN]) -> Self {
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let i16_at = |at: usize| i16::from_le_bytes([bytes[at], bytes[at + 1]]);

        Self {
            timestamp_ms: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            sensor_a: u16_at(4),
            sensor_b: u16_at(6),
            aux: [i16_at(8), i16_at(10), i16_at(12), i16_at(14)],
        }
    }

    /// True if every byte still holds the erased pattern
    pub fn is_erased(&self) -> bool {
        self.to_bytes().iter().all(|&b| b == crate::flash::ERASED_BYTE)
    }
}

impl core::fmt::Display for LogRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "t={}ms M1={} M2={} ADS={},{},{},{}",
            self.timestamp_ms,
            self.sensor_a,
            self.sensor_b,
            self.aux[0],
            self.aux[1],
            self.aux[2],
            self.aux[3]
        )
    }
}
