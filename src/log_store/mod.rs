//! Append-only record log on raw SPI NOR flash.
//!
//! Records are 16 bytes and are written back to back from address 0:
//! record `i` lives at `i * 16`. A sector is erased right before the first
//! record that lands in it, so a fresh session overwrites whatever an
//! earlier session left behind.
//!
//! The write index is volatile: after a restart it starts at zero again and
//! is not rediscovered from flash contents.

pub mod record;

pub use record::{LogRecord, RECORD_LEN};

use crate::config::{RECORD_SIZE, SECTOR_SIZE};
use crate::flash::{FlashDevice, FlashError};
use crate::{diag_debug, diag_error, diag_info, diag_warn};

/// Log store error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogError {
    /// No room left for another record
    CapacityExceeded,
    /// Record index outside the log region
    OutOfRange,
    /// Underlying flash operation failed
    Device(FlashError),
}

impl LogError {
    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::CapacityExceeded => "log full",
            Self::OutOfRange => "index out of range",
            Self::Device(e) => e.message(),
        }
    }
}

impl core::fmt::Display for LogError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<FlashError> for LogError {
    fn from(e: FlashError) -> Self {
        LogError::Device(e)
    }
}

/// Append-only record store.
///
/// Owns the flash device and the write index.
pub struct LogStore<F> {
    flash: F,
    index: u32,
    region_size: u32,
}

impl<F: FlashDevice> LogStore<F> {
    /// Create a store over the first `region_size` bytes of `flash`.
    ///
    /// The region is clipped to the device and rounded down to whole records.
    pub fn new(flash: F, region_size: u32) -> Self {
        let region_size = region_size.min(flash.capacity());
        let region_size = region_size - region_size % RECORD_SIZE;

        Self {
            flash,
            index: 0,
            region_size,
        }
    }

    /// Append one record.
    ///
    /// Returns the index the record was stored at. On any error the index
    /// is unchanged.
    pub fn append(&mut self, record: &LogRecord) -> Result<u32, LogError> {
        let addr = self.index * RECORD_SIZE;
        if addr + RECORD_SIZE > self.region_size {
            diag_warn!("log full at index {}", self.index);
            return Err(LogError::CapacityExceeded);
        }

        if addr % SECTOR_SIZE == 0 {
            self.erase_sector(addr)?;
        }

        let bytes = record.to_bytes();
        self.flash
            .write_enable()
            .and_then(|()| self.flash.page_program(addr, &bytes))
            .map_err(|e| {
                diag_error!("program at {:#07x} failed: {}", addr, e);
                LogError::Device(e)
            })?;

        let written = self.index;
        self.index += 1;
        diag_debug!("record {} at {:#07x}", written, addr);
        Ok(written)
    }

    /// Read the record at `index`.
    ///
    /// There is no written check: a slot that was never programmed reads
    /// back as the erased pattern.
    pub fn read(&mut self, index: u32) -> Result<LogRecord, LogError> {
        let addr = index
            .checked_mul(RECORD_SIZE)
            .filter(|addr| addr + RECORD_SIZE <= self.region_size)
            .ok_or(LogError::OutOfRange)?;

        let mut bytes = [0u8; RECORD_LEN];
        self.flash.read(addr, &mut bytes)?;
        Ok(LogRecord::from_bytes(&bytes))
    }

    /// Number of records written this session.
    pub fn count(&self) -> u32 {
        self.index
    }

    /// Number of records the region can hold.
    pub fn capacity(&self) -> u32 {
        self.region_size / RECORD_SIZE
    }

    /// Log region size in bytes.
    pub fn region_size(&self) -> u32 {
        self.region_size
    }

    /// Rewind the write index to zero.
    ///
    /// The next append erases sector 0 again.
    pub fn reset(&mut self) {
        diag_info!("log index reset from {}", self.index);
        self.index = 0;
    }

    /// Raw access to the flash device.
    pub fn device_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    /// Release the flash device.
    pub fn release(self) -> F {
        self.flash
    }

    fn erase_sector(&mut self, addr: u32) -> Result<(), LogError> {
        self.flash
            .write_enable()
            .and_then(|()| self.flash.sector_erase(addr))
            .map_err(|e| {
                diag_error!("erase at {:#07x} failed: {}", addr, e);
                LogError::Device(e)
            })?;
        diag_info!("erased sector {:#07x}", addr);
        Ok(())
    }
}
