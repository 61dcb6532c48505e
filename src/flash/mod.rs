//! SPI NOR flash access.
//!
//! [`FlashDevice`] is the seam between the record log and the physical part.
//! Every operation is synchronous: erase and program return only once the
//! device reports idle, or fail with [`FlashError::Timeout`].

pub mod spi_nor;

pub use spi_nor::{SpiNorFlash, Timeouts};

use crate::config::{PAGE_SIZE, SECTOR_SIZE};

/// Value of every byte after a sector erase.
pub const ERASED_BYTE: u8 = 0xFF;

/// Flash operation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    /// Device stayed busy past the operation bound
    Timeout,
    /// SPI transfer failed
    Bus,
    /// Write enable latch did not set
    WriteProtected,
    /// Address or length outside the device
    OutOfBounds,
    /// Erase address not sector aligned, or program crosses a page
    Misaligned,
}

impl FlashError {
    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Timeout => "device timeout",
            Self::Bus => "SPI bus error",
            Self::WriteProtected => "write enable failed",
            Self::OutOfBounds => "address out of bounds",
            Self::Misaligned => "misaligned access",
        }
    }
}

impl core::fmt::Display for FlashError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

/// JEDEC manufacturer / memory type / capacity bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JedecId(pub [u8; 3]);

impl core::fmt::Display for JedecId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02X} {:02X} {:02X}", self.0[0], self.0[1], self.0[2])
    }
}

/// Raw NOR flash primitives.
///
/// Program and erase require a preceding [`write_enable`](Self::write_enable);
/// the device clears the latch after each of them.
pub trait FlashDevice {
    /// Device size in bytes.
    fn capacity(&self) -> u32;

    /// Read the JEDEC identification bytes.
    fn jedec_id(&mut self) -> Result<JedecId, FlashError>;

    /// Set the write enable latch.
    fn write_enable(&mut self) -> Result<(), FlashError>;

    /// Erase the 4 KiB sector starting at `addr`, blocking until done.
    fn sector_erase(&mut self, addr: u32) -> Result<(), FlashError>;

    /// Program up to one page at `addr`, blocking until done.
    ///
    /// `data` must not cross a page boundary.
    fn page_program(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError>;

    /// Read `buf.len()` bytes starting at `addr`.
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError>;
}

impl<F: FlashDevice + ?Sized> FlashDevice for &mut F {
    fn capacity(&self) -> u32 {
        (**self).capacity()
    }

    fn jedec_id(&mut self) -> Result<JedecId, FlashError> {
        (**self).jedec_id()
    }

    fn write_enable(&mut self) -> Result<(), FlashError> {
        (**self).write_enable()
    }

    fn sector_erase(&mut self, addr: u32) -> Result<(), FlashError> {
        (**self).sector_erase(addr)
    }

    fn page_program(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        (**self).page_program(addr, data)
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        (**self).read(addr, buf)
    }
}

/// Check a sector erase address against a device of `capacity` bytes.
pub fn check_erase(capacity: u32, addr: u32) -> Result<(), FlashError> {
    if addr % SECTOR_SIZE != 0 {
        return Err(FlashError::Misaligned);
    }
    if addr.checked_add(SECTOR_SIZE).map_or(true, |end| end > capacity) {
        return Err(FlashError::OutOfBounds);
    }
    Ok(())
}

/// Check a page program against a device of `capacity` bytes.
pub fn check_program(capacity: u32, addr: u32, len: usize) -> Result<(), FlashError> {
    check_range(capacity, addr, len)?;
    let offset = addr % PAGE_SIZE;
    if offset as usize + len > PAGE_SIZE as usize {
        return Err(FlashError::Misaligned);
    }
    Ok(())
}

/// Check that `addr..addr+len` lies inside a device of `capacity` bytes.
pub fn check_range(capacity: u32, addr: u32, len: usize) -> Result<(), FlashError> {
    let len = u32::try_from(len).map_err(|_| FlashError::OutOfBounds)?;
    match addr.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(FlashError::OutOfBounds),
    }
}
