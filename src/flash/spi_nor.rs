//! SPI NOR flash driver
//!
//! Generic over `embedded_hal::spi::SpiDevice`: every command is one
//! transaction, and the device implementation owns chip select for exactly
//! that transaction, releasing it on success and on error.
//!
//! Reference: GD25D05C / W25Q-family datasheets (standard single-SPI opcodes)

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{Operation, SpiDevice};

use super::{check_erase, check_program, check_range, FlashDevice, FlashError, JedecId};
use crate::config::CONFIG;

/// SPI NOR opcodes
mod opcode {
    pub const WRITE_ENABLE: u8 = 0x06;
    pub const READ_STATUS: u8 = 0x05;
    pub const READ_DATA: u8 = 0x03;
    pub const PAGE_PROGRAM: u8 = 0x02;
    pub const SECTOR_ERASE: u8 = 0x20;
    pub const JEDEC_ID: u8 = 0x9F;
}

/// Status register: write in progress
const STATUS_WIP: u8 = 0x01;
/// Status register: write enable latch
const STATUS_WEL: u8 = 0x02;

/// Busy-wait bounds for long operations.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub erase_ms: u32,
    pub program_ms: u32,
    pub poll_us: u32,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            erase_ms: CONFIG.erase_timeout_ms,
            program_ms: CONFIG.program_timeout_ms,
            poll_us: CONFIG.busy_poll_us,
        }
    }
}

/// Build a command header: opcode followed by a 24-bit big-endian address.
pub fn command_header(op: u8, addr: u32) -> [u8; 4] {
    [op, (addr >> 16) as u8, (addr >> 8) as u8, addr as u8]
}

/// SPI NOR driver
pub struct SpiNorFlash<SPI, D> {
    spi: SPI,
    delay: D,
    capacity: u32,
    timeouts: Timeouts,
}

impl<SPI: SpiDevice, D: DelayNs> SpiNorFlash<SPI, D> {
    /// Create new driver for a part of `capacity` bytes
    pub fn new(spi: SPI, delay: D, capacity: u32) -> Self {
        Self::with_timeouts(spi, delay, capacity, Timeouts::default())
    }

    /// Create new driver with explicit busy-wait bounds
    pub fn with_timeouts(spi: SPI, delay: D, capacity: u32, timeouts: Timeouts) -> Self {
        Self {
            spi,
            delay,
            capacity,
            timeouts,
        }
    }

    /// Release the SPI device and delay provider
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }

    /// Read the status register
    pub fn read_status(&mut self) -> Result<u8, FlashError> {
        let mut status = [0u8; 1];
        self.spi
            .transaction(&mut [
                Operation::Write(&[opcode::READ_STATUS]),
                Operation::Read(&mut status),
            ])
            .map_err(|_| FlashError::Bus)?;
        Ok(status[0])
    }

    /// Poll WIP until clear or `timeout_ms` elapses
    fn wait_ready(&mut self, timeout_ms: u32) -> Result<(), FlashError> {
        let poll_us = self.timeouts.poll_us.max(1);
        let polls = (timeout_ms.saturating_mul(1000) / poll_us).max(1);

        for _ in 0..polls {
            if self.read_status()? & STATUS_WIP == 0 {
                return Ok(());
            }
            self.delay.delay_us(poll_us);
        }

        // Last look after the final delay
        if self.read_status()? & STATUS_WIP == 0 {
            return Ok(());
        }
        Err(FlashError::Timeout)
    }
}

impl<SPI: SpiDevice, D: DelayNs> FlashDevice for SpiNorFlash<SPI, D> {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn jedec_id(&mut self) -> Result<JedecId, FlashError> {
        let mut id = [0u8; 3];
        self.spi
            .transaction(&mut [Operation::Write(&[opcode::JEDEC_ID]), Operation::Read(&mut id)])
            .map_err(|_| FlashError::Bus)?;
        Ok(JedecId(id))
    }

    fn write_enable(&mut self) -> Result<(), FlashError> {
        self.spi
            .write(&[opcode::WRITE_ENABLE])
            .map_err(|_| FlashError::Bus)?;

        if self.read_status()? & STATUS_WEL == 0 {
            return Err(FlashError::WriteProtected);
        }
        Ok(())
    }

    fn sector_erase(&mut self, addr: u32) -> Result<(), FlashError> {
        check_erase(self.capacity, addr)?;

        let header = command_header(opcode::SECTOR_ERASE, addr);
        self.spi.write(&header).map_err(|_| FlashError::Bus)?;

        self.wait_ready(self.timeouts.erase_ms)
    }

    fn page_program(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        check_program(self.capacity, addr, data.len())?;

        let header = command_header(opcode::PAGE_PROGRAM, addr);
        self.spi
            .transaction(&mut [Operation::Write(&header), Operation::Write(data)])
            .map_err(|_| FlashError::Bus)?;

        self.wait_ready(self.timeouts.program_ms)
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        check_range(self.capacity, addr, buf.len())?;

        let header = command_header(opcode::READ_DATA, addr);
        self.spi
            .transaction(&mut [Operation::Write(&header), Operation::Read(buf)])
            .map_err(|_| FlashError::Bus)
    }
}
