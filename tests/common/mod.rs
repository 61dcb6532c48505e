//! Shared fixtures: RAM-backed NOR flash, scripted board, output sink

#![allow(dead_code)]

use std::collections::VecDeque;

use soil_logger::config::{PAGE_SIZE, SECTOR_SIZE};
use soil_logger::console::RxRing;
use soil_logger::flash::{check_erase, check_program, check_range, FlashDevice, FlashError, JedecId};
use soil_logger::hal::{Board, HalError, Probe};

/// NOR flash in RAM.
///
/// Behaves like the real part: erase sets 0xFF, programming can only clear
/// bits, and both need the write enable latch, which they then clear.
pub struct RamFlash {
    pub mem: Vec<u8>,
    pub wel: bool,
    pub erases: Vec<u32>,
    pub programs: usize,
    pub fail_erase: Option<FlashError>,
    /// Erases of this one sector time out
    pub fail_erase_at: Option<u32>,
    pub fail_program: Option<FlashError>,
}

impl RamFlash {
    pub fn new(capacity: u32) -> Self {
        Self {
            mem: vec![0xFF; capacity as usize],
            wel: false,
            erases: Vec::new(),
            programs: 0,
            fail_erase: None,
            fail_erase_at: None,
            fail_program: None,
        }
    }

    pub fn is_blank(&self, addr: u32, len: u32) -> bool {
        self.mem[addr as usize..(addr + len) as usize]
            .iter()
            .all(|&b| b == 0xFF)
    }
}

impl FlashDevice for RamFlash {
    fn capacity(&self) -> u32 {
        self.mem.len() as u32
    }

    fn jedec_id(&mut self) -> Result<JedecId, FlashError> {
        Ok(JedecId([0xC8, 0x40, 0x10]))
    }

    fn write_enable(&mut self) -> Result<(), FlashError> {
        self.wel = true;
        Ok(())
    }

    fn sector_erase(&mut self, addr: u32) -> Result<(), FlashError> {
        check_erase(self.capacity(), addr)?;
        if let Some(e) = self.fail_erase {
            return Err(e);
        }
        if self.fail_erase_at == Some(addr) {
            self.wel = false;
            return Err(FlashError::Timeout);
        }
        if !std::mem::take(&mut self.wel) {
            return Err(FlashError::WriteProtected);
        }
        let start = addr as usize;
        self.mem[start..start + SECTOR_SIZE as usize].fill(0xFF);
        self.erases.push(addr);
        Ok(())
    }

    fn page_program(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashError> {
        check_program(self.capacity(), addr, data.len())?;
        assert!(data.len() <= PAGE_SIZE as usize);
        if let Some(e) = self.fail_program {
            return Err(e);
        }
        if !std::mem::take(&mut self.wel) {
            return Err(FlashError::WriteProtected);
        }
        let start = addr as usize;
        for (cell, &b) in self.mem[start..start + data.len()].iter_mut().zip(data) {
            *cell &= b;
        }
        self.programs += 1;
        Ok(())
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<(), FlashError> {
        check_range(self.capacity(), addr, buf.len())?;
        let start = addr as usize;
        buf.copy_from_slice(&self.mem[start..start + buf.len()]);
        Ok(())
    }
}

/// Board with scripted sensor values and keypresses
pub struct MockBoard {
    pub led: Option<bool>,
    /// Returned when `moisture_script` is empty
    pub moisture: [u16; 2],
    /// Consumed first, one value per read
    pub moisture_script: VecDeque<u16>,
    pub moisture_reads: usize,
    pub ads: [i16; 4],
    pub ads_fail: Option<u8>,
    pub i2c_devices: Vec<u8>,
    pub lcd: Vec<(u8, String)>,
    pub uptime: u32,
    /// Keypresses; with `rx` set, one is typed into the ring per idle poll
    pub keys: VecDeque<u8>,
    /// Console receive ring the key wait reads from
    pub rx: Option<&'static RxRing<64>>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            led: None,
            moisture: [2250, 1800],
            moisture_script: VecDeque::new(),
            moisture_reads: 0,
            ads: [1, -1, 2, -2],
            ads_fail: None,
            i2c_devices: vec![0x3E, 0x48],
            lcd: Vec::new(),
            uptime: 1000,
            keys: VecDeque::new(),
            rx: None,
        }
    }
}

impl Board for MockBoard {
    fn set_led(&mut self, on: bool) -> Result<(), HalError> {
        self.led = Some(on);
        Ok(())
    }

    fn read_moisture(&mut self, probe: Probe) -> Result<u16, HalError> {
        self.moisture_reads += 1;
        Ok(self
            .moisture_script
            .pop_front()
            .unwrap_or(self.moisture[probe.index()]))
    }

    fn i2c_probe(&mut self, addr: u8) -> bool {
        self.i2c_devices.contains(&addr)
    }

    fn read_ads(&mut self, channel: u8) -> Result<i16, HalError> {
        if self.ads_fail == Some(channel) {
            return Err(HalError::I2cError);
        }
        Ok(self.ads[channel as usize])
    }

    fn lcd_write(&mut self, line: u8, text: &str) -> Result<(), HalError> {
        self.lcd.push((line, text.to_string()));
        Ok(())
    }

    fn uptime_ms(&mut self) -> u32 {
        self.uptime
    }

    fn wait_for_key(&mut self) -> Result<u8, HalError> {
        let Some(rx) = self.rx else {
            return self.keys.pop_front().ok_or(HalError::Timeout);
        };

        let keys = &mut self.keys;
        rx.wait_key(200, 50, |_| {
            if let Some(key) = keys.pop_front() {
                rx.push(key);
            }
        })
        .ok_or(HalError::Timeout)
    }
}

// Test output buffer
pub struct TestOutput {
    buf: Vec<u8>,
}

impl TestOutput {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf).unwrap_or("")
    }

    pub fn contains(&self, s: &str) -> bool {
        self.as_str().contains(s)
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl core::fmt::Write for TestOutput {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }
}
