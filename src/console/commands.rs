//! Command handlers
//!
//! Every built-in command runs against a [`Station`]: the flash log plus the
//! board collaborators and the per-probe calibration.

use core::fmt::Write;

use super::dispatcher::{CommandEntry, Dispatcher, Invocation};
use super::ConsoleError;
use crate::config::{CONFIG, LINE_SIZE, PAGE_SIZE, SECTOR_SIZE};
use crate::flash::{FlashDevice, ERASED_BYTE};
use crate::hal::{ads1115, i2c_scan, moisture_pct, st7032, Board, Calibration, HalError, Probe};
use crate::log_store::{LogRecord, LogStore};
use crate::{diag_info, diag_warn};

/// Command context: everything the built-in handlers touch
pub struct Station<F, B> {
    /// Flash record log (also gives raw device access)
    pub log: LogStore<F>,
    /// Board peripherals
    pub board: B,
    /// Per-probe calibration, indexed by [`Probe::index`]
    pub calibration: [Calibration; 2],
    /// Sector used by `ftest`
    pub scratch_addr: u32,
    /// Last ADS1115 values shown on the LCD
    pub display: [i16; 4],
    /// Uptime of the last LCD refresh
    display_at: Option<u32>,
}

impl<F: FlashDevice, B: Board> Station<F, B> {
    /// Create station with default calibration
    pub fn new(log: LogStore<F>, board: B) -> Self {
        Self {
            log,
            board,
            calibration: [CONFIG.default_calibration; 2],
            scratch_addr: CONFIG.scratch_sector_addr,
            display: [0; 4],
            display_at: None,
        }
    }

    /// Calibration of `probe`
    pub fn calibration(&self, probe: Probe) -> Calibration {
        self.calibration[probe.index()]
    }

    /// Sample every sensor into one record stamped with uptime
    ///
    /// Moisture read failures abort; a failed ADS channel logs as 0.
    pub fn sample(&mut self) -> Result<LogRecord, ConsoleError> {
        let timestamp_ms = self.board.uptime_ms();
        let sensor_a = self.board.read_moisture(Probe::M1)?;
        let sensor_b = self.board.read_moisture(Probe::M2)?;

        let mut aux = [0i16; 4];
        for (ch, slot) in (0..ads1115::CHANNELS).zip(aux.iter_mut()) {
            match self.board.read_ads(ch) {
                Ok(v) => *slot = v,
                Err(e) => diag_warn!("ADS CH{} read failed: {}", ch, e),
            }
        }

        Ok(LogRecord {
            timestamp_ms,
            sensor_a,
            sensor_b,
            aux,
        })
    }

    /// Refresh the LCD once `CONFIG.display_refresh_ms` has passed since
    /// the previous refresh. Returns whether the display was rewritten.
    pub fn poll_display(&mut self) -> Result<bool, HalError> {
        let now = self.board.uptime_ms();
        if let Some(last) = self.display_at {
            if now.wrapping_sub(last) < CONFIG.display_refresh_ms {
                return Ok(false);
            }
        }
        self.display_at = Some(now);
        self.refresh_display()?;
        Ok(true)
    }

    /// Sample the four ADS1115 channels and show them as
    /// `0:a 1:b` / `2:c 3:d`. A failed channel keeps its last value.
    pub fn refresh_display(&mut self) -> Result<(), HalError> {
        for (ch, slot) in (0..ads1115::CHANNELS).zip(self.display.iter_mut()) {
            if let Ok(v) = self.board.read_ads(ch) {
                *slot = v;
            }
        }

        let [a, b, c, d] = self.display;
        for (row, (lo, hi)) in [(a, b), (c, d)].into_iter().enumerate() {
            let mut text: heapless::String<LINE_SIZE> = heapless::String::new();
            let first = row * 2;
            let _ = write!(text, "{}:{} {}:{}", first, lo, first + 1, hi);
            // Overwrite what the previous, longer line left behind
            while text.len() < st7032::COLUMNS as usize {
                let _ = text.push(' ');
            }
            self.board.lcd_write(row as u8, &text)?;
        }
        Ok(())
    }
}

/// Built-in command table
pub fn builtin_commands<F: FlashDevice, B: Board>() -> [CommandEntry<Station<F, B>>; 13] {
    [
        CommandEntry { name: "help", help: "Show command list", handler: cmd_help::<F, B> },
        CommandEntry { name: "led", help: "led on|off - Control LED", handler: cmd_led::<F, B> },
        CommandEntry { name: "read", help: "read M1|M2 - Read moisture sensor", handler: cmd_read::<F, B> },
        CommandEntry { name: "i2c", help: "i2c scan - Scan I2C bus", handler: cmd_i2c::<F, B> },
        CommandEntry { name: "ads", help: "Read all ADS1115 inputs", handler: cmd_ads::<F, B> },
        CommandEntry { name: "lcd", help: "lcd write <line> <text>", handler: cmd_lcd::<F, B> },
        CommandEntry { name: "flash", help: "flash id - Read JEDEC ID", handler: cmd_flash::<F, B> },
        CommandEntry { name: "ftest", help: "Erase/program/verify scratch sector", handler: cmd_ftest::<F, B> },
        CommandEntry { name: "ftestfull", help: "Test whole log region (erases log)", handler: cmd_ftestfull::<F, B> },
        CommandEntry { name: "logtest", help: "Sample sensors and append a record", handler: cmd_logtest::<F, B> },
        CommandEntry { name: "logindex", help: "Show records written", handler: cmd_logindex::<F, B> },
        CommandEntry { name: "logdump", help: "logdump <N|all> - Dump records", handler: cmd_logdump::<F, B> },
        CommandEntry { name: "moistcal", help: "moistcal 1|2|both - Calibrate probes", handler: cmd_moistcal::<F, B> },
    ]
}

/// Register every built-in command
pub fn register_builtins<F: FlashDevice, B: Board, const N: usize>(
    dispatcher: &mut Dispatcher<Station<F, B>, N>,
) -> Result<(), ConsoleError> {
    dispatcher.register_all(&builtin_commands::<F, B>())
}

// --- Command Implementations ---

type Call<'a, 'l, F, B> = Invocation<'a, 'l, Station<F, B>>;

fn cmd_help<F: FlashDevice, B: Board>(
    _ctx: &mut Station<F, B>,
    call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    for c in call.commands() {
        let _ = write!(out, "  {:<10} {}\r\n", c.name, c.help);
    }
    Ok(())
}

fn cmd_led<F: FlashDevice, B: Board>(
    ctx: &mut Station<F, B>,
    call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let on = match call.arg(0) {
        Some("on") => true,
        Some("off") => false,
        _ => return Err(ConsoleError::Usage("led on|off")),
    };

    ctx.board.set_led(on)?;
    let _ = write!(out, "LED {}\r\n", if on { "ON" } else { "OFF" });
    Ok(())
}

fn cmd_read<F: FlashDevice, B: Board>(
    ctx: &mut Station<F, B>,
    call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let name = call.arg(0).ok_or(ConsoleError::Usage("read M1|M2"))?;
    let probe = Probe::from_name(name).ok_or(ConsoleError::InvalidArgument)?;

    let raw = ctx.board.read_moisture(probe)?;
    let pct = moisture_pct(raw, ctx.calibration(probe));
    let _ = write!(out, "MCU ADC {}: {} ({}%)\r\n", probe.name(), raw, pct);
    Ok(())
}

fn cmd_i2c<F: FlashDevice, B: Board>(
    ctx: &mut Station<F, B>,
    call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    if call.arg(0) != Some("scan") {
        return Err(ConsoleError::Usage("i2c scan"));
    }

    let board = &mut ctx.board;
    let found = i2c_scan::scan(|addr| board.i2c_probe(addr), out);
    let _ = write!(out, "{} device(s) found\r\n", found);
    Ok(())
}

fn cmd_ads<F: FlashDevice, B: Board>(
    ctx: &mut Station<F, B>,
    _call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    for ch in 0..ads1115::CHANNELS {
        match ctx.board.read_ads(ch) {
            Ok(value) => {
                let _ = write!(out, "ADS CH{}: {}\r\n", ch, value);
            }
            Err(e) => diag_warn!("ADS CH{} read failed: {}", ch, e),
        }
    }
    Ok(())
}

fn cmd_lcd<F: FlashDevice, B: Board>(
    ctx: &mut Station<F, B>,
    call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    const USAGE: ConsoleError = ConsoleError::Usage("lcd write <line> <text>");

    if call.argc() < 4 || call.arg(0) != Some("write") {
        return Err(USAGE);
    }

    // Any number is accepted; rows other than 0 and 1 fall back to 0
    let line: i64 = call
        .arg(1)
        .ok_or(USAGE)?
        .parse()
        .map_err(|_| ConsoleError::InvalidArgument)?;
    let line = if line == 1 { 1 } else { 0 };

    let mut text: heapless::String<LINE_SIZE> = heapless::String::new();
    for (i, word) in call.args().iter().skip(2).enumerate() {
        if i > 0 {
            let _ = text.push(' ');
        }
        let _ = text.push_str(word);
    }

    ctx.board.lcd_write(line, &text)?;
    let _ = write!(out, "LCD write OK\r\n");
    Ok(())
}

fn cmd_flash<F: FlashDevice, B: Board>(
    ctx: &mut Station<F, B>,
    call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    if call.arg(0) != Some("id") {
        return Err(ConsoleError::Usage("flash id"));
    }

    let id = ctx.log.device_mut().jedec_id()?;
    let _ = write!(out, "Flash ID: {}\r\n", id);
    Ok(())
}

/// Test pattern byte for absolute address `addr`
fn pattern_byte(addr: u32) -> u8 {
    ((addr ^ (addr >> 8)) as u8) ^ 0x5A
}

/// Erase, check blank, program every page with the pattern, verify.
fn test_sector<D: FlashDevice>(dev: &mut D, sector: u32) -> Result<(), ConsoleError> {
    dev.write_enable()?;
    dev.sector_erase(sector)?;

    let mut page = [0u8; PAGE_SIZE as usize];
    for page_addr in (sector..sector + SECTOR_SIZE).step_by(PAGE_SIZE as usize) {
        dev.read(page_addr, &mut page)?;
        if page.iter().any(|&b| b != ERASED_BYTE) {
            diag_warn!("sector {:#07x} not blank after erase", sector);
            return Err(ConsoleError::VerifyFailed);
        }

        for (offset, byte) in (page_addr..).zip(page.iter_mut()) {
            *byte = pattern_byte(offset);
        }
        dev.write_enable()?;
        dev.page_program(page_addr, &page)?;

        page.fill(0);
        dev.read(page_addr, &mut page)?;
        if (page_addr..).zip(page.iter()).any(|(a, &b)| b != pattern_byte(a)) {
            diag_warn!("page {:#07x} verify mismatch", page_addr);
            return Err(ConsoleError::VerifyFailed);
        }
    }
    Ok(())
}

/// Erase `sector` and program `saved` back, skipping blank pages
fn restore_sector<D: FlashDevice>(dev: &mut D, sector: u32, saved: &[u8]) -> Result<(), ConsoleError> {
    dev.write_enable()?;
    dev.sector_erase(sector)?;

    for (page_addr, page) in (sector..)
        .step_by(PAGE_SIZE as usize)
        .zip(saved.chunks(PAGE_SIZE as usize))
    {
        if page.iter().all(|&b| b == ERASED_BYTE) {
            continue;
        }
        dev.write_enable()?;
        dev.page_program(page_addr, page)?;
    }
    Ok(())
}

/// Erase every sector below `end`, carrying on past failures
fn erase_sectors<D: FlashDevice>(dev: &mut D, end: u32) -> Result<(), ConsoleError> {
    let mut first_err = None;
    for sector in (0..end).step_by(SECTOR_SIZE as usize) {
        if let Err(e) = dev.write_enable().and_then(|()| dev.sector_erase(sector)) {
            diag_warn!("sector {:#07x} erase failed: {}", sector, e);
            first_err.get_or_insert(e);
        }
    }
    first_err.map_or(Ok(()), |e| Err(e.into()))
}

fn cmd_ftest<F: FlashDevice, B: Board>(
    ctx: &mut Station<F, B>,
    _call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let sector = ctx.scratch_addr;
    let _ = write!(out, "ftest: sector {:#07x}\r\n", sector);

    // Scratch sector may hold records; they go back afterwards
    let dev = ctx.log.device_mut();
    let mut saved = [0u8; SECTOR_SIZE as usize];
    let result = match dev.read(sector, &mut saved) {
        Ok(()) => {
            let tested = test_sector(dev, sector);
            let restored = restore_sector(dev, sector, &saved);
            tested.and(restored)
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        let _ = write!(out, "ftest: FAIL\r\n");
        return Err(e);
    }

    let _ = write!(out, "ftest: PASS\r\n");
    Ok(())
}

fn cmd_ftestfull<F: FlashDevice, B: Board>(
    ctx: &mut Station<F, B>,
    _call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let region = ctx.log.region_size();
    let sectors = region / SECTOR_SIZE;
    let _ = write!(out, "ftestfull: {} sectors, log will be erased\r\n", sectors);

    let dev = ctx.log.device_mut();
    let mut failure = None;
    for sector in (0..region).step_by(SECTOR_SIZE as usize) {
        if let Err(e) = test_sector(dev, sector) {
            failure = Some((sector, e));
            break;
        }
        let _ = write!(out, "  sector {:#07x} OK\r\n", sector);
    }

    // Every sector up to the failing one may hold pattern bytes
    let touched = failure.as_ref().map_or(region, |(sector, _)| sector + SECTOR_SIZE);
    let wiped = erase_sectors(dev, touched);
    ctx.log.reset();

    if let Some((sector, e)) = failure {
        let _ = write!(out, "ftestfull: FAIL at sector {:#07x}\r\n", sector);
        return Err(e);
    }
    wiped?;

    diag_info!("ftestfull passed, log region blank");
    let _ = write!(out, "ftestfull: PASS\r\n");
    Ok(())
}

fn cmd_logtest<F: FlashDevice, B: Board>(
    ctx: &mut Station<F, B>,
    _call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let record = ctx.sample()?;
    let index = ctx.log.append(&record)?;
    let _ = write!(out, "Logged #{}: {}\r\n", index, record);
    Ok(())
}

fn cmd_logindex<F: FlashDevice, B: Board>(
    ctx: &mut Station<F, B>,
    _call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let _ = write!(
        out,
        "Log index: {} / {} records\r\n",
        ctx.log.count(),
        ctx.log.capacity()
    );
    Ok(())
}

fn cmd_logdump<F: FlashDevice, B: Board>(
    ctx: &mut Station<F, B>,
    call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let count = match call.arg(0) {
        None => return Err(ConsoleError::Usage("logdump <N|all>")),
        Some("all") => ctx.log.count(),
        Some(n) => n
            .parse::<u32>()
            .map_err(|_| ConsoleError::InvalidArgument)?
            .min(ctx.log.capacity()),
    };

    if count == 0 {
        let _ = write!(out, "Log empty\r\n");
        return Ok(());
    }

    for index in 0..count {
        let record = ctx.log.read(index)?;
        let _ = write!(out, "#{:04} {}\r\n", index, record);
    }
    Ok(())
}

fn cmd_moistcal<F: FlashDevice, B: Board>(
    ctx: &mut Station<F, B>,
    call: &Call<'_, '_, F, B>,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let probes: &[Probe] = match call.arg(0) {
        None => return Err(ConsoleError::Usage("moistcal 1|2|both")),
        Some("1") => &[Probe::M1],
        Some("2") => &[Probe::M2],
        Some("both") => &Probe::ALL,
        Some(_) => return Err(ConsoleError::InvalidArgument),
    };

    for &probe in probes {
        let _ = write!(out, "{}: place probe in DRY soil, press any key\r\n", probe.name());
        ctx.board.wait_for_key()?;
        let dry = ctx.board.read_moisture(probe)?;
        let _ = write!(out, "  dry = {}\r\n", dry);

        let _ = write!(out, "{}: place probe in WET soil, press any key\r\n", probe.name());
        ctx.board.wait_for_key()?;
        let wet = ctx.board.read_moisture(probe)?;
        let _ = write!(out, "  wet = {}\r\n", wet);

        let cal = Calibration { dry, wet };
        if !cal.is_valid() {
            let _ = write!(out, "{}: rejected, dry must read above wet\r\n", probe.name());
            continue;
        }

        ctx.calibration[probe.index()] = cal;
        diag_info!("{} calibrated dry={} wet={}", probe.name(), dry, wet);
        let _ = write!(out, "{} calibrated: dry={} wet={}\r\n", probe.name(), dry, wet);
    }
    Ok(())
}
