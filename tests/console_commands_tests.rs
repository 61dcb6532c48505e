//! Command handler tests

mod common;

use common::{MockBoard, RamFlash, TestOutput};
use soil_logger::config::{CONFIG, SECTOR_SIZE};
use soil_logger::console::{
    builtin_commands, register_builtins, Console, ConsoleError, Dispatcher, RingBufferReceiver, RxRing, Station,
};
use soil_logger::flash::FlashError;
use soil_logger::hal::{Calibration, HalError};
use soil_logger::log_store::{LogError, LogRecord, LogStore};

type TestStation = Station<RamFlash, MockBoard>;

fn station() -> TestStation {
    let log = LogStore::new(RamFlash::new(CONFIG.flash_total_size), CONFIG.log_region_size);
    Station::new(log, MockBoard::new())
}

fn dispatcher() -> Dispatcher<TestStation> {
    let mut d: Dispatcher<TestStation> = Dispatcher::new();
    register_builtins(&mut d).unwrap();
    d
}

fn run(station: &mut TestStation, line: &str) -> (Result<(), ConsoleError>, TestOutput) {
    let mut output = TestOutput::new();
    let result = dispatcher().dispatch(station, line, &mut output);
    (result, output)
}

#[test]
fn test_command_registry_has_all_commands() {
    let expected = [
        "help", "led", "read", "i2c", "ads", "lcd", "flash", "ftest", "ftestfull", "logtest",
        "logindex", "logdump", "moistcal",
    ];

    let d = dispatcher();
    for name in expected {
        assert!(d.find(name).is_some(), "Command '{}' should be in registry", name);
    }
    assert_eq!(d.commands().len(), expected.len());
}

#[test]
fn test_register_fails_when_table_full() {
    let mut d: Dispatcher<TestStation, 10> = Dispatcher::new();

    assert_eq!(register_builtins(&mut d), Err(ConsoleError::TableFull));
    assert_eq!(d.commands().len(), 10);
    assert!(d.find("logtest").is_none());
}

#[test]
fn test_first_registration_wins() {
    let mut d: Dispatcher<TestStation> = Dispatcher::new();
    let cmds = builtin_commands::<RamFlash, MockBoard>();
    let led = cmds.iter().find(|c| c.name == "led").unwrap();
    let help = cmds.iter().find(|c| c.name == "help").unwrap();

    d.register(*help).unwrap();
    d.register(soil_logger::console::CommandEntry { name: "help", ..*led }).unwrap();

    let mut st = station();
    let mut output = TestOutput::new();
    d.dispatch(&mut st, "help", &mut output).unwrap();
    assert!(output.contains("Show command list"));
}

#[test]
fn test_execute_unknown_command() {
    let (result, _) = run(&mut station(), "foobar");
    assert_eq!(result, Err(ConsoleError::UnknownCommand));
}

#[test]
fn test_execute_empty_line() {
    let (result, output) = run(&mut station(), "   ");
    assert_eq!(result, Ok(()));
    assert_eq!(output.as_str(), "");
}

#[test]
fn test_execute_help() {
    let (result, output) = run(&mut station(), "help");

    assert!(result.is_ok());
    assert!(output.contains("help"));
    assert!(output.contains("logdump"));
    assert!(output.contains("moistcal"));
}

#[test]
fn test_led_on_off() {
    let mut st = station();

    let (result, output) = run(&mut st, "led on");
    assert!(result.is_ok());
    assert!(output.contains("LED ON"));
    assert_eq!(st.board.led, Some(true));

    let (_, output) = run(&mut st, "led off");
    assert!(output.contains("LED OFF"));
    assert_eq!(st.board.led, Some(false));
}

#[test]
fn test_led_requires_state() {
    let mut st = station();
    let (result, _) = run(&mut st, "led");

    assert_eq!(result, Err(ConsoleError::Usage("led on|off")));
    assert_eq!(st.board.led, None);
}

#[test]
fn test_read_without_probe_is_usage_error() {
    let mut st = station();
    let (result, _) = run(&mut st, "read");

    assert_eq!(result, Err(ConsoleError::Usage("read M1|M2")));
    assert_eq!(result.unwrap_err().to_string(), "E03: usage: read M1|M2");
    assert_eq!(st.board.moisture_reads, 0);
}

#[test]
fn test_read_unknown_probe() {
    let mut st = station();
    let (result, _) = run(&mut st, "read M3");

    assert_eq!(result, Err(ConsoleError::InvalidArgument));
    assert_eq!(st.board.moisture_reads, 0);
}

#[test]
fn test_read_reports_raw_and_percent() {
    let mut st = station();
    let (result, output) = run(&mut st, "read M1");

    assert!(result.is_ok());
    // 2250 is halfway between dry 3000 and wet 1500
    assert!(output.contains("MCU ADC M1: 2250 (50%)"));
    assert_eq!(st.board.moisture_reads, 1);
}

#[test]
fn test_i2c_scan() {
    let (result, output) = run(&mut station(), "i2c scan");

    assert!(result.is_ok());
    assert!(output.contains(" 3E"));
    assert!(output.contains(" 48"));
    assert!(output.contains("2 device(s) found"));
}

#[test]
fn test_ads_reads_all_channels() {
    let mut st = station();
    st.board.ads_fail = Some(2);
    let (result, output) = run(&mut st, "ads");

    assert!(result.is_ok());
    assert!(output.contains("ADS CH0: 1"));
    assert!(output.contains("ADS CH1: -1"));
    assert!(!output.contains("ADS CH2"));
    assert!(output.contains("ADS CH3: -2"));
}

#[test]
fn test_lcd_write_joins_text() {
    let mut st = station();
    let (result, output) = run(&mut st, "lcd write 1 hello world");

    assert!(result.is_ok());
    assert!(output.contains("LCD write OK"));
    assert_eq!(st.board.lcd, vec![(1, "hello world".to_string())]);
}

#[test]
fn test_lcd_out_of_range_line_falls_back_to_first() {
    let mut st = station();
    run(&mut st, "lcd write 300 x").0.unwrap();
    run(&mut st, "lcd write -1 y").0.unwrap();
    run(&mut st, "lcd write 1 z").0.unwrap();

    assert_eq!(
        st.board.lcd,
        vec![(0, "x".to_string()), (0, "y".to_string()), (1, "z".to_string())]
    );
}

#[test]
fn test_lcd_non_numeric_line() {
    let mut st = station();
    let (result, _) = run(&mut st, "lcd write top x");

    assert_eq!(result, Err(ConsoleError::InvalidArgument));
    assert!(st.board.lcd.is_empty());
}

#[test]
fn test_lcd_requires_text() {
    let (result, _) = run(&mut station(), "lcd write 0");
    assert_eq!(result, Err(ConsoleError::Usage("lcd write <line> <text>")));
}

#[test]
fn test_flash_id() {
    let (result, output) = run(&mut station(), "flash id");

    assert!(result.is_ok());
    assert!(output.contains("Flash ID: C8 40 10"));
}

#[test]
fn test_logtest_appends_record() {
    let mut st = station();
    let (result, output) = run(&mut st, "logtest");

    assert!(result.is_ok());
    assert!(output.contains("Logged #0: t=1000ms M1=2250 M2=1800 ADS=1,-1,2,-2"));
    assert_eq!(st.log.count(), 1);

    let rec = st.log.read(0).unwrap();
    assert_eq!(rec.sensor_a, 2250);
    assert_eq!(rec.sensor_b, 1800);
}

#[test]
fn test_logtest_logs_zero_for_failed_ads_channel() {
    let mut st = station();
    st.board.ads_fail = Some(1);
    run(&mut st, "logtest").0.unwrap();

    assert_eq!(st.log.read(0).unwrap().aux, [1, 0, 2, -2]);
}

#[test]
fn test_logtest_reports_flash_failure() {
    let mut st = station();
    st.log.device_mut().fail_program = Some(FlashError::Timeout);
    let (result, _) = run(&mut st, "logtest");

    assert_eq!(result, Err(ConsoleError::Log(LogError::Device(FlashError::Timeout))));
    assert_eq!(st.log.count(), 0);
}

#[test]
fn test_logindex() {
    let mut st = station();
    run(&mut st, "logtest").0.unwrap();
    run(&mut st, "logtest").0.unwrap();

    let (_, output) = run(&mut st, "logindex");
    assert!(output.contains("Log index: 2 / 4096 records"));
}

#[test]
fn test_logdump_all_empty() {
    let (result, output) = run(&mut station(), "logdump all");

    assert!(result.is_ok());
    assert!(output.contains("Log empty"));
}

#[test]
fn test_logdump_all_shows_written_records() {
    let mut st = station();
    run(&mut st, "logtest").0.unwrap();
    st.board.uptime = 2000;
    run(&mut st, "logtest").0.unwrap();

    let (_, output) = run(&mut st, "logdump all");
    assert!(output.contains("#0000 t=1000ms"));
    assert!(output.contains("#0001 t=2000ms"));
    assert!(!output.contains("#0002"));
}

#[test]
fn test_logdump_count_reads_past_index() {
    let mut st = station();
    run(&mut st, "logtest").0.unwrap();

    let (result, output) = run(&mut st, "logdump 3");
    assert!(result.is_ok());
    assert!(output.contains("#0000 t=1000ms"));
    assert!(output.contains("#0002"));
}

#[test]
fn test_logdump_argument_errors() {
    let (result, _) = run(&mut station(), "logdump");
    assert_eq!(result, Err(ConsoleError::Usage("logdump <N|all>")));

    let (result, _) = run(&mut station(), "logdump many");
    assert_eq!(result, Err(ConsoleError::InvalidArgument));
}

#[test]
fn test_ftest_leaves_log_intact() {
    let mut st = station();
    run(&mut st, "logtest").0.unwrap();
    let before = st.log.read(0).unwrap();

    let (result, output) = run(&mut st, "ftest");
    assert!(result.is_ok());
    assert!(output.contains("ftest: PASS"));

    assert_eq!(st.log.read(0).unwrap(), before);
    assert_eq!(st.log.count(), 1);
    assert!(st.log.device_mut().is_blank(CONFIG.scratch_sector_addr, 4096));
}

#[test]
fn test_ftest_restores_records_in_scratch_sector() {
    let mut st = station();
    let scratch = CONFIG.scratch_sector_addr;
    let old = LogRecord {
        timestamp_ms: 77,
        sensor_a: 2100,
        sensor_b: 1900,
        aux: [4, 3, 2, 1],
    };
    // Left by an earlier session in the last sector of the log
    let flash = st.log.device_mut();
    flash.mem[scratch as usize..][..16].copy_from_slice(&old.to_bytes());
    let before = flash.mem.clone();

    let (result, output) = run(&mut st, "ftest");
    assert!(result.is_ok());
    assert!(output.contains("ftest: PASS"));

    assert_eq!(st.log.device_mut().mem, before);
    assert_eq!(st.log.read(scratch / 16), Ok(old));
}

#[test]
fn test_ftest_reports_erase_failure() {
    let mut st = station();
    st.log.device_mut().fail_erase = Some(FlashError::Timeout);
    let (result, output) = run(&mut st, "ftest");

    assert_eq!(result, Err(ConsoleError::Flash(FlashError::Timeout)));
    assert!(output.contains("ftest: FAIL"));
    assert!(!output.contains("PASS"));
}

#[test]
fn test_ftestfull_erases_log() {
    let mut st = station();
    run(&mut st, "logtest").0.unwrap();
    run(&mut st, "logtest").0.unwrap();

    let (result, output) = run(&mut st, "ftestfull");
    assert!(result.is_ok());
    assert!(output.contains("ftestfull: PASS"));

    assert_eq!(st.log.count(), 0);
    assert!(st.log.device_mut().is_blank(0, CONFIG.log_region_size));

    // Log is usable again from index 0
    let (_, output) = run(&mut st, "logtest");
    assert!(output.contains("Logged #0"));
}

#[test]
fn test_ftestfull_failure_still_resets_log() {
    let mut st = station();
    run(&mut st, "logtest").0.unwrap();
    run(&mut st, "logtest").0.unwrap();
    st.log.device_mut().fail_erase_at = Some(SECTOR_SIZE);

    let (result, output) = run(&mut st, "ftestfull");
    assert_eq!(result, Err(ConsoleError::Flash(FlashError::Timeout)));
    assert!(output.contains("sector 0x00000 OK"));
    assert!(output.contains("ftestfull: FAIL at sector 0x01000"));

    // Pattern left in sector 0 is gone and the log starts over
    assert_eq!(st.log.count(), 0);
    assert!(st.log.device_mut().is_blank(0, SECTOR_SIZE));

    st.board.uptime = 5000;
    let (result, output) = run(&mut st, "logtest");
    assert!(result.is_ok());
    assert!(output.contains("Logged #0: t=5000ms M1=2250 M2=1800 ADS=1,-1,2,-2"));
    assert_eq!(
        st.log.read(0),
        Ok(LogRecord {
            timestamp_ms: 5000,
            sensor_a: 2250,
            sensor_b: 1800,
            aux: [1, -1, 2, -2],
        })
    );
}

#[test]
fn test_display_shows_ads_channels() {
    let mut st = station();
    st.refresh_display().unwrap();

    assert_eq!(
        st.board.lcd,
        vec![(0, "0:1 1:-1        ".to_string()), (1, "2:2 3:-2        ".to_string())]
    );
}

#[test]
fn test_display_keeps_last_value_of_failed_channel() {
    let mut st = station();
    st.refresh_display().unwrap();

    st.board.ads = [10, 20, 30, 40];
    st.board.ads_fail = Some(3);
    st.board.lcd.clear();
    st.refresh_display().unwrap();

    assert_eq!(st.display, [10, 20, 30, -2]);
    assert_eq!(st.board.lcd[1].1.trim_end(), "2:30 3:-2");
}

#[test]
fn test_display_refresh_period() {
    let mut st = station();

    assert_eq!(st.poll_display(), Ok(true));
    assert_eq!(st.board.lcd.len(), 2);

    st.board.uptime += CONFIG.display_refresh_ms - 1;
    assert_eq!(st.poll_display(), Ok(false));
    assert_eq!(st.board.lcd.len(), 2);

    st.board.uptime += 1;
    assert_eq!(st.poll_display(), Ok(true));
    assert_eq!(st.board.lcd.len(), 4);
}

/// Feed `input` through a receive ring into a console over `st`
fn type_into_console(st: &mut TestStation, input: &[u8]) -> TestOutput {
    let ring: &'static RxRing<64> = Box::leak(Box::new(RxRing::new()));
    st.board.rx = Some(ring);
    ring.push_slice(input);

    let mut console: Console<TestStation> = Console::new(dispatcher());
    let mut rx = RingBufferReceiver::new(ring);
    let mut out = TestOutput::new();
    rx.poll(|b| {
        let _ = console.process_byte(b, st, &mut out);
    });
    out
}

#[test]
fn test_moistcal_crlf_line_end_is_not_a_keypress() {
    let mut st = station();
    let out = type_into_console(&mut st, b"moistcal 1\r\n");

    assert!(out.contains("press any key"));
    assert!(out.contains("E08: timeout"));
    assert_eq!(st.board.moisture_reads, 0);
    assert_eq!(st.calibration[0], CONFIG.default_calibration);
}

#[test]
fn test_moistcal_over_receive_ring() {
    let mut st = station();
    st.board.keys.extend([b' ', b'\r']);
    st.board.moisture_script.extend([3100, 1400]);

    let out = type_into_console(&mut st, b"moistcal 1\r\n");
    assert!(out.contains("M1 calibrated: dry=3100 wet=1400"));
    assert_eq!(st.board.moisture_reads, 2);
}

#[test]
fn test_moistcal_single_probe() {
    let mut st = station();
    st.board.keys.extend([b' ', b' ']);
    st.board.moisture_script.extend([3100, 1400]);

    let (result, output) = run(&mut st, "moistcal 1");
    assert!(result.is_ok());
    assert!(output.contains("M1 calibrated: dry=3100 wet=1400"));
    assert_eq!(st.calibration[0], Calibration { dry: 3100, wet: 1400 });
    assert_eq!(st.calibration[1], CONFIG.default_calibration);
}

#[test]
fn test_moistcal_both_probes() {
    let mut st = station();
    st.board.keys.extend([b'x'; 4]);
    st.board.moisture_script.extend([3100, 1400, 3300, 1200]);

    run(&mut st, "moistcal both").0.unwrap();
    assert_eq!(st.calibration[0], Calibration { dry: 3100, wet: 1400 });
    assert_eq!(st.calibration[1], Calibration { dry: 3300, wet: 1200 });
}

#[test]
fn test_moistcal_rejects_inverted_readings() {
    let mut st = station();
    st.board.keys.extend([b' ', b' ']);
    st.board.moisture_script.extend([1000, 2000]);

    let (result, output) = run(&mut st, "moistcal 2");
    assert!(result.is_ok());
    assert!(output.contains("rejected"));
    assert_eq!(st.calibration[1], CONFIG.default_calibration);
}

#[test]
fn test_moistcal_times_out_without_key() {
    let mut st = station();
    let (result, _) = run(&mut st, "moistcal 1");

    assert_eq!(result, Err(ConsoleError::Hal(HalError::Timeout)));
    assert_eq!(st.board.moisture_reads, 0);
}

#[test]
fn test_moistcal_argument_errors() {
    let (result, _) = run(&mut station(), "moistcal");
    assert_eq!(result, Err(ConsoleError::Usage("moistcal 1|2|both")));

    let (result, _) = run(&mut station(), "moistcal 3");
    assert_eq!(result, Err(ConsoleError::InvalidArgument));
}
