//! SoilLogger - Main entry point
//!
//! 1. Bring up SPI flash, I2C, moisture ADC, LED and the console UART
//! 2. Start the UART receive thread feeding [`RX_RING`]
//! 3. Poll loop: feed received bytes to the console, refresh the LCD,
//!    drain diagnostics

#[cfg(target_os = "espidf")]
mod firmware {
    use core::fmt::{self, Write};

    use esp_idf_svc::hal::adc::attenuation::DB_11;
    use esp_idf_svc::hal::adc::oneshot::config::AdcChannelConfig;
    use esp_idf_svc::hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
    use esp_idf_svc::hal::delay::{Delay, FreeRtos, BLOCK};
    use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Output, PinDriver};
    use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::prelude::*;
    use esp_idf_svc::hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriverConfig};
    use esp_idf_svc::hal::uart::{config::Config as UartConfig, UartDriver, UartTxDriver};

    use soil_logger::config::{CONFIG, MAX_COMMANDS, RX_RING_SIZE};
    use soil_logger::console::{register_builtins, Console, Dispatcher, RingBufferReceiver, RxRing, Station};
    use soil_logger::flash::SpiNorFlash;
    use soil_logger::hal::{Ads1115, Board, HalError, Probe, St7032};
    use soil_logger::log_store::LogStore;
    use soil_logger::logging::timestamp_us;
    use soil_logger::{diag_debug, diag_info, diag_warn, uart_logger, DIAG_STREAM};

    /// Bytes from the console UART, filled by the receive thread
    static RX_RING: RxRing<RX_RING_SIZE> = RxRing::new();

    type MoistureReader = Box<dyn FnMut(Probe) -> Result<u16, HalError>>;

    /// Console UART transmit side as a `fmt::Write` sink
    struct UartOut(UartTxDriver<'static>);

    impl Write for UartOut {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let mut bytes = s.as_bytes();
            while !bytes.is_empty() {
                let n = self.0.write(bytes).map_err(|_| fmt::Error)?;
                bytes = &bytes[n..];
            }
            Ok(())
        }
    }

    /// Board peripherals on the ESP32
    struct EspBoard {
        led: PinDriver<'static, AnyOutputPin, Output>,
        i2c: I2cDriver<'static>,
        delay: Delay,
        ads: Ads1115,
        lcd: St7032,
        moisture: MoistureReader,
    }

    impl Board for EspBoard {
        fn set_led(&mut self, on: bool) -> Result<(), HalError> {
            let result = if on { self.led.set_high() } else { self.led.set_low() };
            result.map_err(|_| HalError::GpioError)
        }

        fn read_moisture(&mut self, probe: Probe) -> Result<u16, HalError> {
            (self.moisture)(probe)
        }

        fn i2c_probe(&mut self, addr: u8) -> bool {
            embedded_hal::i2c::I2c::write(&mut self.i2c, addr, &[]).is_ok()
        }

        fn read_ads(&mut self, channel: u8) -> Result<i16, HalError> {
            self.ads.read_channel(&mut self.i2c, &mut self.delay, channel)
        }

        fn lcd_write(&mut self, line: u8, text: &str) -> Result<(), HalError> {
            self.lcd.set_cursor(&mut self.i2c, line, 0)?;
            self.lcd.write_str(&mut self.i2c, text)
        }

        fn uptime_ms(&mut self) -> u32 {
            (timestamp_us() / 1000) as u32
        }

        fn wait_for_key(&mut self) -> Result<u8, HalError> {
            RX_RING
                .wait_key(CONFIG.key_wait_timeout_ms, CONFIG.console_poll_ms, FreeRtos::delay_ms)
                .ok_or(HalError::Timeout)
        }
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        esp_idf_svc::sys::link_patches();

        let peripherals = Peripherals::take()?;

        // SAFETY: Pin numbers come from CONFIG and each is claimed once.
        let pin = |n: i32| unsafe { AnyIOPin::new(n) };

        // Console UART
        let uart_config = UartConfig::default().baudrate(Hertz(CONFIG.uart.baud_rate));
        let uart = UartDriver::new(
            peripherals.uart0,
            pin(CONFIG.uart.tx),
            pin(CONFIG.uart.rx),
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &uart_config,
        )?;
        let (tx, rx) = uart.into_split();
        let mut out = UartOut(tx);

        std::thread::Builder::new()
            .stack_size(4096)
            .spawn(move || {
                let mut buf = [0u8; 32];
                loop {
                    match rx.read(&mut buf, BLOCK) {
                        Ok(n) => RX_RING.push_slice(&buf[..n]),
                        Err(_) => FreeRtos::delay_ms(CONFIG.console_poll_ms),
                    }
                }
            })?;

        // SPI NOR flash
        let spi_config = SpiConfig::new()
            .baudrate(Hertz(CONFIG.spi.baud_hz))
            .data_mode(embedded_hal::spi::MODE_0);
        let spi = SpiDeviceDriver::new_single(
            peripherals.spi2,
            pin(CONFIG.spi.sclk),
            pin(CONFIG.spi.mosi),
            Some(pin(CONFIG.spi.miso)),
            Some(pin(CONFIG.spi.cs)),
            &SpiDriverConfig::new(),
            &spi_config,
        )?;
        let flash = SpiNorFlash::new(spi, Delay::new_default(), CONFIG.flash_total_size);
        let log = LogStore::new(flash, CONFIG.log_region_size);

        // I2C bus: ADS1115 + ST7032 LCD
        let i2c_config = I2cConfig::new().baudrate(Hertz(CONFIG.i2c.baud_hz));
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            pin(CONFIG.i2c.sda),
            pin(CONFIG.i2c.scl),
            &i2c_config,
        )?;

        // Moisture probes on ADC1
        let adc: &'static AdcDriver<'static, _> = Box::leak(Box::new(AdcDriver::new(peripherals.adc1)?));
        let adc_config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        #[cfg(not(feature = "esp32c3"))]
        let (m1_pin, m2_pin) = (peripherals.pins.gpio4, peripherals.pins.gpio5);
        #[cfg(feature = "esp32c3")]
        let (m1_pin, m2_pin) = (peripherals.pins.gpio0, peripherals.pins.gpio1);
        let mut m1 = AdcChannelDriver::new(adc, m1_pin, &adc_config)?;
        let mut m2 = AdcChannelDriver::new(adc, m2_pin, &adc_config)?;
        let moisture: MoistureReader = Box::new(move |probe| {
            let raw = match probe {
                Probe::M1 => adc.read(&mut m1),
                Probe::M2 => adc.read(&mut m2),
            };
            raw.map_err(|_| HalError::AdcError)
        });

        // SAFETY: LED pin number comes from CONFIG and is claimed once.
        let led = PinDriver::output(unsafe { AnyOutputPin::new(CONFIG.led_pin) })?;

        let mut board = EspBoard {
            led,
            i2c,
            delay: Delay::new_default(),
            ads: Ads1115::new(CONFIG.ads1115_addr),
            lcd: St7032::new(CONFIG.st7032_addr),
            moisture,
        };

        if let Err(e) = board.lcd.init(&mut board.i2c, &mut board.delay) {
            diag_warn!("LCD init failed: {}", e);
        }

        let mut station = Station::new(log, board);
        match station.log.device_mut().jedec_id() {
            Ok(id) => diag_info!("flash ID {}", id),
            Err(e) => diag_warn!("flash not responding: {}", e),
        }

        let mut dispatcher: Dispatcher<_, MAX_COMMANDS> = Dispatcher::new();
        if let Err(e) = register_builtins(&mut dispatcher) {
            diag_warn!("command registration incomplete: {}", e);
        }
        let mut console = Console::new(dispatcher);
        let mut receiver = RingBufferReceiver::new(&RX_RING);

        console.print_banner(&mut out);

        loop {
            receiver.poll(|byte| {
                let _ = console.process_byte(byte, &mut station, &mut out);
            });
            if let Err(e) = station.poll_display() {
                diag_debug!("LCD refresh failed: {}", e);
            }
            uart_logger::drain_to(&DIAG_STREAM, &mut out);
            FreeRtos::delay_ms(CONFIG.console_poll_ms);
        }
    }
}

#[cfg(target_os = "espidf")]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    println!("soil-logger: firmware image, build for an ESP-IDF target to run it");
}
