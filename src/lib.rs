//! # SoilLogger
//!
//! Soil-moisture data logger with a serial diagnostic console.
//!
//! ## Architecture
//!
//! - [`log_store::LogStore`] appends fixed 16-byte records to raw SPI NOR
//!   flash through the [`flash::FlashDevice`] seam
//! - [`console::Console`] turns received bytes into edited lines and
//!   dispatches them against a [`console::Station`]
//! - [`console::RxRing`] decouples the UART receive path from the console
//! - Diagnostics go through the lock-free [`DIAG_STREAM`] and are drained
//!   to the UART by the main loop
//!
//! Every buffer is fixed-size. No heap.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod logging;
pub mod log_globals;
pub mod uart_logger;
pub mod flash;
pub mod log_store;
pub mod hal;
pub mod console;

pub use config::CONFIG;
pub use log_globals::DIAG_STREAM;
pub use logging::{LogLevel, LogStream};
pub use flash::{FlashDevice, FlashError, SpiNorFlash};
pub use log_store::{LogError, LogRecord, LogStore};
pub use hal::{Board, HalError};
pub use console::{Console, ConsoleError, Station};
