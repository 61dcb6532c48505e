//! Global diagnostic log stream.
//!
//! Every producer (console, log store, drivers) writes here; the poll loop
//! drains it to the console UART between input polls.

use crate::logging::LogStream;

/// Diagnostic log stream shared by the whole firmware.
pub static DIAG_STREAM: LogStream = LogStream::new();
