//! Diagnostic log output on the console UART.
//!
//! The poll loop drains [`DIAG_STREAM`](crate::DIAG_STREAM) between console
//! polls, so diagnostics interleave with console output but never block a
//! producer.
//!
//! # Output Format
//!
//! ```text
//! [timestamp_us] LEVEL: message\r\n
//! ```

use core::fmt::Write;

use crate::logging::{LogEntry, LogStream};

/// Write one formatted log entry.
pub fn write_log_entry(out: &mut dyn Write, entry: &LogEntry) {
    let _ = write!(
        out,
        "[{:10}] {}: {}\r\n",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.message()
    );
}

/// Drain every pending entry of `stream` into `out`.
///
/// Reports and resets the dropped counter when messages were lost.
/// Returns the number of entries written.
pub fn drain_to<const N: usize>(stream: &LogStream<N>, out: &mut dyn Write) -> usize {
    let mut written = 0;

    while let Some(entry) = stream.drain() {
        write_log_entry(out, &entry);
        written += 1;
    }

    let dropped = stream.dropped();
    if dropped > 0 {
        let _ = write!(out, "[WARN] Dropped: {} log messages\r\n", dropped);
        stream.reset_dropped();
    }

    written
}
