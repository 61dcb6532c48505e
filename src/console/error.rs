//! Console error types

use crate::flash::FlashError;
use crate::hal::HalError;
use crate::log_store::LogError;

/// Console error with code and message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    /// E01: Unknown command
    UnknownCommand,
    /// E02: Argument present but not acceptable
    InvalidArgument,
    /// E03: Missing or malformed arguments; carries the usage line
    Usage(&'static str),
    /// E04: Line buffer full
    LineFull,
    /// E05: Command table full
    TableFull,
    /// E06: Log store error
    Log(LogError),
    /// E07: Raw flash error
    Flash(FlashError),
    /// E08: Peripheral error
    Hal(HalError),
    /// E09: Read-back did not match what was written
    VerifyFailed,
}

impl ConsoleError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownCommand => "E01",
            Self::InvalidArgument => "E02",
            Self::Usage(_) => "E03",
            Self::LineFull => "E04",
            Self::TableFull => "E05",
            Self::Log(_) => "E06",
            Self::Flash(_) => "E07",
            Self::Hal(_) => "E08",
            Self::VerifyFailed => "E09",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::UnknownCommand => "unknown command",
            Self::InvalidArgument => "invalid argument",
            Self::Usage(usage) => usage,
            Self::LineFull => "line full",
            Self::TableFull => "command table full",
            Self::Log(e) => e.message(),
            Self::Flash(e) => e.message(),
            Self::Hal(e) => e.message(),
            Self::VerifyFailed => "verify failed",
        }
    }
}

impl core::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Usage(usage) => write!(f, "{}: usage: {}", self.code(), usage),
            _ => write!(f, "{}: {}", self.code(), self.message()),
        }
    }
}

impl From<LogError> for ConsoleError {
    fn from(e: LogError) -> Self {
        ConsoleError::Log(e)
    }
}

impl From<FlashError> for ConsoleError {
    fn from(e: FlashError) -> Self {
        ConsoleError::Flash(e)
    }
}

impl From<HalError> for ConsoleError {
    fn from(e: HalError) -> Self {
        ConsoleError::Hal(e)
    }
}
