//! Line buffer for console input

use super::ConsoleError;
use crate::config::LINE_SIZE;

/// Line input buffer
///
/// Holds at most `N - 1` characters; the last slot is never filled.
pub struct LineBuffer<const N: usize = LINE_SIZE> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> LineBuffer<N> {
    /// Longest line the buffer accepts
    pub const CAPACITY: usize = N - 1;

    /// Create empty buffer
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            len: 0,
        }
    }

    /// Push a character
    ///
    /// Fails with [`ConsoleError::LineFull`] and leaves the buffer untouched
    /// once `CAPACITY` characters are stored.
    pub fn push(&mut self, c: u8) -> Result<(), ConsoleError> {
        if self.len >= Self::CAPACITY {
            return Err(ConsoleError::LineFull);
        }
        self.buf[self.len] = c;
        self.len += 1;
        Ok(())
    }

    /// Remove last character; returns false if the buffer was empty
    pub fn backspace(&mut self) -> bool {
        if self.len > 0 {
            self.len -= 1;
            true
        } else {
            false
        }
    }

    /// Clear buffer
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Set buffer contents from string, cut at `CAPACITY`
    pub fn set(&mut self, s: &str) {
        let bytes = s.as_bytes();
        let copy_len = bytes.len().min(Self::CAPACITY);
        self.buf[..copy_len].copy_from_slice(&bytes[..copy_len]);
        self.len = copy_len;
    }

    /// Get buffer as string slice
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    /// Get buffer length
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if no more characters fit
    pub fn is_full(&self) -> bool {
        self.len >= Self::CAPACITY
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
