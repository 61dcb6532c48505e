//! Command history with ring buffer
//!
//! Static allocation, `N` entries of one line each.

use crate::config::{HISTORY_SIZE, LINE_SIZE};

/// Command history ring buffer
pub struct History<const N: usize = HISTORY_SIZE> {
    /// Ring buffer of command lines
    entries: [[u8; LINE_SIZE]; N],
    /// Length of each entry
    lengths: [usize; N],
    /// Write index (next slot to write)
    write_idx: usize,
    /// Number of valid entries
    count: usize,
    /// Current navigation position (0 = newest, count-1 = oldest)
    nav_pos: Option<usize>,
}

impl<const N: usize> History<N> {
    /// Create empty history
    pub const fn new() -> Self {
        assert!(N > 0, "History needs at least one entry");

        Self {
            entries: [[0u8; LINE_SIZE]; N],
            lengths: [0; N],
            write_idx: 0,
            count: 0,
            nav_pos: None,
        }
    }

    /// Push a new command into history
    ///
    /// Empty lines are ignored. Once full, the oldest entry is overwritten.
    pub fn push(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        let bytes = line.as_bytes();
        let len = bytes.len().min(LINE_SIZE);

        self.entries[self.write_idx][..len].copy_from_slice(&bytes[..len]);
        self.lengths[self.write_idx] = len;

        self.write_idx = (self.write_idx + 1) % N;
        self.count = (self.count + 1).min(N);
        self.nav_pos = None; // Reset navigation
    }

    /// Entry `steps_back` positions older than the newest (0 = newest)
    ///
    /// `None` once past the number of stored entries.
    pub fn navigate(&self, steps_back: usize) -> Option<&str> {
        if steps_back >= self.count {
            return None;
        }

        // write_idx points to next write slot, so newest is at write_idx - 1
        let idx = (self.write_idx + N - 1 - steps_back) % N;
        let len = self.lengths[idx];

        core::str::from_utf8(&self.entries[idx][..len]).ok()
    }

    /// Step one entry older, stopping at the oldest
    pub fn get_prev(&mut self) -> Option<&str> {
        if self.count == 0 {
            return None;
        }

        let pos = match self.nav_pos {
            None => 0,                              // Start at newest
            Some(p) if p + 1 < self.count => p + 1, // Go older
            Some(p) => p,                           // Already at oldest
        };

        self.nav_pos = Some(pos);
        self.navigate(pos)
    }

    /// Reset navigation
    pub fn reset_nav(&mut self) {
        self.nav_pos = None;
    }

    /// Current navigation position, `None` when not browsing
    pub fn nav_pos(&self) -> Option<usize> {
        self.nav_pos
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl<const N: usize> Default for History<N> {
    fn default() -> Self {
        Self::new()
    }
}
