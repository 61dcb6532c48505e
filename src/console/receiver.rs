//! Console receive ring and its poll-driven drain.
//!
//! SPSC: the UART receive path is the only producer and only ever moves the
//! write cursor; the console context is the only consumer and only ever
//! moves the read cursor. Both cursors stay in `0..N`.
//!
//! # Overrun
//!
//! The producer never checks for room. If it gets `N` or more bytes ahead of
//! the consumer, the oldest unread bytes are overwritten and the unread count
//! wraps; nothing detects this. The poll period must keep up with the line
//! rate.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::config::RX_RING_SIZE;

/// Byte ring filled by the receive path
pub struct RxRing<const N: usize = RX_RING_SIZE> {
    buf: UnsafeCell<[u8; N]>,
    write_idx: AtomicUsize,
    read_idx: AtomicUsize,
}

// SAFETY: Single producer writes only the slot at write_idx before
// publishing it; single consumer reads only published slots.
unsafe impl<const N: usize> Sync for RxRing<N> {}
unsafe impl<const N: usize> Send for RxRing<N> {}

impl<const N: usize> RxRing<N> {
    /// Create empty ring
    pub const fn new() -> Self {
        assert!(N > 1, "RX ring needs at least two slots");

        Self {
            buf: UnsafeCell::new([0u8; N]),
            write_idx: AtomicUsize::new(0),
            read_idx: AtomicUsize::new(0),
        }
    }

    /// Store one received byte (producer side, never blocks)
    #[inline]
    pub fn push(&self, byte: u8) {
        let write = self.write_idx.load(Ordering::Relaxed);

        // SAFETY: Only the producer touches the slot at write_idx.
        unsafe {
            (*self.buf.get())[write] = byte;
        }

        self.write_idx.store((write + 1) % N, Ordering::Release);
    }

    /// Store a run of received bytes (producer side)
    pub fn push_slice(&self, bytes: &[u8]) {
        for &b in bytes {
            self.push(b);
        }
    }

    /// Bytes available to the consumer: `(write - read) mod N`
    #[inline]
    pub fn unread(&self) -> usize {
        let write = self.write_idx.load(Ordering::Acquire);
        let read = self.read_idx.load(Ordering::Relaxed);
        (write + N - read) % N
    }

    /// Take the oldest unread byte (consumer side)
    #[inline]
    pub fn pop(&self) -> Option<u8> {
        if self.unread() == 0 {
            return None;
        }

        let read = self.read_idx.load(Ordering::Relaxed);

        // SAFETY: Slot was published by the producer's Release store.
        let byte = unsafe { (*self.buf.get())[read] };

        self.read_idx.store((read + 1) % N, Ordering::Release);
        Some(byte)
    }

    /// Drop every unread byte (consumer side)
    pub fn discard(&self) {
        let write = self.write_idx.load(Ordering::Acquire);
        self.read_idx.store(write, Ordering::Release);
    }

    /// Wait for a key typed after this call (consumer side)
    ///
    /// Bytes already queued belong to the line that started the wait and are
    /// dropped. A `\n` never counts as a key, so the LF half of a CRLF line
    /// end arriving late does not answer the prompt either. `sleep` is called
    /// with `poll_ms` between empty polls. `None` once `timeout_ms` has passed.
    pub fn wait_key(&self, timeout_ms: u32, poll_ms: u32, mut sleep: impl FnMut(u32)) -> Option<u8> {
        self.discard();

        let step = poll_ms.max(1);
        let mut waited = 0;
        loop {
            while let Some(byte) = self.pop() {
                if byte != b'\n' {
                    return Some(byte);
                }
            }
            if waited >= timeout_ms {
                return None;
            }
            sleep(poll_ms);
            waited += step;
        }
    }
}

impl<const N: usize> Default for RxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll-driven consumer of an [`RxRing`]
pub struct RingBufferReceiver<'a, const N: usize = RX_RING_SIZE> {
    ring: &'a RxRing<N>,
}

impl<'a, const N: usize> RingBufferReceiver<'a, N> {
    pub fn new(ring: &'a RxRing<N>) -> Self {
        Self { ring }
    }

    /// Feed every byte available at the start of this poll, in arrival order
    ///
    /// Bytes arriving during the poll wait for the next one.
    /// Returns the number of bytes fed.
    pub fn poll(&mut self, mut feed: impl FnMut(u8)) -> usize {
        let available = self.ring.unread();
        let mut fed = 0;

        for _ in 0..available {
            // A handler may have consumed bytes itself (e.g. a keypress wait)
            let Some(byte) = self.ring.pop() else {
                break;
            };
            feed(byte);
            fed += 1;
        }

        fed
    }

    /// Underlying ring
    pub fn ring(&self) -> &'a RxRing<N> {
        self.ring
    }
}
