//! I2C bus scan rendered as the classic 8x16 address grid.

use core::fmt::Write;

/// First address probed; 0x00-0x02 are reserved
pub const FIRST_ADDR: u8 = 0x03;
/// Last address probed; 0x78-0x7F are reserved
pub const LAST_ADDR: u8 = 0x77;

/// Probe every valid 7-bit address and print the grid.
///
/// Returns how many devices answered.
pub fn scan(mut probe: impl FnMut(u8) -> bool, out: &mut dyn Write) -> usize {
    let mut found = 0;

    let _ = write!(out, "    ");
    for col in 0..16 {
        let _ = write!(out, " {:02X}", col);
    }
    let _ = write!(out, "\r\n");

    for row in 0..8u8 {
        let _ = write!(out, "0x{:02X}:", row << 4);
        for col in 0..16u8 {
            let addr = (row << 4) | col;
            if !(FIRST_ADDR..=LAST_ADDR).contains(&addr) {
                let _ = write!(out, "   ");
            } else if probe(addr) {
                found += 1;
                let _ = write!(out, " {:02X}", addr);
            } else {
                let _ = write!(out, " --");
            }
        }
        let _ = write!(out, "\r\n");
    }

    found
}
