//! # StarPRNT Control Commands
//!
//! Printer reset, paper movement, cutter, cash drawer and status request.
//!
//! ## Escape Sequence Structure
//!
//! - Single byte: `LF`, `BEL`, `SUB`
//! - Two bytes: `ESC @`
//! - With parameters: `ESC d n`, `ESC J n`, `ESC GS A nL nH`
//!
//! Multi-byte integers are little-endian: `0x1234` is sent as `[0x34, 0x12]`.

use crate::command::{CutType, DrawerChannel, MAX_FEED_MM};

/// ESC (Escape), command prefix
pub const ESC: u8 = 0x1B;

/// GS (Group Separator), extended command prefix used after ESC
pub const GS: u8 = 0x1D;

/// RS (Record Separator), configuration prefix and barcode terminator
pub const RS: u8 = 0x1E;

/// LF (Line Feed), print the line buffer and advance one line
pub const LF: u8 = 0x0A;

/// BEL, drive external device 1 (cash drawer 1)
pub const BEL: u8 = 0x07;

/// SUB, drive external device 2 (cash drawer 2)
pub const SUB: u8 = 0x1A;

/// ACK
pub const ACK: u8 = 0x06;

/// SOH
pub const SOH: u8 = 0x01;

/// # Initialize Printer (ESC @)
///
/// Clears the print buffer and resets text formatting, size, alignment and
/// line spacing to their power-on defaults.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC @ |
/// | Hex    | 1B 40 |
///
/// ```
/// use starbridge::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

/// # Cut Paper (ESC d n)
///
/// | n | Action |
/// |---|--------|
/// | 0 | Full cut at current position |
/// | 1 | Partial cut at current position |
/// | 2 | Feed to cut position, then full cut |
/// | 3 | Feed to cut position, then partial cut |
///
/// Any data in the line buffer is printed first.
pub fn cut(cut: CutType) -> Vec<u8> {
    let n = match cut {
        CutType::Full => 0,
        CutType::Partial => 1,
        CutType::FullWithFeed => 2,
        CutType::PartialWithFeed => 3,
    };
    vec![ESC, b'd', n]
}

/// # Feed Paper in 1/4mm Units (ESC J n)
///
/// `n = 4` feeds 1mm; `n = 255` feeds 63.75mm, the maximum for one command.
#[inline]
pub fn feed_units(n: u8) -> Vec<u8> {
    vec![ESC, b'J', n]
}

/// Feed paper by millimetres.
///
/// Amounts beyond one command's range are split into several `ESC J`
/// commands.
///
/// ```
/// use starbridge::protocol::commands;
///
/// assert_eq!(commands::feed_mm(5.0), vec![0x1B, 0x4A, 20]);
/// ```
pub fn feed_mm(mm: f64) -> Vec<u8> {
    let mut units = (mm * 4.0).round().clamp(0.0, MAX_FEED_MM * 4.0) as u32;
    let mut out = Vec::new();
    while units > 0 {
        let step = units.min(255);
        out.extend(feed_units(step as u8));
        units -= step;
    }
    out
}

/// Feed `n` lines at the current line spacing (ESC a n).
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'a', n]
}

/// Pulse a cash drawer output.
#[inline]
pub fn open_drawer(channel: DrawerChannel) -> Vec<u8> {
    match channel {
        DrawerChannel::No1 => vec![BEL],
        DrawerChannel::No2 => vec![SUB],
    }
}

/// Move the print position to `dots` from the left margin (ESC GS A nL nH).
pub fn absolute_position(dots: u16) -> Vec<u8> {
    let [nl, nh] = u16_le(dots);
    vec![ESC, GS, b'A', nl, nh]
}

/// Move the print position by `dots` (ESC GS R nL nH). Negative values move
/// left and are sent in two's complement.
pub fn relative_position(dots: i16) -> Vec<u8> {
    let [nl, nh] = dots.to_le_bytes();
    vec![ESC, GS, b'R', nl, nh]
}

/// # Request Automatic Status (ESC ACK SOH)
///
/// The printer answers with one ASB frame, see [`super::status::parse_asb`].
#[inline]
pub fn status_request() -> Vec<u8> {
    vec![ESC, ACK, SOH]
}

/// Encode a u16 value as little-endian bytes `[low, high]`.
///
/// ```
/// use starbridge::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(576), [0x40, 0x02]);
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}
