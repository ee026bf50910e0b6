//! # Text Formatting Commands
//!
//! Alignment, font, emphasis, character size, spacing and character
//! encoding. All of these persist until changed or until `ESC @`.
//!
//! | Command | Bytes |
//! |---------|-------|
//! | Alignment | `ESC GS a n` |
//! | Font | `ESC RS F n` |
//! | Bold on/off | `ESC E` / `ESC F` |
//! | Underline | `ESC - n` |
//! | Invert on/off | `ESC 4` / `ESC 5` |
//! | Size | `ESC i h w` (0-based multipliers) |
//! | Character space | `ESC SP n` (dots) |
//! | Line space | `ESC 3 n` (1/4mm) |
//! | Code page | `ESC GS t n` |
//! | Unicode mode | `ESC GS ) U pL pH fn m` |

use encoding_rs::{Encoding, IBM866, WINDOWS_1252};

use super::commands::{ESC, GS, RS};
use crate::command::{Alignment, Charset, FontStyle, Magnification};

/// # Set Alignment (ESC GS a n)
///
/// | n | Alignment |
/// |---|-----------|
/// | 0 | Left |
/// | 1 | Center |
/// | 2 | Right |
///
/// ```
/// use starbridge::command::Alignment;
/// use starbridge::protocol::text;
///
/// assert_eq!(text::align(Alignment::Center), vec![0x1B, 0x1D, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    let n = match alignment {
        Alignment::Left => 0,
        Alignment::Center => 1,
        Alignment::Right => 2,
    };
    vec![ESC, GS, b'a', n]
}

/// Select font A (12×24) or B (9×24).
pub fn font(font: FontStyle) -> Vec<u8> {
    let n = match font {
        FontStyle::A => 0,
        FontStyle::B => 1,
    };
    vec![ESC, RS, b'F', n]
}

pub fn bold(enabled: bool) -> Vec<u8> {
    if enabled { vec![ESC, b'E'] } else { vec![ESC, b'F'] }
}

pub fn underline(enabled: bool) -> Vec<u8> {
    vec![ESC, b'-', enabled as u8]
}

/// White on black.
pub fn invert(enabled: bool) -> Vec<u8> {
    if enabled { vec![ESC, b'4'] } else { vec![ESC, b'5'] }
}

/// # Character Size (ESC i n1 n2)
///
/// `n1` is the height multiplier and `n2` the width multiplier, both
/// zero-based (`0` = 1×).
///
/// ```
/// use starbridge::command::Magnification;
/// use starbridge::protocol::text;
///
/// let big = Magnification::new(2, 3).unwrap();
/// assert_eq!(text::size(big), vec![0x1B, 0x69, 2, 1]);
/// ```
pub fn size(mag: Magnification) -> Vec<u8> {
    vec![
        ESC,
        b'i',
        mag.height.saturating_sub(1),
        mag.width.saturating_sub(1),
    ]
}

/// Extra right-side character spacing in dots (ESC SP n), 0-15.
pub fn character_space(dots: u16) -> Vec<u8> {
    vec![ESC, b' ', dots.min(15) as u8]
}

/// Line feed pitch in 1/4mm units (ESC 3 n).
pub fn line_space_units(units: u8) -> Vec<u8> {
    vec![ESC, b'3', units]
}

/// Line feed pitch in millimetres.
pub fn line_space_mm(mm: f64) -> Vec<u8> {
    line_space_units((mm * 4.0).round().clamp(0.0, 255.0) as u8)
}

/// Select the printer-side character set for `charset`.
///
/// UTF-8 switches the printer into Unicode mode; the single-byte charsets
/// select their code page (CP1252 = 32, CP866 = 9).
pub fn charset(charset: Charset) -> Vec<u8> {
    match charset {
        Charset::Utf8 => vec![ESC, GS, b')', b'U', 0x02, 0x00, 0x30, 0x01],
        Charset::Cp1252 => vec![ESC, GS, b't', 32],
        Charset::Cp866 => vec![ESC, GS, b't', 9],
    }
}

/// Convert text to bytes in `charset`. Characters the charset cannot
/// represent become `?`.
pub fn encode_text(charset: Charset, text: &str) -> Vec<u8> {
    match charset {
        Charset::Utf8 => text.as_bytes().to_vec(),
        Charset::Cp1252 => encode_single_byte(WINDOWS_1252, text),
        Charset::Cp866 => encode_single_byte(IBM866, text),
    }
}

fn encode_single_byte(encoding: &'static Encoding, text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let (bytes, _, had_errors) = encoding.encode(c.encode_utf8(&mut buf));
        if had_errors {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emphasis() {
        assert_eq!(bold(true), vec![0x1B, 0x45]);
        assert_eq!(bold(false), vec![0x1B, 0x46]);
        assert_eq!(underline(true), vec![0x1B, 0x2D, 1]);
        assert_eq!(invert(true), vec![0x1B, 0x34]);
        assert_eq!(invert(false), vec![0x1B, 0x35]);
    }

    #[test]
    fn test_font_and_size() {
        assert_eq!(font(FontStyle::B), vec![0x1B, 0x1E, 0x46, 0x01]);
        assert_eq!(size(Magnification::NORMAL), vec![0x1B, 0x69, 0, 0]);
    }

    #[test]
    fn test_spacing() {
        assert_eq!(character_space(40), vec![0x1B, 0x20, 15]);
        assert_eq!(line_space_mm(4.0), vec![0x1B, 0x33, 16]);
    }

    #[test]
    fn test_charset_selection() {
        assert_eq!(charset(Charset::Cp1252), vec![0x1B, 0x1D, 0x74, 32]);
        assert_eq!(charset(Charset::Cp866), vec![0x1B, 0x1D, 0x74, 9]);
    }

    #[test]
    fn test_encode_text() {
        assert_eq!(encode_text(Charset::Utf8, "é"), vec![0xC3, 0xA9]);
        assert_eq!(encode_text(Charset::Cp1252, "café €"), b"caf\xE9 \x80".to_vec());
        assert_eq!(encode_text(Charset::Cp866, "Да"), vec![0x84, 0xA0]);
        assert_eq!(encode_text(Charset::Cp1252, "Да"), b"??".to_vec());
    }
}
