//! # Graphics Commands
//!
//! Raster images (`ESC GS S`) and stored NV logos (`ESC GS ( L`).
//!
//! Raster data is packed 1-bit, MSB = leftmost dot, 1 = black, one row of
//! `ceil(width / 8)` bytes after another.

use super::commands::{ESC, GS, u16_le};
use crate::bitmap::Raster;
use crate::command::LogoSize;

/// # Print Raster Image (ESC GS S m xL xH yL yH n data)
///
/// | Field | Meaning |
/// |-------|---------|
/// | m | 1 (monochrome) |
/// | xL xH | width in bytes |
/// | yL yH | height in rows |
/// | n | 0 (black) |
pub fn raster(width_dots: u16, height: u16, data: &[u8]) -> Vec<u8> {
    let width_bytes = width_dots.div_ceil(8);
    let [xl, xh] = u16_le(width_bytes);
    let [yl, yh] = u16_le(height);

    let mut cmd = Vec::with_capacity(9 + data.len());
    cmd.extend_from_slice(&[ESC, GS, b'S', 1, xl, xh, yl, yh, 0]);
    cmd.extend_from_slice(data);
    cmd
}

/// Raster commands for a full image, split every `max_rows` rows so each
/// command fits in small device receive buffers.
pub fn raster_chunked(image: &Raster, max_rows: u16) -> Vec<u8> {
    let max_rows = max_rows.max(1) as usize;
    let row_bytes = image.width_dots.div_ceil(8) as usize;
    if row_bytes == 0 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(image.data.len() + 9 * (image.height as usize / max_rows + 1));
    for chunk in image.data.chunks(row_bytes * max_rows) {
        let rows = (chunk.len() / row_bytes) as u16;
        out.extend(raster(image.width_dots, rows, chunk));
    }
    out
}

/// Validate a 2-character NV logo key (printable ASCII 32-126).
pub fn logo_key(key: &str) -> Option<(u8, u8)> {
    match key.as_bytes() {
        &[a, b] if (32..=126).contains(&a) && (32..=126).contains(&b) => Some((a, b)),
        _ => None,
    }
}

/// # Print NV Logo (ESC GS ( L 6 0 48 69 kc1 kc2 x y)
///
/// Returns `None` if the key is not 2 printable ASCII characters.
pub fn print_logo(key: &str, size: LogoSize) -> Option<Vec<u8>> {
    let (kc1, kc2) = logo_key(key)?;
    let (x, y) = size.scale();
    Some(vec![ESC, GS, b'(', b'L', 6, 0, 48, 69, kc1, kc2, x, y])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_header() {
        let data = vec![0xFF; 72 * 2];
        let cmd = raster(576, 2, &data);
        assert_eq!(&cmd[..9], &[0x1B, 0x1D, b'S', 1, 72, 0, 2, 0, 0]);
        assert_eq!(cmd.len(), 9 + 144);
    }

    #[test]
    fn test_raster_chunked() {
        let image = Raster {
            width_dots: 16,
            height: 5,
            data: vec![0xAA; 2 * 5],
        };
        let out = raster_chunked(&image, 2);
        // 2 + 2 + 1 rows
        assert_eq!(out.len(), 3 * 9 + 10);
        assert_eq!(&out[..9], &[0x1B, 0x1D, b'S', 1, 2, 0, 2, 0, 0]);
        assert_eq!(&out[out.len() - 11..out.len() - 2], &[0x1B, 0x1D, b'S', 1, 2, 0, 1, 0, 0]);
    }

    #[test]
    fn test_print_logo() {
        assert_eq!(
            print_logo("A1", LogoSize::DoubleWidth),
            Some(vec![0x1B, 0x1D, b'(', b'L', 6, 0, 48, 69, b'A', b'1', 2, 1])
        );
        assert_eq!(print_logo("ABC", LogoSize::Normal), None);
        assert_eq!(print_logo("A\n", LogoSize::Normal), None);
    }
}
