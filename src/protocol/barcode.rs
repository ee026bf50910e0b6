//! # Barcode Commands
//!
//! | Kind | Command |
//! |------|---------|
//! | 1D | `ESC b n1 n2 n3 n4 data RS` |
//! | QR Code | `ESC GS y S ...`, `ESC GS y D ...`, `ESC GS y P` |
//! | PDF417 | `ESC GS x S ...`, `ESC GS x D ...`, `ESC GS x P` |
//!
//! 2-D codes are configured first, then the data is stored, then printed.

use super::commands::{ESC, GS, RS, u16_le};

/// 1D barcodes (ESC b).
pub mod barcode1d {
    use super::{ESC, RS};
    use crate::command::{BarcodeParams, BarcodeSymbology};

    /// Module width selector used for every 1D code (mode byte `48 + n`).
    const MODULE_WIDTH: u8 = 2;

    /// `n1` type code for a symbology.
    pub fn type_code(symbology: BarcodeSymbology) -> u8 {
        match symbology {
            BarcodeSymbology::UpcE => 48,
            BarcodeSymbology::UpcA => 49,
            BarcodeSymbology::Jan8 => 50,
            BarcodeSymbology::Jan13 => 51,
            BarcodeSymbology::Code39 => 52,
            BarcodeSymbology::Itf => 53,
            BarcodeSymbology::Code128 => 54,
            BarcodeSymbology::Code93 => 55,
            BarcodeSymbology::Nw7 => 56,
        }
    }

    /// # Print 1D Barcode (ESC b n1 n2 n3 n4 data RS)
    ///
    /// - `n1`: symbology
    /// - `n2`: `'1'` no HRI, `'2'` HRI under the bars (both with line feed)
    /// - `n3`: mode, `48 + module width`
    /// - `n4`: height in dots
    pub fn barcode(params: &BarcodeParams) -> Vec<u8> {
        let n2 = if params.print_hri { b'2' } else { b'1' };
        let mut cmd = Vec::with_capacity(7 + params.data.len());
        cmd.extend_from_slice(&[
            ESC,
            b'b',
            type_code(params.symbology),
            n2,
            48 + MODULE_WIDTH,
            params.height.max(1),
        ]);
        cmd.extend_from_slice(params.data.as_bytes());
        cmd.push(RS);
        cmd
    }
}

/// QR Code (ESC GS y).
pub mod qr {
    use super::{ESC, GS, u16_le};
    use crate::command::{QrLevel, QrParams};

    /// Model 2 (versions 1-40).
    pub fn set_model2() -> Vec<u8> {
        vec![ESC, GS, b'y', b'S', b'0', 2]
    }

    pub fn set_error_correction(level: QrLevel) -> Vec<u8> {
        let n = match level {
            QrLevel::L => 0,
            QrLevel::M => 1,
            QrLevel::Q => 2,
            QrLevel::H => 3,
        };
        vec![ESC, GS, b'y', b'S', b'1', n]
    }

    /// Cell size in dots, 1-8.
    pub fn set_cell_size(size: u8) -> Vec<u8> {
        vec![ESC, GS, b'y', b'S', b'2', size.clamp(1, 8)]
    }

    /// Store data with automatic analysis (`ESC GS y D 1 0 nL nH data`).
    pub fn set_data(data: &[u8]) -> Vec<u8> {
        let data = &data[..data.len().min(u16::MAX as usize)];
        let [nl, nh] = u16_le(data.len() as u16);
        let mut cmd = vec![ESC, GS, b'y', b'D', b'1', 0, nl, nh];
        cmd.extend_from_slice(data);
        cmd
    }

    pub fn print() -> Vec<u8> {
        vec![ESC, GS, b'y', b'P']
    }

    /// Full sequence for one QR code.
    pub fn generate(params: &QrParams) -> Vec<u8> {
        let mut cmd = Vec::new();
        cmd.extend(set_model2());
        cmd.extend(set_error_correction(params.level));
        cmd.extend(set_cell_size(params.cell_size));
        cmd.extend(set_data(params.data.as_bytes()));
        cmd.extend(print());
        cmd
    }
}

/// PDF417 (ESC GS x).
pub mod pdf417 {
    use super::{ESC, GS, u16_le};
    use crate::command::Pdf417Params;

    /// Security level used for every code.
    const ECC_LEVEL: u8 = 1;

    /// Fixed rows and columns (`ESC GS x S 0 1 rows cols`); 0 lets the
    /// printer choose.
    pub fn set_size_fixed(rows: u8, columns: u8) -> Vec<u8> {
        let r = if rows == 0 { 0 } else { rows.clamp(3, 90) };
        let c = if columns == 0 { 0 } else { columns.clamp(1, 30) };
        vec![ESC, GS, b'x', b'S', b'0', 1, r, c]
    }

    pub fn set_ecc_level(level: u8) -> Vec<u8> {
        vec![ESC, GS, b'x', b'S', b'1', level.min(8)]
    }

    pub fn set_module_width(width: u8) -> Vec<u8> {
        vec![ESC, GS, b'x', b'S', b'2', width.clamp(1, 10)]
    }

    pub fn set_module_aspect(aspect: u8) -> Vec<u8> {
        vec![ESC, GS, b'x', b'S', b'3', aspect.clamp(1, 10)]
    }

    pub fn set_data(data: &[u8]) -> Vec<u8> {
        let data = &data[..data.len().min(u16::MAX as usize)];
        let [nl, nh] = u16_le(data.len() as u16);
        let mut cmd = vec![ESC, GS, b'x', b'D', nl, nh];
        cmd.extend_from_slice(data);
        cmd
    }

    pub fn print() -> Vec<u8> {
        vec![ESC, GS, b'x', b'P']
    }

    pub fn generate(params: &Pdf417Params) -> Vec<u8> {
        let mut cmd = Vec::new();
        cmd.extend(set_size_fixed(params.line, params.column));
        cmd.extend(set_ecc_level(ECC_LEVEL));
        cmd.extend(set_module_width(params.module));
        cmd.extend(set_module_aspect(params.aspect));
        cmd.extend(set_data(params.data.as_bytes()));
        cmd.extend(print());
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{BarcodeParams, BarcodeSymbology, Pdf417Params, QrLevel, QrParams};

    #[test]
    fn test_2d_data_header_matches_payload() {
        let data = vec![b'x'; 70_000];
        let cmd = qr::set_data(&data);
        assert_eq!(&cmd[6..8], &[0xFF, 0xFF]);
        assert_eq!(cmd.len(), 8 + 65_535);
        let cmd = pdf417::set_data(&data);
        assert_eq!(&cmd[4..6], &[0xFF, 0xFF]);
        assert_eq!(cmd.len(), 6 + 65_535);
    }

    #[test]
    fn test_barcode_defaults() {
        let cmd = barcode1d::barcode(&BarcodeParams::new("123"));
        assert_eq!(cmd, vec![0x1B, b'b', 54, b'1', 50, 40, b'1', b'2', b'3', 0x1E]);
    }

    #[test]
    fn test_barcode_with_hri() {
        let mut params = BarcodeParams::new("4901234567894");
        params.symbology = BarcodeSymbology::Jan13;
        params.print_hri = true;
        let cmd = barcode1d::barcode(&params);
        assert_eq!(&cmd[..4], &[0x1B, b'b', 51, b'2']);
        assert_eq!(*cmd.last().unwrap(), 0x1E);
    }

    #[test]
    fn test_qr_sequence() {
        let mut params = QrParams::new("hi");
        params.level = QrLevel::Q;
        let cmd = qr::generate(&params);
        let expected: Vec<u8> = [
            qr::set_model2(),
            vec![0x1B, 0x1D, b'y', b'S', b'1', 2],
            vec![0x1B, 0x1D, b'y', b'S', b'2', 8],
            vec![0x1B, 0x1D, b'y', b'D', b'1', 0, 2, 0, b'h', b'i'],
            vec![0x1B, 0x1D, b'y', b'P'],
        ]
        .concat();
        assert_eq!(cmd, expected);
    }

    #[test]
    fn test_pdf417_sequence() {
        let cmd = pdf417::generate(&Pdf417Params::new("ab"));
        let expected: Vec<u8> = [
            vec![0x1B, 0x1D, b'x', b'S', b'0', 1, 0, 0],
            vec![0x1B, 0x1D, b'x', b'S', b'1', 1],
            vec![0x1B, 0x1D, b'x', b'S', b'2', 2],
            vec![0x1B, 0x1D, b'x', b'S', b'3', 3],
            vec![0x1B, 0x1D, b'x', b'D', 2, 0, b'a', b'b'],
            vec![0x1B, 0x1D, b'x', b'P'],
        ]
        .concat();
        assert_eq!(cmd, expected);
    }
}
