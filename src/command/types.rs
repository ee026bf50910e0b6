//! Command variants and their parameter types.
//!
//! One [`Command`] per print primitive. Parameter structs get their
//! documented defaults from their `new` constructors, so a caller that omits
//! a field gets exactly what existing clients of the plugin channel expect.

use serde::{Deserialize, Serialize};

use crate::bitmap::DecodedBitmap;

/// Default barcode height in dots.
pub const DEFAULT_BARCODE_HEIGHT: u8 = 40;

/// Default QR cell size in dots.
pub const DEFAULT_QR_CELL_SIZE: u8 = 8;

/// Default image width in dots (full width of 80mm paper).
pub const DEFAULT_IMAGE_WIDTH: u16 = 576;

/// Largest magnification factor in either direction.
pub const MAX_MAGNIFICATION: u8 = 6;

/// Longest single paper feed, in millimetres.
pub const MAX_FEED_MM: f64 = 255.0;

/// Longest QR or PDF417 payload in bytes (16-bit length field).
pub const MAX_CODE_DATA_LEN: usize = u16::MAX as usize;

/// Text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Character font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontStyle {
    /// 12×24 dots, 48 columns on 72mm
    #[default]
    A,
    /// 9×24 dots, 64 columns on 72mm
    B,
}

/// Character encoding used for text payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Charset {
    #[default]
    Utf8,
    /// Windows Latin-1
    Cp1252,
    /// Cyrillic
    Cp866,
}

impl Charset {
    /// Parse a charset name. Accepts the common spellings (`"utf-8"`, `"UTF8"`,
    /// `"windows-1252"`, `"cp866"`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace(['-', '_'], "").as_str() {
            "utf8" => Some(Charset::Utf8),
            "cp1252" | "windows1252" | "latin1" => Some(Charset::Cp1252),
            "cp866" | "ibm866" => Some(Charset::Cp866),
            _ => None,
        }
    }
}

/// Character magnification, 1..=6 in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Magnification {
    pub width: u8,
    pub height: u8,
}

impl Magnification {
    pub const NORMAL: Self = Self {
        width: 1,
        height: 1,
    };

    /// Validated constructor. Returns `None` when either factor is outside 1..=6.
    pub fn new(width: u8, height: u8) -> Option<Self> {
        let valid = 1..=MAX_MAGNIFICATION;
        if valid.contains(&width) && valid.contains(&height) {
            Some(Self { width, height })
        } else {
            None
        }
    }
}

impl Default for Magnification {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Paper cut mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CutType {
    #[default]
    Partial,
    Full,
    PartialWithFeed,
    FullWithFeed,
}

/// 1D barcode symbology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BarcodeSymbology {
    UpcE,
    UpcA,
    Jan8,
    Jan13,
    Code39,
    Itf,
    #[default]
    Code128,
    Code93,
    Nw7,
}

impl BarcodeSymbology {
    /// Parse a symbology name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "upce" => Some(Self::UpcE),
            "upca" => Some(Self::UpcA),
            "jan8" | "ean8" => Some(Self::Jan8),
            "jan13" | "ean13" => Some(Self::Jan13),
            "code39" => Some(Self::Code39),
            "itf" => Some(Self::Itf),
            "code128" => Some(Self::Code128),
            "code93" => Some(Self::Code93),
            "nw7" | "codabar" => Some(Self::Nw7),
            _ => None,
        }
    }
}

/// 1D barcode parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeParams {
    pub data: String,
    pub symbology: BarcodeSymbology,
    /// Bar height in dots (1-255)
    pub height: u8,
    /// Print the human readable interpretation under the bars
    pub print_hri: bool,
}

impl BarcodeParams {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            symbology: BarcodeSymbology::default(),
            height: DEFAULT_BARCODE_HEIGHT,
            print_hri: false,
        }
    }
}

/// QR code error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QrLevel {
    /// ~7% recovery
    #[default]
    L,
    /// ~15% recovery
    M,
    /// ~25% recovery
    Q,
    /// ~30% recovery
    H,
}

impl QrLevel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "l" => Some(Self::L),
            "m" => Some(Self::M),
            "q" => Some(Self::Q),
            "h" => Some(Self::H),
            _ => None,
        }
    }
}

/// QR code parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrParams {
    pub data: String,
    pub level: QrLevel,
    /// Cell size in dots
    pub cell_size: u8,
}

impl QrParams {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            level: QrLevel::default(),
            cell_size: DEFAULT_QR_CELL_SIZE,
        }
    }
}

/// PDF417 parameters. `column` and `line` of 0 let the printer choose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pdf417Params {
    pub data: String,
    pub column: u8,
    pub line: u8,
    /// Module width in dots
    pub module: u8,
    /// Module aspect ratio (height / width)
    pub aspect: u8,
}

impl Pdf417Params {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            column: 0,
            line: 0,
            module: 2,
            aspect: 3,
        }
    }
}

/// Printed size of a stored logo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogoSize {
    #[default]
    Normal,
    DoubleWidth,
    DoubleHeight,
    DoubleWidthDoubleHeight,
}

impl LogoSize {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "doublewidth" => Some(Self::DoubleWidth),
            "doubleheight" => Some(Self::DoubleHeight),
            "doublewidthdoubleheight" => Some(Self::DoubleWidthDoubleHeight),
            _ => None,
        }
    }

    /// Horizontal and vertical scale factors.
    pub fn scale(self) -> (u8, u8) {
        match self {
            LogoSize::Normal => (1, 1),
            LogoSize::DoubleWidth => (2, 1),
            LogoSize::DoubleHeight => (1, 2),
            LogoSize::DoubleWidthDoubleHeight => (2, 2),
        }
    }
}

/// Cash drawer output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawerChannel {
    #[default]
    No1,
    No2,
}

/// A single-attribute style override used by scoped text commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyleOverride {
    Bold,
    Underline,
    Invert,
    Magnification(Magnification),
}

/// One print instruction, as handed to the document builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AppendText(String),
    /// Text with one style attribute overridden. With `revert_after` the
    /// attribute goes back to its previous value after the text.
    AppendStyledText {
        text: String,
        style: StyleOverride,
        revert_after: bool,
    },
    SetAlignment(Alignment),
    /// Persistent style change; `None` leaves the attribute untouched.
    SetStyle {
        bold: Option<bool>,
        underline: Option<bool>,
        invert: Option<bool>,
    },
    SetMagnification(Magnification),
    ResetStyles,
    CutPaper(CutType),
    FeedLines(u8),
    /// Feed amount in millimetres
    FeedUnits(f64),
    AppendBarcode(BarcodeParams),
    AppendQrCode(QrParams),
    AppendPdf417(Pdf417Params),
    AppendImage {
        bitmap: DecodedBitmap,
        width: u16,
    },
    SetEncoding(Charset),
    SetFontStyle(FontStyle),
    /// Extra space between characters, in millimetres
    SetCharacterSpace(f64),
    /// Line feed pitch, in millimetres
    SetLineSpace(f64),
    /// Move the print position to an offset from the left margin, in millimetres
    SetAbsolutePosition(f64),
    /// Move the print position relative to the current one, in millimetres
    SetRelativePosition(f64),
    AppendLogo {
        key_code: String,
        size: LogoSize,
    },
    OpenDrawer(DrawerChannel),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barcode_defaults() {
        let params = BarcodeParams::new("123");
        assert_eq!(params.symbology, BarcodeSymbology::Code128);
        assert_eq!(params.height, 40);
        assert!(!params.print_hri);
    }

    #[test]
    fn test_qr_and_pdf417_defaults() {
        let qr = QrParams::new("x");
        assert_eq!(qr.level, QrLevel::L);
        assert_eq!(qr.cell_size, 8);

        let pdf = Pdf417Params::new("x");
        assert_eq!((pdf.column, pdf.line, pdf.module, pdf.aspect), (0, 0, 2, 3));
    }

    #[test]
    fn test_magnification_bounds() {
        assert_eq!(Magnification::default(), Magnification::NORMAL);
        assert!(Magnification::new(6, 6).is_some());
        assert!(Magnification::new(0, 1).is_none());
        assert!(Magnification::new(1, 7).is_none());
    }

    #[test]
    fn test_name_parsing() {
        assert_eq!(Charset::from_name("UTF-8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_name("windows-1252"), Some(Charset::Cp1252));
        assert_eq!(Charset::from_name("shift_jis"), None);
        assert_eq!(BarcodeSymbology::from_name("JAN13"), Some(BarcodeSymbology::Jan13));
        assert_eq!(QrLevel::from_name("h"), Some(QrLevel::H));
        assert_eq!(LogoSize::from_name("DoubleHeight"), Some(LogoSize::DoubleHeight));
    }
}
