//! # Printer Geometry
//!
//! Physical characteristics the encoder needs to turn millimetres into dots
//! and to fit images to the paper.
//!
//! | Paper | Print width | Resolution |
//! |-------|-------------|------------|
//! | 80mm  | 72mm (576 dots) | 203 DPI |
//! | 58mm  | 48mm (384 dots) | 203 DPI |
//!
//! ```
//! use starbridge::printer::PrinterConfig;
//!
//! let config = PrinterConfig::default();
//! assert_eq!(config.width_dots, 576);
//! assert_eq!(config.mm_to_dots(10.0), 80);
//! ```

/// Geometry of the target printer.
///
/// ```text
/// dots_per_mm = dpi / 25.4
///
/// 203 DPI: dots_per_mm ≈ 8, so 576 dots ≈ 72mm
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Maximum print width in dots
    pub width_dots: u16,

    /// Resolution in dots per inch
    pub dpi: u16,

    /// Maximum rows per raster command, to stay inside small device buffers
    pub max_chunk_rows: u16,
}

impl PrinterConfig {
    /// 80mm receipt paper at 203 DPI (TSP100/TSP650/mC-Print3 class).
    pub const RECEIPT_80MM: Self = Self {
        width_dots: 576,
        dpi: 203,
        max_chunk_rows: 256,
    };

    /// Same resolution, different print width.
    pub fn with_width_dots(width_dots: u16) -> Self {
        Self {
            width_dots: width_dots.max(8),
            ..Self::RECEIPT_80MM
        }
    }

    /// Print width in bytes of packed raster data.
    #[inline]
    pub fn width_bytes(&self) -> u16 {
        self.width_dots.div_ceil(8)
    }

    #[inline]
    pub fn dots_per_mm(&self) -> f64 {
        self.dpi as f64 / 25.4
    }

    /// Convert millimetres to dots, rounded and clamped at zero.
    #[inline]
    pub fn mm_to_dots(&self, mm: f64) -> u16 {
        (mm * self.dots_per_mm()).round().clamp(0.0, u16::MAX as f64) as u16
    }

    /// Signed conversion, for relative moves.
    #[inline]
    pub fn mm_to_dots_signed(&self, mm: f64) -> i16 {
        (mm * self.dots_per_mm())
            .round()
            .clamp(i16::MIN as f64, i16::MAX as f64) as i16
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::RECEIPT_80MM
    }
}
