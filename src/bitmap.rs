//! # Decoded Bitmaps
//!
//! Image payloads arrive as encoded bytes (PNG, JPEG, BMP, ...). Decoding is
//! a collaborator concern behind the [`ImageDecoder`] trait; the rest of the
//! crate only sees a [`DecodedBitmap`]: an 8-bit grayscale pixel buffer.
//!
//! Turning a bitmap into printer dots happens in [`DecodedBitmap::rasterize`],
//! which scales to the requested width and applies Bayer 8x8 ordered
//! dithering. Ordered dithering is deterministic, so the same document always
//! encodes to the same bytes.

use image::{GrayImage, imageops::FilterType};

use crate::error::StarbridgeError;

/// Bayer 8x8 threshold matrix (values 0-63).
const BAYER8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// A decoded grayscale image. `pixels` is row-major, one byte per pixel,
/// 0 = black and 255 = white.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Packed 1-bit raster, MSB = leftmost dot, 1 = black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width_dots: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

impl DecodedBitmap {
    /// Build a bitmap from raw grayscale pixels.
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn from_luma(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Scale to `width_dots` (keeping the aspect ratio) and dither to 1-bit.
    pub fn rasterize(&self, width_dots: u16) -> Raster {
        let width_dots = width_dots.max(1);
        if self.width == 0 || self.height == 0 {
            return Raster {
                width_dots,
                height: 0,
                data: Vec::new(),
            };
        }

        let target_w = width_dots as u32;
        let target_h = ((self.height as u64 * target_w as u64) / self.width as u64)
            .clamp(1, u16::MAX as u64) as u32;

        let gray = GrayImage::from_raw(self.width, self.height, self.pixels.clone());
        let scaled = match gray {
            Some(img) if img.dimensions() != (target_w, target_h) => {
                image::imageops::resize(&img, target_w, target_h, FilterType::Triangle)
            }
            Some(img) => img,
            None => GrayImage::new(target_w, target_h),
        };

        let width_bytes = (target_w as usize).div_ceil(8);
        let mut data = vec![0u8; width_bytes * target_h as usize];
        for (x, y, pixel) in scaled.enumerate_pixels() {
            let intensity = 1.0 - pixel[0] as f32 / 255.0;
            if intensity > threshold(x as usize, y as usize) {
                let idx = y as usize * width_bytes + x as usize / 8;
                data[idx] |= 0x80u8 >> (x % 8);
            }
        }

        Raster {
            width_dots,
            height: target_h as u16,
            data,
        }
    }
}

#[inline]
fn threshold(x: usize, y: usize) -> f32 {
    (BAYER8[y & 7][x & 7] as f32 + 0.5) / 64.0
}

/// Turns encoded image bytes into a [`DecodedBitmap`].
pub trait ImageDecoder: Send + Sync {
    /// Decode `bytes`. Failures are [`StarbridgeError::ImageDecodeFailed`].
    fn decode(&self, bytes: &[u8]) -> Result<DecodedBitmap, StarbridgeError>;
}

/// Decoder backed by the `image` crate (PNG, JPEG, BMP, GIF, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedBitmap, StarbridgeError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| StarbridgeError::ImageDecodeFailed(e.to_string()))?;
        let gray = img.to_luma8();
        let (width, height) = gray.dimensions();
        Ok(DecodedBitmap {
            width,
            height,
            pixels: gray.into_raw(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Luma};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, value: u8) -> Vec<u8> {
        let img = GrayImage::from_pixel(width, height, Luma([value]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let bitmap = ImageCrateDecoder.decode(&png_bytes(4, 2, 0)).unwrap();
        assert_eq!(bitmap.width, 4);
        assert_eq!(bitmap.height, 2);
        assert!(bitmap.pixels.iter().all(|&p| p == 0));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = ImageCrateDecoder.decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, StarbridgeError::ImageDecodeFailed(_)));
    }

    #[test]
    fn test_from_luma_checks_length() {
        assert!(DecodedBitmap::from_luma(2, 2, vec![0; 4]).is_some());
        assert!(DecodedBitmap::from_luma(2, 2, vec![0; 3]).is_none());
    }

    #[test]
    fn test_rasterize_black_and_white() {
        let black = DecodedBitmap::from_luma(8, 8, vec![0; 64]).unwrap();
        let raster = black.rasterize(8);
        assert_eq!(raster.height, 8);
        assert!(raster.data.iter().all(|&b| b == 0xFF));

        let white = DecodedBitmap::from_luma(8, 8, vec![255; 64]).unwrap();
        assert!(white.rasterize(8).data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_rasterize_keeps_aspect_ratio() {
        let bitmap = DecodedBitmap::from_luma(100, 50, vec![128; 5000]).unwrap();
        let raster = bitmap.rasterize(200);
        assert_eq!(raster.width_dots, 200);
        assert_eq!(raster.height, 100);
        assert_eq!(raster.data.len(), 25 * 100);
    }
}
