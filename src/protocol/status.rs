//! # Automatic Status Back (ASB)
//!
//! The printer answers a status request (or pushes unsolicited updates) with
//! an ASB frame:
//!
//! ```text
//! byte 0   header 1: frame length in bits 1-3 and 5, bit 0 = 1, bits 4 and 7 = 0
//! byte 1   header 2: version
//! byte 2   printer status  (bit 5 cover open, bit 2 drawer signal)
//! byte 3   error status
//! byte 4   error status 2
//! byte 5   sensor status   (bit 3 paper empty, bit 2 paper near end)
//! ...
//! ```
//!
//! The smallest frame the fields above need is 6 bytes; most printers send 9.

use crate::error::TransportError;
use crate::status::RawStatus;

/// Shortest frame that carries the sensor byte.
pub const MIN_FRAME_LEN: usize = 6;

/// Decode the total frame length from header byte 1, or `None` if the byte is
/// not an ASB header.
pub fn frame_len(header: u8) -> Option<usize> {
    if header & 0x91 != 0x01 {
        return None;
    }
    Some((((header >> 2) & 0x08) | ((header >> 1) & 0x07)) as usize)
}

/// Parse one ASB frame.
pub fn parse_asb(frame: &[u8]) -> Result<RawStatus, TransportError> {
    let header = *frame
        .first()
        .ok_or_else(|| TransportError::Device("empty status response".into()))?;
    let len = frame_len(header).ok_or_else(|| {
        TransportError::Device(format!("not a status frame (header 0x{:02X})", header))
    })?;
    if len < MIN_FRAME_LEN || frame.len() < len {
        return Err(TransportError::Device(format!(
            "short status frame: expected {} bytes, got {}",
            len.max(MIN_FRAME_LEN),
            frame.len()
        )));
    }

    let printer = frame[2];
    let sensor = frame[5];
    Ok(RawStatus {
        cover_open: Some(printer & 0x20 != 0),
        drawer_open: Some(printer & 0x04 != 0),
        paper_empty: Some(sensor & 0x08 != 0),
        paper_near_empty: Some(sensor & 0x04 != 0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_len() {
        assert_eq!(frame_len(0x23), Some(9));
        assert_eq!(frame_len(0x0F), Some(7));
        assert_eq!(frame_len(0x40), None);
    }

    #[test]
    fn test_parse_idle_printer() {
        let status = parse_asb(&[0x23, 0x86, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(
            status,
            RawStatus {
                cover_open: Some(false),
                paper_empty: Some(false),
                paper_near_empty: Some(false),
                drawer_open: Some(false),
            }
        );
    }

    #[test]
    fn test_parse_cover_open_paper_empty() {
        let status = parse_asb(&[0x23, 0x86, 0x20, 0, 0, 0x0C, 0, 0, 0]).unwrap();
        assert_eq!(status.cover_open, Some(true));
        assert_eq!(status.paper_empty, Some(true));
        assert_eq!(status.paper_near_empty, Some(true));
        assert_eq!(status.drawer_open, Some(false));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_asb(&[]).is_err());
        assert!(parse_asb(&[0x40, 0, 0, 0, 0, 0]).is_err());
        assert!(parse_asb(&[0x23, 0x86, 0]).is_err());
    }
}
