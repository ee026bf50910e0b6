//! # Pipeline Tests
//!
//! JSON command maps → commands → document → StarPRNT bytes, through the
//! public API only.

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use starbridge::PrinterConfig;
use starbridge::bitmap::{DecodedBitmap, ImageDecoder};
use starbridge::command::{
    self, BarcodeSymbology, Command, CutType, Magnification, ParseOutcome, SkipReason,
};
use starbridge::document::{self, Document, Render};
use starbridge::error::StarbridgeError;
use starbridge::protocol::{self, commands, text};

/// Decodes any payload into a 2x2 black square.
struct SquareDecoder;

impl ImageDecoder for SquareDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedBitmap, StarbridgeError> {
        if bytes.is_empty() {
            return Err(StarbridgeError::ImageDecodeFailed("empty payload".into()));
        }
        Ok(DecodedBitmap::from_luma(2, 2, vec![0; 4]).unwrap())
    }
}

fn document(maps: &[Value]) -> Document {
    document::build(&command::parse_commands(maps, &SquareDecoder))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

// ============================================================================
// PARSING
// ============================================================================

#[test]
fn test_barcode_defaults() {
    let outcome = command::parse_command(&json!({"appendBarcode": "123"}), &SquareDecoder);
    let ParseOutcome::Command(Command::AppendBarcode(params)) = outcome else {
        panic!("expected a barcode, got {:?}", outcome);
    };
    assert_eq!(params.data, "123");
    assert_eq!(params.symbology, BarcodeSymbology::Code128);
    assert_eq!(params.height, 40);
    assert!(!params.print_hri);
}

#[test]
fn test_unknown_entry_is_dropped_in_order() {
    let doc = document(&[
        json!({"appendText": "first"}),
        json!({"printHologram": true}),
        json!({"appendText": "second"}),
    ]);
    let renders: Vec<_> = doc.iter().map(|i| i.render.clone()).collect();
    assert_eq!(
        renders,
        vec![Render::Text("first".into()), Render::Text("second".into())]
    );
}

#[test]
fn test_non_object_entry_is_skipped() {
    assert_eq!(
        command::parse_command(&json!("appendText"), &SquareDecoder),
        ParseOutcome::Skipped(SkipReason::NotAnObject)
    );
}

// ============================================================================
// DOCUMENT
// ============================================================================

#[test]
fn test_scoped_magnification_then_plain_text() {
    let doc = document(&[
        json!({"setBold": true}),
        json!({"appendTextMagnified": "X", "width": 2, "height": 2}),
        json!({"appendText": "Y"}),
    ]);

    assert_eq!(doc.len(), 2);
    assert!(doc.instructions[0].style.bold);
    assert_eq!(
        doc.instructions[0].style.magnification,
        Magnification::new(2, 2).unwrap()
    );
    assert!(doc.instructions[1].style.bold);
    assert_eq!(doc.instructions[1].style.magnification, Magnification::NORMAL);
}

#[test]
fn test_image_entry_becomes_instruction() {
    let doc = document(&[
        json!({"appendBitmapByteArray": [0x89, 0x50, 0x4E, 0x47], "width": 64}),
        json!({"appendBitmapByteArray": [], "width": 64}),
    ]);
    assert_eq!(doc.len(), 1);
    assert!(matches!(doc.instructions[0].render, Render::Image { width: 64, .. }));
}

// ============================================================================
// ENCODING
// ============================================================================

#[test]
fn test_encoding_is_deterministic() {
    let maps = vec![
        json!({"setAlignment": "center"}),
        json!({"appendTextBold": "RECEIPT\n"}),
        json!({"appendQrCode": "https://example.com", "level": "m"}),
        json!({"appendBarcode": "4901234567894", "symbology": "jan13", "hri": true}),
        json!({"feedUnits": 3}),
        json!({"appendCutPaper": "fullCut"}),
    ];
    let config = PrinterConfig::default();
    let first = protocol::encode(&document(&maps), &config);
    let second = protocol::encode(&document(&maps), &config);
    assert_eq!(first, second);
}

#[test]
fn test_encoded_job_shape() {
    let bytes = protocol::encode(
        &document(&[
            json!({"appendTextBold": "TOTAL"}),
            json!({"appendText": " 12.00\n"}),
            json!({"appendCutPaper": "partialCut"}),
        ]),
        &PrinterConfig::default(),
    );

    assert!(bytes.starts_with(&commands::init()));
    assert!(bytes.ends_with(&commands::cut(CutType::Partial)));
    assert!(contains(&bytes, &text::bold(true)));
    assert!(contains(&bytes, &text::bold(false)));
    assert!(contains(&bytes, b"TOTAL"));
    assert!(contains(&bytes, b" 12.00\n"));
}

#[test]
fn test_drawer_pulse_bytes() {
    let bytes = protocol::encode(
        &Document::drawer_pulse(command::DrawerChannel::No1),
        &PrinterConfig::default(),
    );
    assert_eq!(bytes, [commands::init(), vec![0x07]].concat());
}
