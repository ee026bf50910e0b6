//! Validating parse step: loosely-typed command maps → [`Command`].
//!
//! Commands arrive in the plugin channel's key-based form: the first
//! recognised command key in an object selects the variant, its value is the
//! primary payload, and sibling keys are parameters.
//!
//! ```text
//! {"appendText": "Hello\n"}
//! {"appendTextMagnified": "TOTAL", "width": 2, "height": 2}
//! {"appendBarcode": "4901234567894", "symbology": "jan13", "hri": true}
//! ```
//!
//! A bad entry never aborts a job. Entries that are not objects, carry no
//! known key, or have a payload of the wrong type come back as
//! [`ParseOutcome::Skipped`]. Optional parameters of the wrong type fall back
//! to their defaults.

use serde_json::{Map, Value};
use tracing::warn;

use super::types::*;
use crate::bitmap::ImageDecoder;

type Object = Map<String, Value>;
type Parser = fn(&Value, &Object, &dyn ImageDecoder) -> Result<Command, SkipReason>;

/// Why an entry was dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The entry is not a JSON object.
    NotAnObject,
    /// No recognised command key.
    UnknownCommand(Vec<String>),
    /// The payload or a validated parameter has the wrong type or range.
    Malformed { key: &'static str, message: String },
    /// Image bytes could not be decoded.
    ImageDecode(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotAnObject => write!(f, "command is not an object"),
            SkipReason::UnknownCommand(keys) => {
                write!(f, "no known command key in [{}]", keys.join(", "))
            }
            SkipReason::Malformed { key, message } => write!(f, "{}: {}", key, message),
            SkipReason::ImageDecode(message) => write!(f, "image decode failed: {}", message),
        }
    }
}

/// Result of parsing one entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Command(Command),
    Skipped(SkipReason),
}

/// Command keys in lookup order.
const COMMAND_KEYS: &[(&str, Parser)] = &[
    ("appendText", parse_append_text),
    ("appendTextBold", parse_text_bold),
    ("appendTextUnderline", parse_text_underline),
    ("appendTextInvert", parse_text_invert),
    ("appendTextMagnified", parse_text_magnified),
    ("appendStyledText", parse_styled_text),
    ("setAlignment", parse_alignment),
    ("setBold", parse_set_bold),
    ("setUnderline", parse_set_underline),
    ("setInvert", parse_set_invert),
    ("setStyle", parse_set_style),
    ("setMagnification", parse_set_magnification),
    ("resetStyles", parse_reset_styles),
    ("appendCutPaper", parse_cut),
    ("feedLine", parse_feed_line),
    ("feedUnits", parse_feed_units),
    ("appendBarcode", parse_barcode),
    ("appendQrCode", parse_qr_code),
    ("appendPdf417", parse_pdf417),
    ("appendBitmapByteArray", parse_bitmap),
    ("setEncoding", parse_encoding),
    ("setFontStyle", parse_font_style),
    ("setCharacterSpace", parse_character_space),
    ("setLineSpace", parse_line_space),
    ("setAbsolutePosition", parse_absolute_position),
    ("setRelativePosition", parse_relative_position),
    ("appendLogo", parse_logo),
    ("openCashDrawer", parse_open_drawer),
];

/// Parse a single command map.
pub fn parse_command(value: &Value, decoder: &dyn ImageDecoder) -> ParseOutcome {
    let Some(obj) = value.as_object() else {
        return ParseOutcome::Skipped(SkipReason::NotAnObject);
    };

    for &(key, parser) in COMMAND_KEYS {
        if let Some(payload) = obj.get(key) {
            return match parser(payload, obj, decoder) {
                Ok(cmd) => ParseOutcome::Command(cmd),
                Err(reason) => ParseOutcome::Skipped(reason),
            };
        }
    }

    ParseOutcome::Skipped(SkipReason::UnknownCommand(obj.keys().cloned().collect()))
}

/// Parse a list of command maps, dropping (and logging) entries that do not
/// parse. Order of the surviving commands is preserved.
pub fn parse_commands(values: &[Value], decoder: &dyn ImageDecoder) -> Vec<Command> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match parse_command(value, decoder) {
            ParseOutcome::Command(cmd) => Some(cmd),
            ParseOutcome::Skipped(reason) => {
                warn!(index, %reason, "skipping print command");
                None
            }
        })
        .collect()
}

// ============================================================================
// FIELD HELPERS
// ============================================================================

fn malformed(key: &'static str, message: impl Into<String>) -> SkipReason {
    SkipReason::Malformed {
        key,
        message: message.into(),
    }
}

fn payload_str(key: &'static str, payload: &Value) -> Result<String, SkipReason> {
    payload
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| malformed(key, "expected a string"))
}

fn payload_f64(key: &'static str, payload: &Value) -> Result<f64, SkipReason> {
    match payload.as_f64() {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(malformed(key, "expected a number")),
    }
}

/// Integer parameter; `None` when absent or not an integer.
fn param_int(obj: &Object, name: &str) -> Option<i64> {
    obj.get(name).and_then(Value::as_i64)
}

fn param_bool(obj: &Object, name: &str) -> Option<bool> {
    obj.get(name).and_then(Value::as_bool)
}

fn param_str<'a>(obj: &'a Object, name: &str) -> Option<&'a str> {
    obj.get(name).and_then(Value::as_str)
}

/// Integer parameter that must fit in `range` when present.
fn param_u8_in(
    key: &'static str,
    obj: &Object,
    name: &str,
    range: std::ops::RangeInclusive<u8>,
    default: u8,
) -> Result<u8, SkipReason> {
    match param_int(obj, name) {
        None => Ok(default),
        Some(v) => u8::try_from(v)
            .ok()
            .filter(|v| range.contains(v))
            .ok_or_else(|| {
                malformed(
                    key,
                    format!("{} must be in {}..={}, got {}", name, range.start(), range.end(), v),
                )
            }),
    }
}

fn magnification_params(key: &'static str, obj: &Object) -> Result<Magnification, SkipReason> {
    let width = param_u8_in(key, obj, "width", 1..=MAX_MAGNIFICATION, 1)?;
    let height = param_u8_in(key, obj, "height", 1..=MAX_MAGNIFICATION, 1)?;
    Magnification::new(width, height).ok_or_else(|| malformed(key, "invalid magnification"))
}

// ============================================================================
// TEXT
// ============================================================================

fn parse_append_text(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    Ok(Command::AppendText(payload_str("appendText", payload)?))
}

fn scoped(text: String, style: StyleOverride) -> Command {
    Command::AppendStyledText {
        text,
        style,
        revert_after: true,
    }
}

fn parse_text_bold(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    Ok(scoped(payload_str("appendTextBold", payload)?, StyleOverride::Bold))
}

fn parse_text_underline(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    Ok(scoped(
        payload_str("appendTextUnderline", payload)?,
        StyleOverride::Underline,
    ))
}

fn parse_text_invert(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    Ok(scoped(payload_str("appendTextInvert", payload)?, StyleOverride::Invert))
}

fn parse_text_magnified(payload: &Value, obj: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    const KEY: &str = "appendTextMagnified";
    let text = payload_str(KEY, payload)?;
    let mag = magnification_params(KEY, obj)?;
    Ok(scoped(text, StyleOverride::Magnification(mag)))
}

fn parse_styled_text(payload: &Value, obj: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    const KEY: &str = "appendStyledText";
    let text = payload_str(KEY, payload)?;
    let style = if param_bool(obj, "bold") == Some(true) {
        StyleOverride::Bold
    } else if param_bool(obj, "underline") == Some(true) {
        StyleOverride::Underline
    } else if param_bool(obj, "invert") == Some(true) {
        StyleOverride::Invert
    } else if obj.contains_key("width") || obj.contains_key("height") {
        StyleOverride::Magnification(magnification_params(KEY, obj)?)
    } else {
        return Err(malformed(KEY, "no style override given"));
    };
    Ok(Command::AppendStyledText {
        text,
        style,
        revert_after: param_bool(obj, "revertAfter").unwrap_or(true),
    })
}

// ============================================================================
// STYLE
// ============================================================================

fn parse_alignment(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    let name = payload_str("setAlignment", payload)?;
    let alignment = match name.to_lowercase().as_str() {
        "center" => Alignment::Center,
        "right" => Alignment::Right,
        _ => Alignment::Left,
    };
    Ok(Command::SetAlignment(alignment))
}

fn payload_bool(key: &'static str, payload: &Value) -> Result<bool, SkipReason> {
    payload
        .as_bool()
        .ok_or_else(|| malformed(key, "expected a boolean"))
}

fn parse_set_bold(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    Ok(Command::SetStyle {
        bold: Some(payload_bool("setBold", payload)?),
        underline: None,
        invert: None,
    })
}

fn parse_set_underline(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    Ok(Command::SetStyle {
        bold: None,
        underline: Some(payload_bool("setUnderline", payload)?),
        invert: None,
    })
}

fn parse_set_invert(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    Ok(Command::SetStyle {
        bold: None,
        underline: None,
        invert: Some(payload_bool("setInvert", payload)?),
    })
}

fn parse_set_style(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    let style = payload
        .as_object()
        .ok_or_else(|| malformed("setStyle", "expected an object"))?;
    let cmd = Command::SetStyle {
        bold: param_bool(style, "bold"),
        underline: param_bool(style, "underline"),
        invert: param_bool(style, "invert"),
    };
    if cmd
        == (Command::SetStyle {
            bold: None,
            underline: None,
            invert: None,
        })
    {
        return Err(malformed("setStyle", "no bold, underline or invert flag"));
    }
    Ok(cmd)
}

fn parse_set_magnification(_: &Value, obj: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    Ok(Command::SetMagnification(magnification_params(
        "setMagnification",
        obj,
    )?))
}

fn parse_reset_styles(_: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    Ok(Command::ResetStyles)
}

fn parse_encoding(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    let name = payload_str("setEncoding", payload)?;
    Charset::from_name(&name)
        .map(Command::SetEncoding)
        .ok_or_else(|| malformed("setEncoding", format!("unsupported charset \"{}\"", name)))
}

fn parse_font_style(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    let name = payload_str("setFontStyle", payload)?;
    match name.to_uppercase().as_str() {
        "A" => Ok(Command::SetFontStyle(FontStyle::A)),
        "B" => Ok(Command::SetFontStyle(FontStyle::B)),
        other => Err(malformed(
            "setFontStyle",
            format!("expected \"A\" or \"B\", got \"{}\"", other),
        )),
    }
}

fn parse_character_space(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    let mm = payload_f64("setCharacterSpace", payload)?;
    if mm < 0.0 {
        return Err(malformed("setCharacterSpace", "must not be negative"));
    }
    Ok(Command::SetCharacterSpace(mm))
}

fn parse_line_space(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    let mm = payload_f64("setLineSpace", payload)?;
    if mm < 0.0 {
        return Err(malformed("setLineSpace", "must not be negative"));
    }
    Ok(Command::SetLineSpace(mm))
}

fn parse_absolute_position(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    let mm = payload_f64("setAbsolutePosition", payload)?;
    if mm < 0.0 {
        return Err(malformed("setAbsolutePosition", "must not be negative"));
    }
    Ok(Command::SetAbsolutePosition(mm))
}

fn parse_relative_position(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    Ok(Command::SetRelativePosition(payload_f64(
        "setRelativePosition",
        payload,
    )?))
}

// ============================================================================
// PAPER CONTROL
// ============================================================================

fn parse_cut(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    let name = payload_str("appendCutPaper", payload)?;
    let cut = match name.as_str() {
        "fullCut" => CutType::Full,
        "partialCutWithFeed" => CutType::PartialWithFeed,
        "fullCutWithFeed" => CutType::FullWithFeed,
        _ => CutType::Partial,
    };
    Ok(Command::CutPaper(cut))
}

fn parse_feed_line(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    payload
        .as_i64()
        .and_then(|n| u8::try_from(n).ok())
        .map(Command::FeedLines)
        .ok_or_else(|| malformed("feedLine", "expected an integer in 0..=255"))
}

fn parse_feed_units(payload: &Value, _: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    let mm = payload_f64("feedUnits", payload)?;
    if !(0.0..=MAX_FEED_MM).contains(&mm) {
        return Err(malformed(
            "feedUnits",
            format!("must be in 0..={} mm, got {}", MAX_FEED_MM, mm),
        ));
    }
    Ok(Command::FeedUnits(mm))
}

fn parse_open_drawer(_: &Value, obj: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    let channel = match param_int(obj, "channel") {
        Some(2) => DrawerChannel::No2,
        _ => DrawerChannel::No1,
    };
    Ok(Command::OpenDrawer(channel))
}

// ============================================================================
// BARCODES AND GRAPHICS
// ============================================================================

fn parse_barcode(payload: &Value, obj: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    const KEY: &str = "appendBarcode";
    let mut params = BarcodeParams::new(payload_str(KEY, payload)?);
    if let Some(symbology) = param_str(obj, "symbology").and_then(BarcodeSymbology::from_name) {
        params.symbology = symbology;
    }
    params.height = param_u8_in(KEY, obj, "height", 1..=255, DEFAULT_BARCODE_HEIGHT)?;
    params.print_hri = param_bool(obj, "hri").unwrap_or(false);
    Ok(Command::AppendBarcode(params))
}

/// 2D code payload; must fit the 16-bit length field.
fn code_data(key: &'static str, payload: &Value) -> Result<String, SkipReason> {
    let data = payload_str(key, payload)?;
    if data.len() > MAX_CODE_DATA_LEN {
        return Err(malformed(
            key,
            format!("data is {} bytes, limit is {}", data.len(), MAX_CODE_DATA_LEN),
        ));
    }
    Ok(data)
}

fn parse_qr_code(payload: &Value, obj: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    const KEY: &str = "appendQrCode";
    let mut params = QrParams::new(code_data(KEY, payload)?);
    if let Some(level) = param_str(obj, "level").and_then(QrLevel::from_name) {
        params.level = level;
    }
    params.cell_size = param_u8_in(KEY, obj, "cellSize", 1..=8, DEFAULT_QR_CELL_SIZE)?;
    Ok(Command::AppendQrCode(params))
}

fn parse_pdf417(payload: &Value, obj: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    const KEY: &str = "appendPdf417";
    let mut params = Pdf417Params::new(code_data(KEY, payload)?);
    params.column = param_u8_in(KEY, obj, "column", 0..=30, params.column)?;
    params.line = param_u8_in(KEY, obj, "line", 0..=90, params.line)?;
    params.module = param_u8_in(KEY, obj, "module", 1..=10, params.module)?;
    params.aspect = param_u8_in(KEY, obj, "aspect", 1..=10, params.aspect)?;
    Ok(Command::AppendPdf417(params))
}

fn parse_bitmap(payload: &Value, obj: &Object, decoder: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    const KEY: &str = "appendBitmapByteArray";
    let bytes = payload
        .as_array()
        .ok_or_else(|| malformed(KEY, "expected a byte array"))?
        .iter()
        .map(|v| v.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| malformed(KEY, "array entries must be bytes"))?;

    let width = param_int(obj, "width")
        .and_then(|w| u16::try_from(w).ok())
        .filter(|&w| w > 0)
        .unwrap_or(DEFAULT_IMAGE_WIDTH);

    let bitmap = decoder
        .decode(&bytes)
        .map_err(|e| SkipReason::ImageDecode(e.message().to_string()))?;
    Ok(Command::AppendImage { bitmap, width })
}

fn parse_logo(payload: &Value, obj: &Object, _: &dyn ImageDecoder) -> Result<Command, SkipReason> {
    const KEY: &str = "appendLogo";
    let key_code = payload_str(KEY, payload)?;
    let printable = |b: &u8| (32..=126).contains(b);
    if key_code.len() != 2 || !key_code.as_bytes().iter().all(printable) {
        return Err(malformed(KEY, "key code must be 2 printable ASCII characters"));
    }
    let size = param_str(obj, "size")
        .and_then(LogoSize::from_name)
        .unwrap_or_default();
    Ok(Command::AppendLogo { key_code, size })
}
