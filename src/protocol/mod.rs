//! # StarPRNT Encoder
//!
//! Turns a resolved [`Document`] into the byte stream a StarPRNT printer
//! understands.
//!
//! ## Module Structure
//!
//! - [`commands`]: reset, cut, feed, drawer, position, status request
//! - [`text`]: alignment, fonts, emphasis, size, spacing, charsets
//! - [`barcode`]: 1D barcodes, QR codes and PDF417
//! - [`graphics`]: raster images and stored logos
//! - [`status`]: Automatic Status Back frame parsing
//!
//! ## Style Tracking
//!
//! Every instruction carries a full style snapshot. The encoder remembers
//! what it last sent to the printer and only emits the attributes that
//! changed, so a run of plain text produces no style commands at all.
//!
//! ```
//! use starbridge::command::Command;
//! use starbridge::document;
//! use starbridge::printer::PrinterConfig;
//! use starbridge::protocol;
//!
//! let doc = document::build(&[Command::AppendText("Hi\n".into())]);
//! let bytes = protocol::encode(&doc, &PrinterConfig::default());
//! assert!(bytes.starts_with(&[0x1B, 0x40]));
//! assert!(bytes.ends_with(b"Hi\n"));
//! ```
//!
//! Based on "StarPRNT Command Specifications Rev. 4.10" by Star Micronics.

pub mod barcode;
pub mod commands;
pub mod graphics;
pub mod status;
pub mod text;

use tracing::warn;

use crate::command::Charset;
use crate::document::{Document, Render, RenderInstruction, StyleState};
use crate::printer::PrinterConfig;

/// Line pitch restored when a document goes back to the printer default.
pub const DEFAULT_LINE_SPACE_MM: f64 = 4.0;

/// Encode a document for a printer with the given geometry.
pub fn encode(document: &Document, config: &PrinterConfig) -> Vec<u8> {
    let mut encoder = Encoder::new(config);
    for instruction in document {
        encoder.instruction(instruction);
    }
    encoder.out
}

struct Encoder<'a> {
    config: &'a PrinterConfig,
    out: Vec<u8>,
    /// Style the printer is currently in.
    sent: StyleState,
    /// Charset selected on the printer; `None` until the first text.
    charset: Option<Charset>,
}

impl<'a> Encoder<'a> {
    fn new(config: &'a PrinterConfig) -> Self {
        Self {
            config,
            out: commands::init(),
            sent: StyleState::default(),
            charset: None,
        }
    }

    fn instruction(&mut self, instruction: &RenderInstruction) {
        let style = &instruction.style;
        self.sync_layout(style);

        match &instruction.render {
            Render::Text(content) => {
                self.sync_text_style(style);
                if self.charset != Some(style.encoding) {
                    self.out.extend(text::charset(style.encoding));
                    self.charset = Some(style.encoding);
                }
                self.out
                    .extend(text::encode_text(style.encoding, content));
            }
            Render::Barcode(params) => self.out.extend(barcode::barcode1d::barcode(params)),
            Render::QrCode(params) => self.out.extend(barcode::qr::generate(params)),
            Render::Pdf417(params) => self.out.extend(barcode::pdf417::generate(params)),
            Render::Image { bitmap, width } => {
                let width = (*width).min(self.config.width_dots);
                let raster = bitmap.rasterize(width);
                self.out
                    .extend(graphics::raster_chunked(&raster, self.config.max_chunk_rows));
            }
            Render::Logo { key_code, size } => match graphics::print_logo(key_code, *size) {
                Some(cmd) => self.out.extend(cmd),
                None => warn!(key_code = %key_code, "invalid logo key, not printed"),
            },
            Render::FeedLines(n) => self.out.extend(commands::feed_lines(*n)),
            Render::Feed(mm) => self.out.extend(commands::feed_mm(*mm)),
            Render::Cut(cut) => self.out.extend(commands::cut(*cut)),
            Render::OpenDrawer(channel) => self.out.extend(commands::open_drawer(*channel)),
            Render::MoveTo(mm) => self
                .out
                .extend(commands::absolute_position(self.config.mm_to_dots(*mm))),
            Render::MoveBy(mm) => self
                .out
                .extend(commands::relative_position(self.config.mm_to_dots_signed(*mm))),
        }
    }

    /// Attributes that affect every kind of content.
    fn sync_layout(&mut self, target: &StyleState) {
        if self.sent.alignment != target.alignment {
            self.out.extend(text::align(target.alignment));
            self.sent.alignment = target.alignment;
        }
        if self.sent.line_space != target.line_space {
            let mm = target.line_space.unwrap_or(DEFAULT_LINE_SPACE_MM);
            self.out.extend(text::line_space_mm(mm));
            self.sent.line_space = target.line_space;
        }
    }

    /// Attributes that only matter for text.
    fn sync_text_style(&mut self, target: &StyleState) {
        if self.sent.font != target.font {
            self.out.extend(text::font(target.font));
            self.sent.font = target.font;
        }
        if self.sent.bold != target.bold {
            self.out.extend(text::bold(target.bold));
            self.sent.bold = target.bold;
        }
        if self.sent.underline != target.underline {
            self.out.extend(text::underline(target.underline));
            self.sent.underline = target.underline;
        }
        if self.sent.invert != target.invert {
            self.out.extend(text::invert(target.invert));
            self.sent.invert = target.invert;
        }
        if self.sent.magnification != target.magnification {
            self.out.extend(text::size(target.magnification));
            self.sent.magnification = target.magnification;
        }
        if self.sent.character_space != target.character_space {
            let dots = self.config.mm_to_dots(target.character_space);
            self.out.extend(text::character_space(dots));
            self.sent.character_space = target.character_space;
        }
    }
}
