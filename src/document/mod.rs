//! # Document Builder
//!
//! Resolves a list of [`Command`]s into a [`Document`]: an ordered list of
//! render instructions, each carrying the full style snapshot that was active
//! when it was emitted.
//!
//! ```text
//! Commands → DocumentBuilder (StyleState) → Document → protocol::encode → bytes
//! ```
//!
//! Style changes never produce instructions of their own. They mutate the
//! builder's [`StyleState`], and every later instruction is tagged with a copy
//! of it. Scoped text commands apply one override for a single instruction,
//! then put back only that attribute.
//!
//! ```
//! use starbridge::command::{Command, Magnification, StyleOverride};
//! use starbridge::document;
//!
//! let doc = document::build(&[
//!     Command::SetStyle { bold: Some(true), underline: None, invert: None },
//!     Command::AppendStyledText {
//!         text: "X".into(),
//!         style: StyleOverride::Magnification(Magnification::new(2, 2).unwrap()),
//!         revert_after: true,
//!     },
//!     Command::AppendText("Y".into()),
//! ]);
//! assert_eq!(doc.len(), 2);
//! assert!(doc.instructions[1].style.bold);
//! assert_eq!(doc.instructions[1].style.magnification, Magnification::NORMAL);
//! ```

use crate::bitmap::DecodedBitmap;
use crate::command::{
    Alignment, BarcodeParams, Charset, Command, CutType, DrawerChannel, FontStyle, LogoSize,
    Magnification, Pdf417Params, QrParams, StyleOverride,
};

/// Formatting context applied to every emitted instruction until changed.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleState {
    pub bold: bool,
    pub underline: bool,
    pub invert: bool,
    pub magnification: Magnification,
    pub alignment: Alignment,
    pub encoding: Charset,
    pub font: FontStyle,
    /// Extra space between characters, in millimetres
    pub character_space: f64,
    /// Line feed pitch in millimetres; `None` keeps the printer default
    pub line_space: Option<f64>,
}

impl Default for StyleState {
    fn default() -> Self {
        Self {
            bold: false,
            underline: false,
            invert: false,
            magnification: Magnification::NORMAL,
            alignment: Alignment::Left,
            encoding: Charset::Utf8,
            font: FontStyle::A,
            character_space: 0.0,
            line_space: None,
        }
    }
}

/// What an instruction prints or does.
#[derive(Debug, Clone, PartialEq)]
pub enum Render {
    Text(String),
    Barcode(BarcodeParams),
    QrCode(QrParams),
    Pdf417(Pdf417Params),
    Image { bitmap: DecodedBitmap, width: u16 },
    Logo { key_code: String, size: LogoSize },
    FeedLines(u8),
    /// Feed by millimetres
    Feed(f64),
    Cut(CutType),
    OpenDrawer(DrawerChannel),
    /// Absolute horizontal position from the left margin, in millimetres
    MoveTo(f64),
    /// Relative horizontal move, in millimetres
    MoveBy(f64),
}

/// One resolved instruction and the style active when it was emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInstruction {
    pub render: Render,
    pub style: StyleState,
}

/// Ordered, immutable list of render instructions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub instructions: Vec<RenderInstruction>,
}

impl Document {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RenderInstruction> {
        self.instructions.iter()
    }

    /// A document that only pulses the cash drawer.
    pub fn drawer_pulse(channel: DrawerChannel) -> Self {
        build(&[Command::OpenDrawer(channel)])
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a RenderInstruction;
    type IntoIter = std::slice::Iter<'a, RenderInstruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

/// Incremental document builder.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    style: StyleState,
    instructions: Vec<RenderInstruction>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The style that the next instruction would be tagged with.
    pub fn style(&self) -> &StyleState {
        &self.style
    }

    /// Apply one command.
    pub fn push(&mut self, command: &Command) -> &mut Self {
        match command {
            Command::AppendText(text) => self.emit(Render::Text(text.clone())),
            Command::AppendStyledText {
                text,
                style,
                revert_after,
            } => self.styled_text(text, *style, *revert_after),

            Command::SetAlignment(alignment) => self.style.alignment = *alignment,
            Command::SetStyle {
                bold,
                underline,
                invert,
            } => {
                if let Some(bold) = bold {
                    self.style.bold = *bold;
                }
                if let Some(underline) = underline {
                    self.style.underline = *underline;
                }
                if let Some(invert) = invert {
                    self.style.invert = *invert;
                }
            }
            Command::SetMagnification(mag) => self.style.magnification = *mag,
            Command::ResetStyles => self.style = StyleState::default(),
            Command::SetEncoding(charset) => self.style.encoding = *charset,
            Command::SetFontStyle(font) => self.style.font = *font,
            Command::SetCharacterSpace(mm) => self.style.character_space = *mm,
            Command::SetLineSpace(mm) => self.style.line_space = Some(*mm),

            Command::SetAbsolutePosition(mm) => self.emit(Render::MoveTo(*mm)),
            Command::SetRelativePosition(mm) => self.emit(Render::MoveBy(*mm)),
            Command::CutPaper(cut) => self.emit(Render::Cut(*cut)),
            Command::FeedLines(n) => self.emit(Render::FeedLines(*n)),
            Command::FeedUnits(mm) => self.emit(Render::Feed(*mm)),
            Command::AppendBarcode(params) => self.emit(Render::Barcode(params.clone())),
            Command::AppendQrCode(params) => self.emit(Render::QrCode(params.clone())),
            Command::AppendPdf417(params) => self.emit(Render::Pdf417(params.clone())),
            Command::AppendImage { bitmap, width } => self.emit(Render::Image {
                bitmap: bitmap.clone(),
                width: *width,
            }),
            Command::AppendLogo { key_code, size } => self.emit(Render::Logo {
                key_code: key_code.clone(),
                size: *size,
            }),
            Command::OpenDrawer(channel) => self.emit(Render::OpenDrawer(*channel)),
        }
        self
    }

    pub fn finish(self) -> Document {
        Document {
            instructions: self.instructions,
        }
    }

    fn emit(&mut self, render: Render) {
        self.instructions.push(RenderInstruction {
            render,
            style: self.style.clone(),
        });
    }

    fn styled_text(&mut self, text: &str, style: StyleOverride, revert_after: bool) {
        let prior = self.style.clone();
        match style {
            StyleOverride::Bold => self.style.bold = true,
            StyleOverride::Underline => self.style.underline = true,
            StyleOverride::Invert => self.style.invert = true,
            StyleOverride::Magnification(mag) => self.style.magnification = mag,
        }
        self.emit(Render::Text(text.to_owned()));
        if revert_after {
            match style {
                StyleOverride::Bold => self.style.bold = prior.bold,
                StyleOverride::Underline => self.style.underline = prior.underline,
                StyleOverride::Invert => self.style.invert = prior.invert,
                StyleOverride::Magnification(_) => {
                    self.style.magnification = prior.magnification
                }
            }
        }
    }
}

/// Build a document from commands, in order.
pub fn build(commands: &[Command]) -> Document {
    let mut builder = DocumentBuilder::new();
    for command in commands {
        builder.push(command);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bold_on() -> Command {
        Command::SetStyle {
            bold: Some(true),
            underline: None,
            invert: None,
        }
    }

    #[test]
    fn test_scoped_override_reverts_only_its_attribute() {
        let doc = build(&[
            bold_on(),
            Command::AppendStyledText {
                text: "X".into(),
                style: StyleOverride::Magnification(Magnification::new(2, 2).unwrap()),
                revert_after: true,
            },
            Command::AppendText("Y".into()),
        ]);

        assert_eq!(doc.len(), 2);
        let x = &doc.instructions[0].style;
        assert!(x.bold);
        assert_eq!(x.magnification, Magnification::new(2, 2).unwrap());
        let y = &doc.instructions[1].style;
        assert!(y.bold);
        assert_eq!(y.magnification, Magnification::NORMAL);
    }

    #[test]
    fn test_scoped_bold_keeps_existing_bold() {
        let doc = build(&[
            bold_on(),
            Command::AppendStyledText {
                text: "B".into(),
                style: StyleOverride::Bold,
                revert_after: true,
            },
            Command::AppendText("still bold".into()),
        ]);
        assert!(doc.instructions[1].style.bold);
    }

    #[test]
    fn test_persistent_styled_text() {
        let doc = build(&[
            Command::AppendStyledText {
                text: "U".into(),
                style: StyleOverride::Underline,
                revert_after: false,
            },
            Command::AppendText("after".into()),
        ]);
        assert!(doc.instructions[1].style.underline);
    }

    #[test]
    fn test_reset_styles() {
        let doc = build(&[
            bold_on(),
            Command::SetStyle {
                bold: None,
                underline: Some(true),
                invert: Some(true),
            },
            Command::SetMagnification(Magnification::new(3, 3).unwrap()),
            Command::SetAlignment(Alignment::Right),
            Command::SetLineSpace(4.0),
            Command::ResetStyles,
            Command::AppendText("plain".into()),
        ]);
        assert_eq!(doc.instructions[0].style, StyleState::default());
    }

    #[test]
    fn test_style_commands_emit_nothing() {
        let doc = build(&[
            bold_on(),
            Command::SetAlignment(Alignment::Center),
            Command::SetEncoding(Charset::Cp1252),
            Command::SetFontStyle(FontStyle::B),
            Command::SetCharacterSpace(0.5),
            Command::ResetStyles,
        ]);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_paper_control_tagged_with_style() {
        let doc = build(&[
            Command::SetAlignment(Alignment::Center),
            Command::AppendQrCode(QrParams::new("hello")),
            Command::FeedUnits(3.0),
            Command::CutPaper(CutType::Full),
        ]);
        let renders: Vec<_> = doc.iter().map(|i| i.render.clone()).collect();
        assert_eq!(
            renders,
            vec![
                Render::QrCode(QrParams::new("hello")),
                Render::Feed(3.0),
                Render::Cut(CutType::Full),
            ]
        );
        assert!(doc.iter().all(|i| i.style.alignment == Alignment::Center));
    }

    #[test]
    fn test_positions_are_instructions() {
        let doc = build(&[
            Command::SetAbsolutePosition(10.0),
            Command::SetRelativePosition(-2.5),
        ]);
        assert_eq!(doc.instructions[0].render, Render::MoveTo(10.0));
        assert_eq!(doc.instructions[1].render, Render::MoveBy(-2.5));
    }

    #[test]
    fn test_build_is_deterministic() {
        let commands = vec![
            bold_on(),
            Command::AppendText("A".into()),
            Command::AppendBarcode(BarcodeParams::new("123")),
            Command::OpenDrawer(DrawerChannel::No2),
        ];
        assert_eq!(build(&commands), build(&commands));
    }

    #[test]
    fn test_drawer_pulse_document() {
        let doc = Document::drawer_pulse(DrawerChannel::No1);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.instructions[0].render, Render::OpenDrawer(DrawerChannel::No1));
    }

    #[test]
    fn test_builder_style_tracks_pending_state() {
        let mut builder = DocumentBuilder::new();
        builder
            .push(&bold_on())
            .push(&Command::SetAlignment(Alignment::Right));
        assert!(builder.style().bold);
        assert_eq!(builder.style().alignment, Alignment::Right);

        builder.push(&Command::ResetStyles);
        assert_eq!(builder.style(), &StyleState::default());
        assert!(builder.finish().is_empty());
    }
}
