//! PDF export of the summary.
//!
//! The parsed [`Block`]s are laid out top to bottom on A4 pages with a small
//! cursor that mimics a typewriter: `write` places styled text at the cursor
//! and wraps at the right margin, `ln` moves to the next line, and a new page
//! starts when the cursor gets within the bottom margin.
//!
//! Text is drawn with externally supplied TrueType fonts; the built-in PDF
//! fonts cannot encode Hangul or other non-Latin scripts. Line widths are
//! measured from the horizontal advances of the same font program that is
//! embedded, so wrapping, underlines and link rectangles match what is drawn.

use super::summary::{Block, parse_summary};
use crate::config::FontConfig;
use crate::error::{DigestError, Result};
use printpdf::*;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use unicode_width::UnicodeWidthChar;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const BOTTOM_MARGIN_MM: f32 = 15.0;
const LINE_HEIGHT_MM: f32 = 8.0;
const PT_TO_MM: f32 = 0.352_778;

const BODY_SIZE_PT: f32 = 12.0;
const HEADING_SIZE_PT: f32 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FontKind {
    Regular,
    Bold,
    Link,
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    kind: FontKind,
    size_pt: f32,
    rgb: (f32, f32, f32),
    underline: bool,
}

impl TextStyle {
    const BODY: TextStyle = TextStyle {
        kind: FontKind::Regular,
        size_pt: BODY_SIZE_PT,
        rgb: (0.0, 0.0, 0.0),
        underline: false,
    };
    const LABEL: TextStyle = TextStyle {
        kind: FontKind::Bold,
        ..TextStyle::BODY
    };
    const HEADING: TextStyle = TextStyle {
        kind: FontKind::Bold,
        size_pt: HEADING_SIZE_PT,
        ..TextStyle::BODY
    };
    const LINK: TextStyle = TextStyle {
        kind: FontKind::Link,
        rgb: (0.0, 0.0, 1.0),
        underline: true,
        ..TextStyle::BODY
    };
}

/// Raw bytes of one TrueType file and where they came from.
#[derive(Debug, Clone)]
struct FontFile {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl FontFile {
    async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DigestError::Export(format!("cannot read font {}: {}", path.display(), e)))?;
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }
}

/// The three font programs the document is set in, read ahead of rendering.
#[derive(Debug, Clone)]
pub struct FontFiles {
    regular: FontFile,
    bold: FontFile,
    link: FontFile,
}

impl FontFiles {
    /// Read every configured font file. Fails on the first missing one.
    #[instrument(level = "info", skip_all)]
    pub async fn load(config: &FontConfig) -> Result<Self> {
        let files = Self {
            regular: FontFile::read(&config.regular).await?,
            bold: FontFile::read(&config.bold).await?,
            link: FontFile::read(&config.link).await?,
        };
        info!(
            regular = files.regular.bytes.len(),
            bold = files.bold.bytes.len(),
            link = files.link.bytes.len(),
            "Loaded font files"
        );
        Ok(files)
    }
}

/// An embedded font together with the metrics used to measure it.
struct LoadedFont<'a> {
    font: IndirectFontRef,
    /// `None` for the built-in PDF fonts, which carry no font program.
    metrics: Option<ttf_parser::Face<'a>>,
}

impl<'a> LoadedFont<'a> {
    fn embed(doc: &PdfDocumentReference, file: &'a FontFile) -> Result<Self> {
        let invalid = |e: String| DigestError::Export(format!("invalid font {}: {}", file.path.display(), e));
        let metrics = ttf_parser::Face::parse(&file.bytes, 0).map_err(|e| invalid(e.to_string()))?;
        let font = doc
            .add_external_font(file.bytes.as_slice())
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            font,
            metrics: Some(metrics),
        })
    }

    fn char_width_mm(&self, c: char, size_pt: f32) -> f32 {
        let em = match &self.metrics {
            Some(face) => advance_em(face, c),
            None => estimate_em(c),
        };
        em * size_pt * PT_TO_MM
    }

    fn text_width_mm(&self, text: &str, size_pt: f32) -> f32 {
        text.chars().map(|c| self.char_width_mm(c, size_pt)).sum()
    }
}

struct Fonts<'a> {
    regular: LoadedFont<'a>,
    bold: LoadedFont<'a>,
    link: LoadedFont<'a>,
}

impl<'a> Fonts<'a> {
    fn embed(doc: &PdfDocumentReference, files: &'a FontFiles) -> Result<Self> {
        Ok(Self {
            regular: LoadedFont::embed(doc, &files.regular)?,
            bold: LoadedFont::embed(doc, &files.bold)?,
            link: LoadedFont::embed(doc, &files.link)?,
        })
    }

    #[cfg(test)]
    fn builtin(doc: &PdfDocumentReference) -> Result<Self> {
        let font = |f| {
            doc.add_builtin_font(f)
                .map(|font| LoadedFont { font, metrics: None })
                .map_err(|e| DigestError::Export(e.to_string()))
        };
        Ok(Self {
            regular: font(BuiltinFont::Helvetica)?,
            bold: font(BuiltinFont::HelveticaBold)?,
            link: font(BuiltinFont::Helvetica)?,
        })
    }

    fn get(&self, kind: FontKind) -> &LoadedFont<'a> {
        match kind {
            FontKind::Regular => &self.regular,
            FontKind::Bold => &self.bold,
            FontKind::Link => &self.link,
        }
    }
}

/// Horizontal advance of `c` in ems. Characters the font has no glyph for
/// fall back to the `.notdef` advance, which is what the viewer draws.
fn advance_em(face: &ttf_parser::Face<'_>, c: char) -> f32 {
    let units_per_em = f32::from(face.units_per_em());
    face.glyph_index(c)
        .and_then(|glyph| face.glyph_hor_advance(glyph))
        .or_else(|| face.glyph_hor_advance(ttf_parser::GlyphId(0)))
        .map(|advance| f32::from(advance) / units_per_em)
        .unwrap_or_else(|| estimate_em(c))
}

/// Rough advance in ems for fonts without a measurable program.
/// Wide (East Asian) characters take a full em.
fn estimate_em(c: char) -> f32 {
    match c.width() {
        Some(2) => 1.0,
        Some(0) | None => 0.0,
        _ if c == ' ' => 0.28,
        _ => 0.72,
    }
}

/// Render `summary_text` into PDF bytes set in `fonts`.
///
/// This is CPU bound (font subsetting included); async callers should run it
/// on a blocking thread.
#[instrument(level = "info", skip_all)]
pub fn render_summary(summary_text: &str, fonts: &FontFiles) -> Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new("Summary", Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let fonts = Fonts::embed(&doc, fonts)?;
    render_blocks(doc, page, layer, fonts, &parse_summary(summary_text))
}

fn render_blocks(
    doc: PdfDocumentReference,
    page: PdfPageIndex,
    layer: PdfLayerIndex,
    fonts: Fonts<'_>,
    blocks: &[Block],
) -> Result<Vec<u8>> {
    let layer = doc.get_page(page).get_layer(layer);
    let mut writer = PageWriter {
        doc,
        layer,
        fonts,
        x: MARGIN_MM,
        y: MARGIN_MM,
        pages: 1,
    };

    for block in blocks {
        match block {
            Block::Heading(title) => {
                writer.write(LINE_HEIGHT_MM, title, &TextStyle::HEADING, None);
                writer.ln(10.0);
            }
            Block::Summary(content) => {
                writer.write(LINE_HEIGHT_MM, "Summary: ", &TextStyle::LABEL, None);
                writer.write(LINE_HEIGHT_MM, content, &TextStyle::BODY, None);
                writer.ln(LINE_HEIGHT_MM);
            }
            Block::ArticlesLabel => {
                writer.write(LINE_HEIGHT_MM, "Articles:", &TextStyle::LABEL, None);
                writer.ln(6.0);
            }
            Block::Link { title, url } => {
                writer.write(LINE_HEIGHT_MM, "• ", &TextStyle::BODY, None);
                writer.write(LINE_HEIGHT_MM, title, &TextStyle::LINK, Some(url));
                writer.ln(LINE_HEIGHT_MM);
            }
            Block::Bullet(text) => {
                writer.write(LINE_HEIGHT_MM, "• ", &TextStyle::BODY, None);
                writer.write(LINE_HEIGHT_MM, text, &TextStyle::BODY, None);
                writer.ln(LINE_HEIGHT_MM);
            }
            Block::Paragraph(text) => {
                writer.write(LINE_HEIGHT_MM, text, &TextStyle::BODY, None);
                writer.ln(LINE_HEIGHT_MM);
            }
        }
    }

    let pages = writer.pages;
    let bytes = writer
        .doc
        .save_to_bytes()
        .map_err(|e| DigestError::Export(e.to_string()))?;
    info!(pages, bytes = bytes.len(), blocks = blocks.len(), "Rendered summary PDF");
    Ok(bytes)
}

/// Layout cursor. `y` is measured from the top edge of the page.
struct PageWriter<'a> {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts<'a>,
    x: f32,
    y: f32,
    pages: usize,
}

impl PageWriter<'_> {
    fn write(&mut self, h: f32, text: &str, style: &TextStyle, link: Option<&str>) {
        let font = self.fonts.get(style.kind);
        let room = PAGE_WIDTH_MM - MARGIN_MM - self.x;
        let full = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
        let segments = wrap_text(text, room, full, |c| font.char_width_mm(c, style.size_pt));
        let widths: Vec<f32> = segments
            .iter()
            .map(|s| font.text_width_mm(s, style.size_pt))
            .collect();

        for (i, (segment, width)) in segments.iter().zip(widths).enumerate() {
            if i > 0 {
                self.ln(h);
            }
            self.break_page_if_needed(h);
            if !segment.is_empty() {
                self.place(segment, width, h, style, link);
            }
            self.x += width;
        }
    }

    fn ln(&mut self, h: f32) {
        self.x = MARGIN_MM;
        self.y += h;
    }

    fn break_page_if_needed(&mut self, h: f32) {
        if self.y + h > PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = MARGIN_MM;
            self.pages += 1;
        }
    }

    fn place(&self, segment: &str, width: f32, h: f32, style: &TextStyle, link: Option<&str>) {
        let size_mm = style.size_pt * PT_TO_MM;
        let baseline = PAGE_HEIGHT_MM - (self.y + h / 2.0 + 0.3 * size_mm);
        let (r, g, b) = style.rgb;

        if self.x + width > PAGE_WIDTH_MM - MARGIN_MM + 0.01 {
            // Only a single glyph wider than the text column gets here.
            warn!(segment, width, "Text overflows the right margin");
        }

        self.layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
        self.layer.use_text(
            segment,
            style.size_pt,
            Mm(self.x),
            Mm(baseline),
            &self.fonts.get(style.kind).font,
        );

        if style.underline {
            let under = baseline - 0.15 * size_mm;
            self.layer.set_outline_color(Color::Rgb(Rgb::new(r, g, b, None)));
            self.layer.set_outline_thickness(0.5);
            self.layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(self.x), Mm(under)), false),
                    (Point::new(Mm(self.x + width), Mm(under)), false),
                ],
                is_closed: false,
            });
        }

        if let Some(url) = link {
            self.layer.add_link_annotation(LinkAnnotation::new(
                Rect::new(
                    Mm(self.x),
                    Mm(baseline - 0.3 * size_mm),
                    Mm(self.x + width),
                    Mm(baseline + size_mm),
                ),
                Some(BorderArray::default()),
                Some(ColorArray::default()),
                Actions::uri(url.to_string()),
                Some(HighlightingMode::Invert),
            ));
        }

        self.layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    }
}

/// Break `text` into line segments measured with `char_width` (millimetres).
///
/// The first segment must fit in `first_room` (what is left of the current
/// line), the rest in `full_width`. Lines break at the last space when there
/// is one, otherwise mid-word, which is what scripts without spaces need.
/// Only a single character wider than `full_width` can exceed it.
fn wrap_text<F>(text: &str, first_room: f32, full_width: f32, char_width: F) -> Vec<String>
where
    F: Fn(char) -> f32,
{
    let measure = |s: &str| -> f32 { s.chars().map(&char_width).sum() };

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;
    let mut room = first_room;

    'chars: for c in text.chars() {
        let w = char_width(c);

        while current_width + w > room {
            if current.is_empty() {
                if room < full_width {
                    // Nothing fits on the partially used line; start a fresh one.
                    lines.push(String::new());
                    room = full_width;
                    continue;
                }
                break;
            }
            if c == ' ' {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
                room = full_width;
                continue 'chars;
            }
            let carry = match current.rfind(' ') {
                Some(pos) if pos > 0 => {
                    let tail = current[pos + 1..].to_string();
                    current.truncate(pos);
                    tail
                }
                _ => String::new(),
            };
            lines.push(std::mem::replace(&mut current, carry));
            current_width = measure(&current);
            room = full_width;
        }

        if c == ' ' && current.is_empty() && !lines.is_empty() {
            continue;
        }
        current.push(c);
        current_width += w;
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_WIDTH: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;

    const SYSTEM_FONTS: [&str; 3] = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    ];

    /// A TrueType file from the host, when one of the usual ones is installed.
    fn system_font() -> Option<FontFile> {
        SYSTEM_FONTS.iter().find_map(|path| {
            std::fs::read(path).ok().map(|bytes| FontFile {
                path: PathBuf::from(*path),
                bytes,
            })
        })
    }

    fn render_with_builtin(text: &str) -> Vec<u8> {
        let (doc, page, layer) =
            PdfDocument::new("Summary", Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let fonts = Fonts::builtin(&doc).unwrap();
        render_blocks(doc, page, layer, fonts, &parse_summary(text)).unwrap()
    }

    fn estimated(size_pt: f32) -> impl Fn(char) -> f32 {
        move |c| estimate_em(c) * size_pt * PT_TO_MM
    }

    #[test]
    fn test_wrap_short_text_single_line() {
        let lines = wrap_text("hello world", 190.0, 190.0, estimated(12.0));
        assert_eq!(lines, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_wrap_breaks_at_spaces() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let width = estimated(12.0);
        let lines = wrap_text(text, 40.0, 40.0, &width);

        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), text);
        for line in &lines {
            let w: f32 = line.chars().map(&width).sum();
            assert!(w <= 40.0 + 0.01, "line too wide: {line}");
            assert!(!line.starts_with(' '));
        }
    }

    #[test]
    fn test_wrap_breaks_wide_text_without_spaces() {
        let text = "가나다라마바사아자차카타파하".repeat(3);
        let width = estimated(12.0);
        let lines = wrap_text(&text, 50.0, 50.0, &width);

        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), text);
        for line in &lines {
            assert!(line.chars().map(&width).sum::<f32>() <= 50.0 + 0.01);
        }
    }

    #[test]
    fn test_wrap_moves_to_fresh_line_when_no_room() {
        let lines = wrap_text("word", 0.5, 190.0, estimated(12.0));
        assert_eq!(lines, vec![String::new(), "word".to_string()]);
    }

    #[test]
    fn test_wrap_follows_supplied_metrics() {
        // Capitals three times as wide as everything else.
        let width = |c: char| if c.is_ascii_uppercase() { 3.0 } else { 1.0 };
        let text = "MICROSOFT and NVIDIA WIDEN their AI WORKLOAD deals";
        let lines = wrap_text(text, 40.0, 40.0, width);

        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), text);
        for line in &lines {
            assert!(line.chars().map(width).sum::<f32>() <= 40.0, "line too wide: {line}");
        }
    }

    #[test]
    fn test_wrap_overlong_word_is_split() {
        let width = |_: char| 1.0;
        let lines = wrap_text("ab abcdefghijklmnop", 10.0, 10.0, width);
        assert_eq!(lines, vec!["ab", "abcdefghij", "klmnop"]);
    }

    #[test]
    fn test_all_caps_headline_fits_with_font_metrics() {
        let Some(file) = system_font() else {
            eprintln!("no system TrueType font found; skipping");
            return;
        };
        let face = ttf_parser::Face::parse(&file.bytes, 0).unwrap();
        let width = |c: char| advance_em(&face, c) * HEADING_SIZE_PT * PT_TO_MM;

        let headline = "NVIDIA AND MICROSOFT WIDEN AI WORKLOAD DEALS AS WASHINGTON WEIGHS \
                        NEW EXPORT CONTROLS ON ADVANCED SEMICONDUCTORS AND WIDE MEMORY MODULES";
        let lines = wrap_text(headline, FULL_WIDTH, FULL_WIDTH, width);

        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), headline);
        for line in &lines {
            let real: f32 = line.chars().map(width).sum();
            assert!(real <= FULL_WIDTH + 0.01, "{real}mm line runs past the margin: {line}");
        }
    }

    #[test]
    fn test_font_metrics_differ_from_estimate_for_capitals() {
        let Some(file) = system_font() else {
            eprintln!("no system TrueType font found; skipping");
            return;
        };
        let face = ttf_parser::Face::parse(&file.bytes, 0).unwrap();
        assert!(advance_em(&face, 'W') > advance_em(&face, 'i'));
        assert!(advance_em(&face, 'M') > 0.0);
    }

    #[test]
    fn test_render_with_embedded_font() {
        let Some(file) = system_font() else {
            eprintln!("no system TrueType font found; skipping");
            return;
        };
        let files = FontFiles {
            regular: file.clone(),
            bold: file.clone(),
            link: file,
        };
        let text = "## Topic 1: NVIDIA AND MICROSOFT WIDEN AI WORKLOAD DEALS ACROSS THREE CONTINENTS\n\
                    **Summary:** Demand grew.\n**Articles:**\n- [Chip curbs](https://r.example/1)";
        let bytes = render_summary(text, &files).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_produces_pdf() {
        let text = "## Topic 1: Chips\n**Summary:** Demand grew.\n**Articles:**\n- [Chip curbs](https://r.example/1)\nClosing note";
        let bytes = render_with_builtin(text);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_long_summary_paginates() {
        let mut text = String::new();
        for i in 1..=60 {
            text.push_str(&format!("## Topic {i}: Heading\n**Summary:** {}\n", "word ".repeat(40)));
        }
        let bytes = render_with_builtin(&text);
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_missing_font_is_an_export_error() {
        let fonts = FontConfig {
            regular: "/nonexistent/NanumGothic.ttf".into(),
            ..FontConfig::default()
        };
        let err = FontFiles::load(&fonts).await.unwrap_err();
        assert!(matches!(err, DigestError::Export(_)));
        assert!(err.to_string().contains("NanumGothic.ttf"));
    }

    #[test]
    fn test_invalid_font_file_is_an_export_error() {
        let files = FontFiles {
            regular: FontFile {
                path: PathBuf::from("broken.ttf"),
                bytes: b"not a font".to_vec(),
            },
            bold: FontFile {
                path: PathBuf::from("bold.ttf"),
                bytes: Vec::new(),
            },
            link: FontFile {
                path: PathBuf::from("link.ttf"),
                bytes: Vec::new(),
            },
        };
        let err = render_summary("## Topic 1: x", &files).unwrap_err();
        assert!(err.to_string().contains("broken.ttf"));
    }
}
