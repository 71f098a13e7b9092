//! PDF rendering of decks via `printpdf`: one landscape page per slide,
//! with continuation pages when a slide overflows.

use std::io::BufWriter;
use std::path::Path;

use printpdf::*;

use super::{Deck, DeckRenderer, RenderError, SlideLine};

// 16:9 slide, 10in x 5.625in.
const PAGE_WIDTH_MM: f32 = 254.0;
const PAGE_HEIGHT_MM: f32 = 142.875;
const LEFT_MM: f32 = 18.0;
const TITLE_Y_MM: f32 = 126.0;
const BODY_TOP_MM: f32 = 110.0;
const BOTTOM_MM: f32 = 12.0;

const TITLE_PT: f32 = 22.0;
const HEADING_PT: f32 = 14.0;
const BODY_PT: f32 = 11.0;

const WRAP_BODY: usize = 100;
const WRAP_TITLE: usize = 60;

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDeckRenderer;

impl PdfDeckRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render the deck to PDF bytes.
    pub fn render_bytes(&self, deck: &Deck) -> Result<Vec<u8>, RenderError> {
        if deck.slides.is_empty() {
            return Err(RenderError::Pdf("Deck has no slides".into()));
        }

        let (doc, first_page, first_layer) = PdfDocument::new(
            &deck.title,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(format!("PDF font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Pdf(format!("PDF font error: {e}")))?;

        let mut first = Some((first_page, first_layer));
        for slide in &deck.slides {
            let (page, layer_idx) = first
                .take()
                .unwrap_or_else(|| doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1"));
            let mut layer = doc.get_page(page).get_layer(layer_idx);
            let mut y = draw_title(&layer, &slide.title, &bold);

            for line in &slide.lines {
                let (text, size, indent, step, face, gap_before) = match line {
                    SlideLine::Heading(t) => (t.as_str(), HEADING_PT, 0.0, 7.0, &bold, 3.0),
                    SlideLine::Bullet(t) => (t.as_str(), BODY_PT, 5.0, 5.5, &font, 0.0),
                    SlideLine::Text(t) => (t.as_str(), BODY_PT, 0.0, 5.5, &font, 0.0),
                };
                y -= gap_before;

                let prefixed = match line {
                    SlideLine::Bullet(_) => format!("- {text}"),
                    _ => text.to_string(),
                };
                for wrapped in wrap_text(&prefixed, WRAP_BODY) {
                    if y < BOTTOM_MM {
                        let (p, l) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
                        layer = doc.get_page(p).get_layer(l);
                        y = draw_title(&layer, &format!("{} (cont.)", slide.title), &bold);
                    }
                    layer.use_text(&wrapped, size, Mm(LEFT_MM + indent), Mm(y), face);
                    y -= step;
                }
            }
        }

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| RenderError::Pdf(format!("PDF save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| RenderError::Pdf(format!("PDF buffer error: {e}")))
    }
}

impl DeckRenderer for PdfDeckRenderer {
    fn extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, deck: &Deck, path: &Path) -> Result<(), RenderError> {
        let bytes = self.render_bytes(deck)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        tracing::debug!(path = %path.display(), slides = deck.slides.len(), "Deck rendered");
        Ok(())
    }
}

/// Draw a (possibly wrapped) slide title; returns the y of the first body line.
fn draw_title(layer: &PdfLayerReference, title: &str, bold: &IndirectFontRef) -> f32 {
    let mut y = TITLE_Y_MM;
    for line in wrap_text(title, WRAP_TITLE) {
        layer.use_text(&line, TITLE_PT, Mm(LEFT_MM), Mm(y), bold);
        y -= 9.0;
    }
    y.min(BODY_TOP_MM)
}

/// Word-wraps text to fit within max_chars per line.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
