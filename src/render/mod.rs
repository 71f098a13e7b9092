//! Slide-deck artifacts.
//!
//! Callers describe a deck as titled slides of headings, bullets and text;
//! a `DeckRenderer` turns it into a file. Rendering failures are returned,
//! never replaced with canned output.

mod pdf;

pub use pdf::PdfDeckRenderer;

use std::path::Path;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Cannot write artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// One line of slide content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlideLine {
    Heading(String),
    Bullet(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    pub title: String,
    pub lines: Vec<SlideLine>,
}

impl Slide {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn heading(mut self, text: impl Into<String>) -> Self {
        self.lines.push(SlideLine::Heading(text.into()));
        self
    }

    pub fn bullet(mut self, text: impl Into<String>) -> Self {
        self.lines.push(SlideLine::Bullet(text.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.lines.push(SlideLine::Text(text.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    pub title: String,
    pub slides: Vec<Slide>,
}

/// Produces a binary artifact for a deck at a given path.
pub trait DeckRenderer: Send + Sync {
    /// File extension of produced artifacts, without the dot.
    fn extension(&self) -> &'static str;

    fn render(&self, deck: &Deck, path: &Path) -> Result<(), RenderError>;
}

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("Invalid filename regex pattern"));

/// Replace every character outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_filename_part(raw: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(raw.trim(), "_").into_owned()
}

/// Compact UTC timestamp used in artifact file names.
pub fn filename_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}
