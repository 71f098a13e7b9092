//! Generated training artifacts: micro-module decks and LFA exports.
//!
//! Each generator renders a deck into the exports directory first and
//! then records it. A failed write after rendering removes the file.

pub mod lfa;
pub mod micro_module;

pub use lfa::{export_lfa, LfaExport, LfaRequest, MAX_PRACTICE_CHANGES_ON_SLIDE};
pub use micro_module::{classroom_script, generate_micro_module, GeneratedModule};

use std::path::Path;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::render::RenderError;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Public download URL for an exported file.
pub fn export_url(base_url: &str, file_name: &str) -> String {
    format!("{}/exports/{file_name}", base_url.trim_end_matches('/'))
}

/// Remove a rendered file whose record could not be written.
fn discard_orphan(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "Could not remove orphaned export");
    }
}
