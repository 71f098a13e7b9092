//! Logical Framework Analysis export.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use super::{discard_orphan, ExportError};
use crate::db::repository::insert_lfa_design;
use crate::models::LfaDesign;
use crate::render::{
    filename_timestamp, sanitize_filename_part, Deck, DeckRenderer, RenderError, Slide,
};

/// Practice changes beyond this many are kept in the record but left off the slide.
pub const MAX_PRACTICE_CHANGES_ON_SLIDE: usize = 3;
const MAX_TITLE_CHARS_IN_FILENAME: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LfaRequest {
    pub title: String,
    pub problem_statement: String,
    pub student_change: String,
    #[serde(default)]
    pub stakeholders: Vec<String>,
    #[serde(default)]
    pub practice_changes: Vec<String>,
    #[serde(default)]
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LfaExport {
    pub design: LfaDesign,
    pub file_name: String,
}

fn build_deck(request: &LfaRequest) -> Deck {
    let mut overview = Slide::new(request.title.clone())
        .heading("Problem")
        .text(request.problem_statement.clone())
        .heading("Desired Student Change")
        .text(request.student_change.clone())
        .heading("Key Stakeholders");
    for stakeholder in &request.stakeholders {
        overview = overview.bullet(stakeholder.clone());
    }
    overview = overview.heading("Practice Changes");
    for change in request.practice_changes.iter().take(MAX_PRACTICE_CHANGES_ON_SLIDE) {
        overview = overview.bullet(change.clone());
    }

    let mut indicators = Slide::new("Key Indicators & Measurement").heading("Success Indicators");
    for (i, indicator) in request.indicators.iter().enumerate() {
        indicators = indicators.text(format!("{}. {indicator}", i + 1));
    }

    Deck {
        title: request.title.clone(),
        slides: vec![overview, indicators],
    }
}

fn lfa_file_name(title: &str, now: DateTime<Utc>, extension: &str) -> String {
    let short: String = title.trim().chars().take(MAX_TITLE_CHARS_IN_FILENAME).collect();
    format!(
        "lfa_{}_{}.{extension}",
        sanitize_filename_part(&short),
        filename_timestamp(now)
    )
}

/// Render an LFA design and record it with its export path.
pub fn export_lfa(
    conn: &Connection,
    renderer: &dyn DeckRenderer,
    exports_dir: &Path,
    request: &LfaRequest,
    now: DateTime<Utc>,
) -> Result<LfaExport, ExportError> {
    let file_name = lfa_file_name(&request.title, now, renderer.extension());
    std::fs::create_dir_all(exports_dir).map_err(RenderError::from)?;
    let path = exports_dir.join(&file_name);
    renderer.render(&build_deck(request), &path)?;

    let design = LfaDesign {
        id: Uuid::new_v4(),
        title: request.title.trim().to_string(),
        problem_statement: request.problem_statement.clone(),
        student_change: request.student_change.clone(),
        stakeholders: request.stakeholders.clone(),
        practice_changes: request.practice_changes.clone(),
        indicators: request.indicators.clone(),
        exported_path: Some(path.to_string_lossy().into_owned()),
        created_at: now,
    };
    if let Err(e) = insert_lfa_design(conn, &design) {
        discard_orphan(&path);
        return Err(e.into());
    }

    tracing::info!(lfa_id = %design.id, file = %file_name, "LFA exported");
    Ok(LfaExport { design, file_name })
}
