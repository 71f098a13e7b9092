//! `POST /api/lfa/export`: Logical Framework Analysis export.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::{require_text, ApiContext};
use crate::artifacts::{export_lfa, export_url, LfaRequest};

#[derive(Debug, Serialize)]
pub struct LfaExportResponse {
    pub export_url: String,
    pub lfa_id: String,
}

pub async fn export(
    State(ctx): State<ApiContext>,
    Json(body): Json<LfaRequest>,
) -> Result<Json<LfaExportResponse>, ApiError> {
    require_text(&body.title, "Please give your plan a title")?;
    require_text(&body.problem_statement, "Please describe the problem")?;
    require_text(&body.student_change, "Please describe the desired student change")?;

    let conn = ctx.open_db()?;
    let export = export_lfa(
        &conn,
        ctx.core.renderer(),
        &ctx.core.config.exports_dir,
        &body,
        chrono::Utc::now(),
    )?;

    Ok(Json(LfaExportResponse {
        export_url: export_url(&ctx.core.config.base_url, &export.file_name),
        lfa_id: export.design.id.to_string(),
    }))
}
