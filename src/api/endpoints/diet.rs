//! District Institute (DIET) dashboard endpoints.
//!
//! - `GET /api/diet/aggregate`: counts, breakdowns, recent samples
//! - `GET /api/diet/trends`: per-day topic counts
//! - `POST /api/diet/generate-module`: render a micro-module deck

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{require_text, ApiContext};
use crate::artifacts::{export_url, generate_micro_module};
use crate::dashboard::{
    self, AggregateFilter, AggregateReport, TrendPoint, DEFAULT_TREND_DAYS, MAX_TREND_DAYS,
};

/// `GET /api/diet/aggregate`
pub async fn aggregate(
    State(ctx): State<ApiContext>,
    Query(filter): Query<AggregateFilter>,
) -> Result<Json<AggregateReport>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(dashboard::aggregate(&conn, &filter)?))
}

#[derive(Debug, Deserialize)]
pub struct TrendParams {
    pub days: Option<u32>,
}

/// `GET /api/diet/trends`
pub async fn trends(
    State(ctx): State<ApiContext>,
    Query(params): Query<TrendParams>,
) -> Result<Json<Vec<TrendPoint>>, ApiError> {
    let days = params.days.unwrap_or(DEFAULT_TREND_DAYS);
    if days == 0 || days > MAX_TREND_DAYS {
        return Err(ApiError::BadRequest(format!(
            "days must be between 1 and {MAX_TREND_DAYS}"
        )));
    }
    let conn = ctx.open_db()?;
    Ok(Json(dashboard::topic_trends(&conn, days)?))
}

#[derive(Debug, Deserialize)]
pub struct ModuleRequest {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct ModuleResponse {
    pub module_id: String,
    pub pptx_link: String,
    pub title: String,
}

/// `POST /api/diet/generate-module`
///
/// The response keeps the `pptx_link` field name the dashboard reads;
/// it points at whatever artifact the renderer produced.
pub async fn generate_module(
    State(ctx): State<ApiContext>,
    Json(body): Json<ModuleRequest>,
) -> Result<Json<ModuleResponse>, ApiError> {
    let cluster = require_text(&body.cluster, "Please choose a cluster")?;
    let topic = require_text(&body.topic, "Please choose a topic")?;

    let conn = ctx.open_db()?;
    let generated = generate_micro_module(
        &conn,
        ctx.core.renderer(),
        &ctx.core.templates,
        &ctx.core.config.exports_dir,
        cluster,
        topic,
        chrono::Utc::now(),
    )?;

    Ok(Json(ModuleResponse {
        module_id: generated.module.id.to_string(),
        pptx_link: export_url(&ctx.core.config.base_url, &generated.file_name),
        title: generated.module.title,
    }))
}
