//! Teacher endpoints.
//!
//! - `POST /api/teacher/query`: submit a classroom problem
//! - `GET|DELETE /api/teacher/query/:id`: detail / right-to-deletion
//! - `POST /api/teacher/flag`, `POST /api/teacher/resolve`: follow-up flags
//! - `GET /api/teacher/sample-response`: advice preview, no identity
//! - `GET /api/teacher/topics`, `GET /api/teacher/suggest`: vocabulary helpers

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::advice::{
    lookup_advice_sample, submit, suggest_topics, topic_display_name, QueryStore,
    SubmissionOutcome, SubmissionRequest,
};
use crate::api::error::ApiError;
use crate::api::types::{parse_record_id, require_text, ApiContext};
use crate::db::repository::{flag_query, resolve_query, SqliteQueryStore};
use crate::models::TeacherQuery;

const CONSENT_PENDING_ID: &str = "consent-pending";
const SAMPLE_ID: &str = "sample-mock-id";
const DEFAULT_SAMPLE_TOPIC: &str = "subtraction-borrowing";

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub text: String,
    /// First-time submitters pass the consent gate only when this is `true`.
    #[serde(default)]
    pub consent_given: bool,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub id: String,
    pub advice: String,
    pub module_sample_link: String,
    pub consent_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_tag: Option<String>,
}

/// `POST /api/teacher/query`
pub async fn submit_query(
    State(ctx): State<ApiContext>,
    Json(body): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let cluster = require_text(&body.cluster, "Please add your cluster name")?;
    let text = require_text(&body.text, "Please describe your classroom problem")?;

    let conn = ctx.open_db()?;
    let store = SqliteQueryStore::new(&conn);
    let outcome = submit(
        &store,
        ctx.core.advice_context(),
        SubmissionRequest {
            identifier: body.phone.as_deref(),
            cluster,
            narrative: text,
            explicit_topic: body.topic.as_deref(),
            consent_flag: body.consent_given,
        },
    )?;

    let response = match &outcome {
        SubmissionOutcome::ConsentPending { message } => QueryResponse {
            id: CONSENT_PENDING_ID.to_string(),
            advice: (*message).to_string(),
            module_sample_link: String::new(),
            consent_required: true,
            topic_tag: None,
        },
        SubmissionOutcome::Finalized { record, advice } => QueryResponse {
            id: record.id.to_string(),
            advice: advice.advice_text(),
            module_sample_link: advice.media_link.clone(),
            consent_required: false,
            topic_tag: Some(record.topic_tag.clone()),
        },
    };
    Ok(Json(response))
}

/// `GET /api/teacher/query/:id`: the token is never serialized.
pub async fn get_query(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<TeacherQuery>, ApiError> {
    let id = parse_record_id(&id, "Query")?;
    let conn = ctx.open_db()?;
    SqliteQueryStore::new(&conn)
        .get(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Query not found".into()))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
    pub id: String,
}

/// `DELETE /api/teacher/query/:id`: unconditional hard delete.
pub async fn delete_query(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = parse_record_id(&id, "Query")?;
    let conn = ctx.open_db()?;
    if !SqliteQueryStore::new(&conn).delete(&id)? {
        return Err(ApiError::NotFound("Query not found".into()));
    }
    tracing::info!(query_id = %id, "Query deleted on request");
    Ok(Json(DeleteResponse {
        message: "Query deleted successfully",
        id: id.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct FlagRequest {
    pub query_id: String,
    /// Free-text note from the teacher; accepted but not stored.
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub query_id: String,
}

#[derive(Debug, Serialize)]
pub struct FlagResponse {
    pub success: bool,
    pub message: &'static str,
    pub query_id: String,
}

/// `POST /api/teacher/flag`: mark for cluster resource person follow-up.
pub async fn flag(
    State(ctx): State<ApiContext>,
    Json(body): Json<FlagRequest>,
) -> Result<Json<FlagResponse>, ApiError> {
    let id = parse_record_id(&body.query_id, "Query")?;
    let conn = ctx.open_db()?;
    flag_query(&conn, &id)?;
    tracing::info!(query_id = %id, has_reason = body.reason.is_some(), "Query flagged for CRP");
    Ok(Json(FlagResponse {
        success: true,
        message: "Query flagged for CRP",
        query_id: id.to_string(),
    }))
}

/// `POST /api/teacher/resolve`
pub async fn resolve(
    State(ctx): State<ApiContext>,
    Json(body): Json<ResolveRequest>,
) -> Result<Json<FlagResponse>, ApiError> {
    let id = parse_record_id(&body.query_id, "Query")?;
    let conn = ctx.open_db()?;
    resolve_query(&conn, &id)?;
    tracing::info!(query_id = %id, "Query resolved");
    Ok(Json(FlagResponse {
        success: true,
        message: "Query marked as resolved",
        query_id: id.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SampleParams {
    pub topic: Option<String>,
}

/// `GET /api/teacher/sample-response`
pub async fn sample_response(
    State(ctx): State<ApiContext>,
    Query(params): Query<SampleParams>,
) -> Json<QueryResponse> {
    let topic = params
        .topic
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_SAMPLE_TOPIC);
    let advice = lookup_advice_sample(topic, &ctx.core.templates);
    Json(QueryResponse {
        id: SAMPLE_ID.to_string(),
        advice: advice.advice_text(),
        module_sample_link: advice.media_link.clone(),
        consent_required: false,
        topic_tag: Some(advice.topic),
    })
}

#[derive(Debug, Serialize)]
pub struct TopicInfo {
    pub tag: String,
    pub display_name: String,
}

/// `GET /api/teacher/topics`: vocabulary in table order.
pub async fn topics(State(ctx): State<ApiContext>) -> Json<Vec<TopicInfo>> {
    Json(
        ctx.core
            .templates
            .topics()
            .map(|tag| TopicInfo {
                tag: tag.to_string(),
                display_name: topic_display_name(tag),
            })
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    pub text: String,
}

/// `GET /api/teacher/suggest`: autosuggest while typing.
pub async fn suggest(
    State(ctx): State<ApiContext>,
    Query(params): Query<SuggestParams>,
) -> Json<Vec<TopicInfo>> {
    Json(
        suggest_topics(&params.text, &ctx.core.keywords)
            .into_iter()
            .map(|tag| TopicInfo {
                display_name: topic_display_name(&tag),
                tag,
            })
            .collect(),
    )
}
