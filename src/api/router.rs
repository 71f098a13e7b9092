//! HTTP router.
//!
//! JSON endpoints live under `/api/`; `/` and `/health` sit at the root;
//! rendered decks and demo media are served as static files from
//! `/exports` and `/media`.
//!
//! Layers (outermost → innermost): CORS → audit logger → handler.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the full service router.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);
    build_router(ctx)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/teacher/query", post(endpoints::teacher::submit_query))
        .route(
            "/teacher/query/:id",
            get(endpoints::teacher::get_query).delete(endpoints::teacher::delete_query),
        )
        .route("/teacher/flag", post(endpoints::teacher::flag))
        .route("/teacher/resolve", post(endpoints::teacher::resolve))
        .route(
            "/teacher/sample-response",
            get(endpoints::teacher::sample_response),
        )
        .route("/teacher/topics", get(endpoints::teacher::topics))
        .route("/teacher/suggest", get(endpoints::teacher::suggest))
        .route("/diet/aggregate", get(endpoints::diet::aggregate))
        .route("/diet/trends", get(endpoints::diet::trends))
        .route(
            "/diet/generate-module",
            post(endpoints::diet::generate_module),
        )
        .route("/lfa/export", post(endpoints::lfa::export))
        .route("/webhook/whatsapp", post(endpoints::webhook::whatsapp));

    let config = &ctx.core.config;
    let exports = ServeDir::new(&config.exports_dir);
    let media = ServeDir::new(&config.media_dir);
    let cors = cors_layer(&config.cors_origins);

    Router::new()
        .route("/", get(endpoints::health::banner))
        .route("/health", get(endpoints::health::check))
        .nest("/api", api)
        .with_state(ctx)
        .nest_service("/exports", exports)
        .nest_service("/media", media)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::privacy::hash_identifier;

    /// Core state rooted in a fresh temp directory. Keep the `TempDir`
    /// alive for the duration of the test.
    fn test_core() -> (Arc<CoreState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let core = CoreState::from_config(Config::for_data_dir(dir.path(), "test-salt")).unwrap();
        core.initialize().unwrap();
        (Arc::new(core), dir)
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn submit(
        core: &Arc<CoreState>,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        send(api_router(core.clone()), post_json("/api/teacher/query", body)).await
    }

    #[tokio::test]
    async fn banner_and_health() {
        let (core, _dir) = test_core();
        let (status, json) = send(api_router(core.clone()), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["message"].as_str().unwrap().contains("EduPulse"));

        let (status, json) = send(api_router(core), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["database"], true);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (core, _dir) = test_core();
        let response = api_router(core).oneshot(get("/api/nonexistent")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn submit_returns_advice_and_stores_hash_only() {
        let (core, _dir) = test_core();
        let (status, json) = submit(
            &core,
            serde_json::json!({
                "phone": "+919876543210",
                "cluster": "Cluster A",
                "text": "Students confused about borrowing with zero in tens place",
                "consent_given": true
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["consent_required"], false);
        assert_eq!(json["topic_tag"], "subtraction-borrowing");
        assert!(!json["advice"].as_str().unwrap().is_empty());
        assert!(json["module_sample_link"].as_str().unwrap().starts_with("/media/"));

        let conn = core.open_db().unwrap();
        let stored: String = conn
            .query_row("SELECT phone_hash FROM teacher_queries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, hash_identifier("+919876543210", &core.config.secret_salt).as_str());
    }

    #[tokio::test]
    async fn first_time_without_consent_is_pending() {
        let (core, _dir) = test_core();
        let (status, json) = submit(
            &core,
            serde_json::json!({
                "phone": "+910000000001",
                "cluster": "Cluster A",
                "text": "noisy class",
                "consent_given": false
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], "consent-pending");
        assert_eq!(json["consent_required"], true);
        assert_eq!(json["module_sample_link"], "");
        assert!(json.get("topic_tag").is_none());

        let count: i64 = core
            .open_db()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM teacher_queries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn missing_consent_field_counts_as_not_given() {
        let (core, _dir) = test_core();
        let (status, json) = submit(
            &core,
            serde_json::json!({
                "phone": "+910000009999",
                "cluster": "Cluster A",
                "text": "noisy class"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["consent_required"], true);
        assert_eq!(json["id"], "consent-pending");

        let count: i64 = core
            .open_db()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM teacher_queries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn blank_fields_get_friendly_422() {
        let (core, _dir) = test_core();
        let body = serde_json::json!({"cluster": "  ", "text": "noisy"});
        let (status, json) = submit(&core, body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["message"], "Please add your cluster name");

        let (status, json) = submit(&core, serde_json::json!({"cluster": "A", "text": ""})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["message"], "Please describe your classroom problem");
    }

    #[tokio::test]
    async fn query_detail_flag_resolve_and_delete() {
        let (core, _dir) = test_core();
        let (_, json) = submit(
            &core,
            serde_json::json!({
                "phone": "+910000000002",
                "cluster": "Cluster B",
                "text": "parents never come",
                "consent_given": true
            }),
        )
        .await;
        let id = json["id"].as_str().unwrap().to_string();

        let detail_uri = format!("/api/teacher/query/{id}");
        let (status, detail) = send(api_router(core.clone()), get(&detail_uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["topic_tag"], "parent-engagement");
        assert_eq!(detail["cluster_name"], "Cluster B");
        assert!(detail.get("phone_hash").is_none());

        let (status, _) = send(
            api_router(core.clone()),
            post_json("/api/teacher/flag", serde_json::json!({"query_id": id, "reason": "visit"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(
            api_router(core.clone()),
            post_json("/api/teacher/resolve", serde_json::json!({"query_id": id})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, detail) = send(api_router(core.clone()), get(&detail_uri)).await;
        assert_eq!(detail["flagged_for_crp"], true);
        assert_eq!(detail["resolved"], true);

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/api/teacher/query/{id}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(api_router(core.clone()), delete).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(api_router(core), get(&detail_uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn flag_unknown_query_is_404() {
        let (core, _dir) = test_core();
        let (status, json) = send(
            api_router(core),
            post_json(
                "/api/teacher/flag",
                serde_json::json!({"query_id": uuid::Uuid::new_v4().to_string()}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn sample_response_defaults_and_falls_back() {
        let (core, _dir) = test_core();
        let (status, json) =
            send(api_router(core.clone()), get("/api/teacher/sample-response")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["topic_tag"], "subtraction-borrowing");

        let (_, json) =
            send(api_router(core), get("/api/teacher/sample-response?topic=astronomy")).await;
        assert_eq!(json["topic_tag"], "general");
    }

    #[tokio::test]
    async fn topics_and_suggestions() {
        let (core, _dir) = test_core();
        let (_, topics) = send(api_router(core.clone()), get("/api/teacher/topics")).await;
        let topics = topics.as_array().unwrap();
        assert!(topics.iter().any(|t| t["tag"] == "general"));

        let (_, suggestions) = send(
            api_router(core),
            get("/api/teacher/suggest?text=noisy%20kids%20cannot%20subtract"),
        )
        .await;
        let tags: Vec<&str> = suggestions
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["tag"].as_str().unwrap())
            .collect();
        assert_eq!(tags, vec!["subtraction-borrowing", "classroom-management"]);
    }

    #[tokio::test]
    async fn aggregate_and_trends() {
        let (core, _dir) = test_core();
        for (phone, cluster, text) in [
            ("+911", "Cluster A", "cannot subtract"),
            ("+912", "Cluster A", "noisy class"),
            ("+913", "Cluster B", "cannot subtract"),
        ] {
            submit(
                &core,
                serde_json::json!({
                    "phone": phone,
                    "cluster": cluster,
                    "text": text,
                    "consent_given": true
                }),
            )
            .await;
        }

        let uri = "/api/diet/aggregate?cluster=Cluster%20A";
        let (status, json) = send(api_router(core.clone()), get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_queries"], 2);
        assert_eq!(json["by_cluster"]["Cluster B"], 1);

        let (status, json) = send(api_router(core.clone()), get("/api/diet/trends")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 2);

        let (status, _) = send(api_router(core), get("/api/diet/trends?days=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn generate_module_and_download_it() {
        let (core, _dir) = test_core();
        let (status, json) = send(
            api_router(core.clone()),
            post_json(
                "/api/diet/generate-module",
                serde_json::json!({"cluster": "Cluster A", "topic": "fractions-conceptual"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["title"], "Understanding Fractions - Micro Module");
        let link = json["pptx_link"].as_str().unwrap();
        assert!(link
            .starts_with("http://127.0.0.1:8000/exports/module_Cluster_A_fractions-conceptual_"));

        let path = link.trim_start_matches("http://127.0.0.1:8000");
        let response = api_router(core).oneshot(get(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), 10 * 1024 * 1024).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn lfa_export_returns_url_and_id() {
        let (core, _dir) = test_core();
        let (status, json) = send(
            api_router(core.clone()),
            post_json(
                "/api/lfa/export",
                serde_json::json!({
                    "title": "Improve Subtraction",
                    "problem_statement": "Students struggle with borrowing",
                    "student_change": "Accurate 3-digit subtraction",
                    "stakeholders": ["Teachers", "CRPs"],
                    "practice_changes": ["Manipulatives"],
                    "indicators": ["80% accuracy"]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["export_url"].as_str().unwrap().contains("/exports/lfa_Improve_Subtraction_"));
        assert!(uuid::Uuid::parse_str(json["lfa_id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn lfa_export_requires_title() {
        let (core, _dir) = test_core();
        let (status, _) = send(
            api_router(core),
            post_json(
                "/api/lfa/export",
                serde_json::json!({
                    "title": " ",
                    "problem_statement": "p",
                    "student_change": "c",
                    "stakeholders": [],
                    "practice_changes": [],
                    "indicators": []
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn whatsapp_webhook_replies_with_twiml() {
        let (core, _dir) = test_core();
        let req = Request::builder()
            .method("POST")
            .uri("/api/webhook/whatsapp")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from("From=whatsapp%3A%2B919876543210&Body=cluster+b+kids+are+noisy"))
            .unwrap();
        let response = api_router(core.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/xml");
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let xml = String::from_utf8(body.to_vec()).unwrap();
        assert!(xml.contains("<Response><Message>"));
        assert!(xml.contains("Demo: http://localhost:5173/media/"));

        let conn = core.open_db().unwrap();
        let cluster: String = conn
            .query_row(
                "SELECT c.name FROM teacher_queries q JOIN clusters c ON c.id = q.cluster_id",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(cluster, "Cluster B");
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let (core, _dir) = test_core();
        let origin = core.config.cors_origins[0].clone();
        let req = Request::builder()
            .uri("/health")
            .header("Origin", &origin)
            .body(Body::empty())
            .unwrap();
        let response = api_router(core).oneshot(req).await.unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            origin.as_str()
        );
    }
}
