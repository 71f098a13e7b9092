use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generated two-slide training micro-module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroModule {
    pub id: Uuid,
    pub title: String,
    pub cluster_id: Uuid,
    pub topic_tag: String,
    pub content_text: String,
    pub slides_path: String,
    pub created_at: DateTime<Utc>,
}

/// Logical Framework Analysis design exported as a deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LfaDesign {
    pub id: Uuid,
    pub title: String,
    pub problem_statement: String,
    pub student_change: String,
    pub stakeholders: Vec<String>,
    pub practice_changes: Vec<String>,
    pub indicators: Vec<String>,
    pub exported_path: Option<String>,
    pub created_at: DateTime<Utc>,
}
