use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::privacy::IdentityToken;

/// A finalized teacher submission.
///
/// Only the identity token is kept; the raw identifier is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherQuery {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub phone_hash: IdentityToken,
    pub cluster_id: Uuid,
    pub cluster_name: String,
    pub topic_tag: String,
    pub narrative_text: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    pub flagged_for_crp: bool,
    pub consent_given: bool,
}

/// Submission ready to be written. The store assigns id, cluster id and
/// timestamp; follow-up flags start cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeacherQuery {
    pub phone_hash: IdentityToken,
    pub cluster_name: String,
    pub topic_tag: String,
    pub narrative_text: String,
    pub consent_given: bool,
}
