//! Submission flow: hash identity, gate on consent, classify, resolve,
//! and persist exactly one record on the finalized path.
//!
//! ```text
//! Start → hash → check consent ─┬─ required & not given → ConsentPending
//!                               └─ satisfied → classify → resolve → write → Finalized
//! ```
//!
//! Request validation (non-empty cluster and text) happens at the
//! boundary before `submit` runs.

use thiserror::Error;

use super::classify::{detect_topic, KeywordTable};
use super::store::QueryStore;
use super::templates::{resolve, ResolvedAdvice, TemplateTable};
use crate::config::SecretSalt;
use crate::db::DatabaseError;
use crate::models::{NewTeacherQuery, TeacherQuery};
use crate::privacy::{requires_consent, token_for, ConsentDecision, CONSENT_MESSAGE};

#[derive(Error, Debug)]
pub enum SubmitError {
    /// History lookup failed; consent state is unknown.
    #[error("Could not check submission history: {0}")]
    Lookup(#[source] DatabaseError),

    /// Record write failed; advice must not be returned as a success.
    #[error("Could not save submission: {0}")]
    Write(#[source] DatabaseError),
}

/// Configuration the flow reads on every call. Borrowed from the
/// long-lived service state.
#[derive(Debug, Clone, Copy)]
pub struct AdviceContext<'a> {
    pub salt: &'a SecretSalt,
    pub templates: &'a TemplateTable,
    pub keywords: &'a KeywordTable,
}

/// One incoming query, already validated by the boundary layer.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionRequest<'a> {
    /// Raw sender identifier. Blank or absent gets an ephemeral one.
    pub identifier: Option<&'a str>,
    pub cluster: &'a str,
    pub narrative: &'a str,
    pub explicit_topic: Option<&'a str>,
    pub consent_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// First-time submitter without opt-in. Nothing classified or stored.
    ConsentPending { message: &'static str },
    /// Record persisted; advice ready for display.
    Finalized {
        record: TeacherQuery,
        advice: ResolvedAdvice,
    },
}

impl SubmissionOutcome {
    pub fn consent_required(&self) -> bool {
        matches!(self, SubmissionOutcome::ConsentPending { .. })
    }

    /// Text to show the submitter: the consent prompt or the joined steps.
    pub fn display_text(&self) -> String {
        match self {
            SubmissionOutcome::ConsentPending { message } => (*message).to_string(),
            SubmissionOutcome::Finalized { advice, .. } => advice.advice_text(),
        }
    }

    /// Media link, empty while consent is pending.
    pub fn media_link(&self) -> &str {
        match self {
            SubmissionOutcome::ConsentPending { .. } => "",
            SubmissionOutcome::Finalized { advice, .. } => &advice.media_link,
        }
    }

    pub fn record(&self) -> Option<&TeacherQuery> {
        match self {
            SubmissionOutcome::ConsentPending { .. } => None,
            SubmissionOutcome::Finalized { record, .. } => Some(record),
        }
    }
}

/// Handle one incoming query end to end.
///
/// At most one `insert` is attempted, and only after the consent gate
/// passes. A lookup failure never counts as "consent required" and a write
/// failure never yields advice.
pub fn submit<S>(
    store: &S,
    ctx: AdviceContext<'_>,
    request: SubmissionRequest<'_>,
) -> Result<SubmissionOutcome, SubmitError>
where
    S: QueryStore + ?Sized,
{
    let token = token_for(request.identifier, ctx.salt);

    let consent_required =
        requires_consent(&token, |t| store.exists_for_token(t)).map_err(SubmitError::Lookup)?;

    let first_time = match ConsentDecision::evaluate(consent_required, request.consent_flag) {
        ConsentDecision::Prompt => {
            tracing::info!(token = token.short(), "Consent required; submission deflected");
            return Ok(SubmissionOutcome::ConsentPending {
                message: CONSENT_MESSAGE,
            });
        }
        ConsentDecision::Proceed { first_time } => first_time,
    };

    let topic = detect_topic(
        request.narrative,
        request.explicit_topic,
        ctx.templates,
        ctx.keywords,
    );
    let advice = resolve(&topic, ctx.templates);

    let record = store
        .insert(NewTeacherQuery {
            phone_hash: token,
            cluster_name: request.cluster.trim().to_string(),
            topic_tag: topic,
            narrative_text: request.narrative.trim().to_string(),
            // Consent was given now or on an earlier finalized submission.
            consent_given: true,
        })
        .map_err(SubmitError::Write)?;

    tracing::info!(
        query_id = %record.id,
        token = record.phone_hash.short(),
        topic = %record.topic_tag,
        first_time,
        "Submission finalized"
    );

    Ok(SubmissionOutcome::Finalized { record, advice })
}

/// Stateless preview of the advice for a topic. No identity, no consent,
/// no persistence. Unknown topics resolve to the catch-all.
pub fn lookup_advice_sample(topic: &str, templates: &TemplateTable) -> ResolvedAdvice {
    resolve(topic.trim(), templates)
}
