//! WhatsApp (Twilio) webhook adaptation.
//!
//! Twilio posts `From`/`Body` form fields and expects a TwiML document
//! back. Every inbound message is handled as a consented submission; a
//! bare "YES" is acknowledged but not stored, because there is no
//! submission to anchor it to.

use serde::Deserialize;

use crate::advice::{submit, AdviceContext, QueryStore, SubmissionOutcome, SubmissionRequest};

const SENDER_PREFIX: &str = "whatsapp:";
pub const DEFAULT_CLUSTER: &str = "General";

/// Cluster phrases recognised in message text, checked in order.
const CLUSTER_PHRASES: &[(&str, &str)] = &[
    ("cluster a", "Cluster A"),
    ("cluster b", "Cluster B"),
    ("cluster c", "Cluster C"),
];

pub const OPT_IN_REPLY: &str = "Thank you for opting in! You can now send your classroom \
questions and receive immediate support. How can I help you today?";
pub const EMPTY_MESSAGE_REPLY: &str = "Please describe your classroom problem and we'll send \
you step-by-step support.";
pub const FAILURE_REPLY: &str = "Sorry, I encountered an error. Please try again or contact support.";

/// Twilio webhook form body.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Body")]
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundIntent {
    OptIn,
    Empty,
    Query {
        identifier: String,
        cluster: &'static str,
        text: String,
    },
}

/// Cluster named in the text, or the default cluster.
pub fn infer_cluster(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    CLUSTER_PHRASES
        .iter()
        .find(|(phrase, _)| lowered.contains(phrase))
        .map(|(_, cluster)| *cluster)
        .unwrap_or(DEFAULT_CLUSTER)
}

pub fn parse_inbound(message: &InboundMessage) -> InboundIntent {
    let text = message.body.trim();
    if text.eq_ignore_ascii_case("yes") {
        return InboundIntent::OptIn;
    }
    if text.is_empty() {
        return InboundIntent::Empty;
    }

    let sender = message.from.trim();
    let identifier = sender.strip_prefix(SENDER_PREFIX).unwrap_or(sender).trim();
    InboundIntent::Query {
        identifier: identifier.to_string(),
        cluster: infer_cluster(text),
        text: text.to_string(),
    }
}

/// Produce the reply text for one inbound message.
///
/// Submission failures are logged and answered with an apology; the
/// caller always gets something to send back.
pub fn handle_inbound<S>(
    store: &S,
    ctx: AdviceContext<'_>,
    frontend_url: &str,
    message: &InboundMessage,
) -> String
where
    S: QueryStore + ?Sized,
{
    let (identifier, cluster, text) = match parse_inbound(message) {
        InboundIntent::OptIn => return OPT_IN_REPLY.to_string(),
        InboundIntent::Empty => return EMPTY_MESSAGE_REPLY.to_string(),
        InboundIntent::Query {
            identifier,
            cluster,
            text,
        } => (identifier, cluster, text),
    };

    let request = SubmissionRequest {
        identifier: Some(identifier.as_str()),
        cluster,
        narrative: &text,
        explicit_topic: None,
        consent_flag: true,
    };

    match submit(store, ctx, request) {
        Ok(SubmissionOutcome::ConsentPending { message }) => message.to_string(),
        Ok(outcome @ SubmissionOutcome::Finalized { .. }) => format!(
            "🎓 {}\n\n📹 Demo: {}{}\n\n💬 Reply 'CRP' to flag for classroom visit\n📚 Reply 'MODULE' to request training material",
            outcome.display_text(),
            frontend_url.trim_end_matches('/'),
            outcome.media_link(),
        ),
        Err(e) => {
            tracing::error!(error = %e, "WhatsApp submission failed");
            FAILURE_REPLY.to_string()
        }
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap reply text in a single-message TwiML response.
pub fn twiml_message(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape_xml(text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::{KeywordTable, TemplateTable};
    use crate::config::SecretSalt;
    use crate::db::repository::{query_exists_for_token, SqliteQueryStore};
    use crate::db::sqlite::open_memory_database;
    use crate::privacy::hash_identifier;

    fn message(from: &str, body: &str) -> InboundMessage {
        InboundMessage {
            from: from.into(),
            body: body.into(),
        }
    }

    #[test]
    fn yes_is_opt_in_in_any_case() {
        assert_eq!(parse_inbound(&message("whatsapp:+91", " yes ")), InboundIntent::OptIn);
        assert_eq!(parse_inbound(&message("whatsapp:+91", "YES")), InboundIntent::OptIn);
    }

    #[test]
    fn sender_prefix_is_stripped() {
        let intent = parse_inbound(&message("whatsapp:+919876543210", "noisy class"));
        let InboundIntent::Query { identifier, .. } = intent else {
            panic!("expected query");
        };
        assert_eq!(identifier, "+919876543210");
    }

    #[test]
    fn cluster_inferred_from_text() {
        assert_eq!(infer_cluster("I teach in Cluster B and kids are noisy"), "Cluster B");
        assert_eq!(infer_cluster("cluster c"), "Cluster C");
        assert_eq!(infer_cluster("no cluster named"), DEFAULT_CLUSTER);
    }

    #[test]
    fn blank_body_is_empty() {
        assert_eq!(parse_inbound(&message("whatsapp:+91", "   ")), InboundIntent::Empty);
    }

    #[test]
    fn twiml_escapes_markup() {
        let xml = twiml_message("a < b & \"c\"");
        assert!(xml.contains("<Message>a &lt; b &amp; &quot;c&quot;</Message>"));
        assert!(xml.starts_with("<?xml"));
    }

    #[test]
    fn message_submission_replies_with_advice_and_demo_link() {
        let conn = open_memory_database().unwrap();
        let store = SqliteQueryStore::new(&conn);
        let salt = SecretSalt::new("test-salt");
        let templates = TemplateTable::builtin();
        let keywords = KeywordTable::default();
        let ctx = AdviceContext {
            salt: &salt,
            templates: &templates,
            keywords: &keywords,
        };

        let reply = handle_inbound(
            &store,
            ctx,
            "http://localhost:5173/",
            &message("whatsapp:+919876543210", "Cluster A: students cannot subtract"),
        );
        assert!(reply.contains("📹 Demo: http://localhost:5173/media/"));
        assert!(reply.contains("Reply 'CRP'"));

        let token = hash_identifier("+919876543210", &salt);
        assert!(query_exists_for_token(&conn, &token).unwrap());
        let cluster: String = conn
            .query_row(
                "SELECT c.name FROM teacher_queries q JOIN clusters c ON c.id = q.cluster_id",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(cluster, "Cluster A");
    }

    #[test]
    fn opt_in_persists_nothing() {
        let conn = open_memory_database().unwrap();
        let store = SqliteQueryStore::new(&conn);
        let salt = SecretSalt::new("test-salt");
        let templates = TemplateTable::builtin();
        let keywords = KeywordTable::default();
        let ctx = AdviceContext {
            salt: &salt,
            templates: &templates,
            keywords: &keywords,
        };

        let reply = handle_inbound(&store, ctx, "http://x", &message("whatsapp:+91", "YES"));
        assert_eq!(reply, OPT_IN_REPLY);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM teacher_queries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
