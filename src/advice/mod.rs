//! Advice engine: topic detection, template resolution, and the
//! submission flow that ties them to the privacy layer.

pub mod classify;
pub mod orchestrator;
pub mod store;
pub mod templates;

pub use classify::{detect_topic, suggest_topics, KeywordTable, DEFAULT_KEYWORDS, MAX_SUGGESTIONS};
pub use orchestrator::{
    lookup_advice_sample, submit, AdviceContext, SubmissionOutcome, SubmissionRequest, SubmitError,
};
pub use store::QueryStore;
pub use templates::{
    resolve, topic_display_name, ResolvedAdvice, TemplateBundle, TemplateError, TemplateTable,
    CATCH_ALL_TOPIC,
};
