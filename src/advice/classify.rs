//! Topic classification by ordered keyword precedence.
//!
//! The keyword table is an ordered list and its order is the contract:
//! the first keyword (in table order) found anywhere in the lowercased
//! text decides the topic. Longer or more specific matches do not win.

use serde::Serialize;

use super::templates::{TemplateTable, CATCH_ALL_TOPIC};

/// Maximum number of topics returned by `suggest_topics`.
pub const MAX_SUGGESTIONS: usize = 3;

/// Default precedence table. Keep entries grouped by topic; moving an
/// entry changes classification for texts matching several keywords.
pub const DEFAULT_KEYWORDS: &[(&str, &str)] = &[
    ("subtract", "subtraction-borrowing"),
    ("borrow", "subtraction-borrowing"),
    ("tens place", "subtraction-borrowing"),
    ("zero", "subtraction-borrowing"),
    ("fraction", "fractions-conceptual"),
    ("half", "fractions-conceptual"),
    ("quarter", "fractions-conceptual"),
    ("multiply", "multiplication-tables"),
    ("times table", "multiplication-tables"),
    ("multiplication", "multiplication-tables"),
    ("discipline", "classroom-management"),
    ("noisy", "classroom-management"),
    ("attention", "classroom-management"),
    ("management", "classroom-management"),
    ("parent", "parent-engagement"),
    ("home", "parent-engagement"),
    ("family", "parent-engagement"),
    ("read", "reading-fluency"),
    ("reading", "reading-fluency"),
    ("fluency", "reading-fluency"),
    ("absent", "absenteeism"),
    ("attendance", "absenteeism"),
    ("missing", "absenteeism"),
    ("assess", "assessment-formative"),
    ("test", "assessment-formative"),
    ("check understanding", "assessment-formative"),
    ("different level", "differentiation"),
    ("mixed ability", "differentiation"),
    ("slow learner", "differentiation"),
];

/// Ordered (keyword, topic) pairs. Keywords are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordTable {
    entries: Vec<(String, String)>,
}

impl KeywordTable {
    /// Build from pairs, preserving the given order.
    pub fn new<K, T>(pairs: impl IntoIterator<Item = (K, T)>) -> Self
    where
        K: Into<String>,
        T: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, t)| (k.into().to_lowercase(), t.into()))
                .filter(|(k, _)| !k.is_empty())
                .collect(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, t)| (k.as_str(), t.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Topic of the first keyword contained in `lowered` whose topic is in
    /// `vocabulary`. Entries pointing outside the vocabulary never match.
    fn first_match(&self, lowered: &str, vocabulary: &TemplateTable) -> Option<&str> {
        self.entries()
            .find(|(keyword, topic)| lowered.contains(keyword) && vocabulary.contains(topic))
            .map(|(_, topic)| topic)
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().copied())
    }
}

/// Resolve the topic tag for a query.
///
/// 1. An explicit topic that is in the vocabulary wins without looking at the text.
/// 2. Otherwise the first keyword in table order found in the text decides,
///    skipping keywords whose topic is not in the vocabulary.
/// 3. Otherwise the catch-all tag.
///
/// Unknown explicit topics are ignored, never rejected.
pub fn detect_topic(
    text: &str,
    explicit_topic: Option<&str>,
    vocabulary: &TemplateTable,
    keywords: &KeywordTable,
) -> String {
    if let Some(topic) = explicit_topic.map(str::trim).filter(|t| vocabulary.contains(t)) {
        return topic.to_string();
    }

    let lowered = text.to_lowercase();
    keywords
        .first_match(&lowered, vocabulary)
        .unwrap_or(CATCH_ALL_TOPIC)
        .to_string()
}

/// Distinct topics whose keywords occur in `text`, in table order,
/// capped at `MAX_SUGGESTIONS`. Used for autosuggest while typing.
pub fn suggest_topics(text: &str, keywords: &KeywordTable) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut topics: Vec<String> = Vec::new();
    for (keyword, topic) in keywords.entries() {
        if topics.len() == MAX_SUGGESTIONS {
            break;
        }
        if lowered.contains(keyword) && !topics.iter().any(|t| t == topic) {
            topics.push(topic.to_string());
        }
    }
    topics
}
