//! Template table: one canned advice bundle per topic tag.
//!
//! The table is configuration. It is either the built-in set below or a
//! JSON file (an ordered array of bundles) loaded once at startup. Every
//! table must contain the catch-all topic, which is the fallback for any
//! topic not otherwise present.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catch-all topic tag.
pub const CATCH_ALL_TOPIC: &str = "general";

/// Prefix under which demo media is served.
pub const MEDIA_PREFIX: &str = "/media/";

/// Used when a bundle leaves materials or duration unset.
pub const UNSET_FIELD: &str = "varies";

/// Used when a bundle has no media file.
pub const DEFAULT_MEDIA_FILE: &str = "general.mp4";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template table has no catch-all 'general' entry")]
    MissingCatchAll,

    #[error("Duplicate template for topic '{0}'")]
    DuplicateTopic(String),

    #[error("Template file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Canned response for one topic, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateBundle {
    pub topic: String,
    /// Line-structured advice; each non-empty line is one step.
    pub advice: String,
    #[serde(default)]
    pub materials: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub demo_video: Option<String>,
}

/// Bundle ready for display: steps split out, defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAdvice {
    pub topic: String,
    pub steps: Vec<String>,
    pub materials: String,
    pub duration: String,
    pub media_link: String,
}

impl ResolvedAdvice {
    /// Steps joined with newlines for display.
    pub fn advice_text(&self) -> String {
        self.steps.join("\n")
    }
}

/// Ordered topic → bundle table. Order is the vocabulary order.
#[derive(Debug, Clone)]
pub struct TemplateTable {
    bundles: Vec<TemplateBundle>,
    catch_all: usize,
}

impl TemplateTable {
    /// Build a table, checking the catch-all exists and topics are unique.
    pub fn new(bundles: Vec<TemplateBundle>) -> Result<Self, TemplateError> {
        for (i, bundle) in bundles.iter().enumerate() {
            if bundles[..i].iter().any(|b| b.topic == bundle.topic) {
                return Err(TemplateError::DuplicateTopic(bundle.topic.clone()));
            }
        }
        let catch_all = bundles
            .iter()
            .position(|b| b.topic == CATCH_ALL_TOPIC)
            .ok_or(TemplateError::MissingCatchAll)?;
        Ok(Self { bundles, catch_all })
    }

    /// The built-in table. Its catch-all is the last entry.
    pub fn builtin() -> Self {
        let bundles = builtin_bundles();
        let catch_all = bundles.len() - 1;
        Self { bundles, catch_all }
    }

    /// Load from a JSON file. A missing file yields the built-in table;
    /// an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Template file not found, using built-in templates"
            );
            return Ok(Self::builtin());
        }
        let raw = std::fs::read_to_string(path)?;
        let bundles: Vec<TemplateBundle> = serde_json::from_str(&raw)?;
        let table = Self::new(bundles)?;
        tracing::info!(path = %path.display(), topics = table.len(), "Loaded template table");
        Ok(table)
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.bundles.iter().any(|b| b.topic == topic)
    }

    pub fn get(&self, topic: &str) -> Option<&TemplateBundle> {
        self.bundles.iter().find(|b| b.topic == topic)
    }

    /// Topic tags in vocabulary order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.bundles.iter().map(|b| b.topic.as_str())
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    fn catch_all(&self) -> &TemplateBundle {
        &self.bundles[self.catch_all]
    }
}

/// Resolve `topic` to display-ready advice, falling back to the catch-all.
pub fn resolve(topic: &str, templates: &TemplateTable) -> ResolvedAdvice {
    let bundle = templates.get(topic).unwrap_or_else(|| templates.catch_all());

    let steps = bundle
        .advice
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    let media_file = bundle
        .demo_video
        .as_deref()
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_MEDIA_FILE);

    ResolvedAdvice {
        topic: bundle.topic.clone(),
        steps,
        materials: bundle
            .materials
            .clone()
            .unwrap_or_else(|| UNSET_FIELD.to_string()),
        duration: bundle
            .duration
            .clone()
            .unwrap_or_else(|| UNSET_FIELD.to_string()),
        media_link: format!("{MEDIA_PREFIX}{media_file}"),
    }
}

/// Human-readable name for a topic tag.
pub fn topic_display_name(topic: &str) -> String {
    let known = match topic {
        "subtraction-borrowing" => Some("Subtraction with Borrowing"),
        "fractions-conceptual" => Some("Understanding Fractions"),
        "multiplication-tables" => Some("Multiplication Tables"),
        "classroom-management" => Some("Classroom Management"),
        "parent-engagement" => Some("Parent Engagement"),
        "reading-fluency" => Some("Reading Fluency"),
        "absenteeism" => Some("Student Attendance"),
        "assessment-formative" => Some("Formative Assessment"),
        "differentiation" => Some("Differentiated Instruction"),
        "general" => Some("General Support"),
        _ => None,
    };
    if let Some(name) = known {
        return name.to_string();
    }

    topic
        .split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ═══════════════════════════════════════════════════════════
// Built-in templates
// ═══════════════════════════════════════════════════════════

fn bundle(
    topic: &str,
    advice: &str,
    materials: &str,
    demo_video: &str,
    duration: &str,
) -> TemplateBundle {
    TemplateBundle {
        topic: topic.to_string(),
        advice: advice.to_string(),
        materials: Some(materials.to_string()),
        duration: Some(duration.to_string()),
        demo_video: Some(demo_video.to_string()),
    }
}

fn builtin_bundles() -> Vec<TemplateBundle> {
    vec![
        bundle(
            "subtraction-borrowing",
            "Try this 3-step pebble activity:\n\
             1. Use 10 pebbles in groups. Show 13-7 concretely.\n\
             2. When borrowing, physically move 1 group of 10 to ones place.\n\
             3. Practice with zero: 40-7 requires 'opening' the 4 tens.",
            "pebbles, place-value chart",
            "subtraction-borrowing.mp4",
            "15 min",
        ),
        bundle(
            "fractions-conceptual",
            "Build fraction understanding:\n\
             1. Use paper folding: fold paper into halves, quarters.\n\
             2. Draw and shade: 'Show me 3/4 of this rectangle'\n\
             3. Compare fractions using same-size circles.",
            "paper, colored pencils",
            "fractions-basics.mp4",
            "20 min",
        ),
        bundle(
            "multiplication-tables",
            "Make times tables stick:\n\
             1. Use skip counting songs (2s, 5s, 10s)\n\
             2. Array method: draw 3 rows of 4 dots\n\
             3. Daily 5-minute practice with flashcards",
            "flashcards, grid paper",
            "multiplication-basics.mp4",
            "10 min",
        ),
        bundle(
            "classroom-management",
            "Improve classroom flow:\n\
             1. Start with clear signal (clap pattern) for attention\n\
             2. Use transition songs between activities\n\
             3. Assign classroom helpers (materials, attendance)",
            "none needed",
            "classroom-management.mp4",
            "ongoing",
        ),
        bundle(
            "parent-engagement",
            "Bring parents into learning:\n\
             1. Send weekly 2-sentence SMS with home activity\n\
             2. Monthly community meeting with student demo\n\
             3. Create simple home learning kit (cards, number line)",
            "SMS, learning kit template",
            "parent-engagement.mp4",
            "weekly",
        ),
        bundle(
            "reading-fluency",
            "Build reading fluency:\n\
             1. Daily 10-min paired reading (stronger with weaker)\n\
             2. Use leveled readers at 95% accuracy level\n\
             3. Track words per minute weekly",
            "leveled readers, tracking sheet",
            "reading-fluency.mp4",
            "10 min daily",
        ),
        bundle(
            "absenteeism",
            "Address attendance:\n\
             1. Home visit to understand barriers (work, transport)\n\
             2. Celebrate 100% attendance monthly\n\
             3. Connect family with block resource person",
            "attendance register",
            "attendance-strategies.mp4",
            "ongoing",
        ),
        bundle(
            "assessment-formative",
            "Use quick formative checks:\n\
             1. Exit ticket: 1 question on today's lesson\n\
             2. Thumbs up/down for understanding\n\
             3. Mini whiteboard responses (whole class)",
            "exit slips, mini whiteboards",
            "formative-assessment.mp4",
            "5 min",
        ),
        bundle(
            "differentiation",
            "Differentiate instruction:\n\
             1. Group by readiness: 3 levels for same activity\n\
             2. Use station rotation (teacher, peer, independent)\n\
             3. Provide choice: students pick from 2-3 activities",
            "leveled materials, station cards",
            "differentiation.mp4",
            "plan 20 min",
        ),
        bundle(
            CATCH_ALL_TOPIC,
            "Thank you for reaching out! Here are general tips:\n\
             1. Break down the challenge into small steps\n\
             2. Use concrete materials when possible\n\
             3. Connect with your CRP for classroom visit support",
            UNSET_FIELD,
            "general-support.mp4",
            UNSET_FIELD,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(topic: &str, advice: &str) -> TemplateBundle {
        TemplateBundle {
            topic: topic.into(),
            advice: advice.into(),
            materials: None,
            duration: None,
            demo_video: None,
        }
    }

    #[test]
    fn builtin_has_catch_all_and_unique_topics() {
        let table = TemplateTable::new(builtin_bundles()).unwrap();
        assert!(table.contains(CATCH_ALL_TOPIC));
        assert_eq!(table.len(), 10);
        assert_eq!(table.catch_all, TemplateTable::builtin().catch_all);
    }

    #[test]
    fn builtin_vocabulary_order_is_stable() {
        let table = TemplateTable::builtin();
        let topics: Vec<&str> = table.topics().collect();
        assert_eq!(topics.first(), Some(&"subtraction-borrowing"));
        assert_eq!(topics.last(), Some(&CATCH_ALL_TOPIC));
    }

    #[test]
    fn resolve_known_topic_splits_steps() {
        let advice = resolve("subtraction-borrowing", &TemplateTable::builtin());
        assert_eq!(advice.topic, "subtraction-borrowing");
        assert_eq!(advice.steps.len(), 4);
        assert_eq!(advice.steps[0], "Try this 3-step pebble activity:");
        assert!(advice.steps[3].starts_with("3. Practice with zero"));
        assert_eq!(advice.materials, "pebbles, place-value chart");
        assert_eq!(advice.duration, "15 min");
        assert_eq!(advice.media_link, "/media/subtraction-borrowing.mp4");
    }

    #[test]
    fn resolve_unknown_topic_uses_catch_all() {
        let table = TemplateTable::builtin();
        let advice = resolve("astrophysics", &table);
        assert_eq!(advice, resolve(CATCH_ALL_TOPIC, &table));
        assert_eq!(advice.topic, CATCH_ALL_TOPIC);
        assert_eq!(advice.media_link, "/media/general-support.mp4");
    }

    #[test]
    fn resolve_applies_defaults_for_unset_fields() {
        let table = TemplateTable::new(vec![minimal(CATCH_ALL_TOPIC, "Only step")]).unwrap();
        let advice = resolve(CATCH_ALL_TOPIC, &table);
        assert_eq!(advice.materials, UNSET_FIELD);
        assert_eq!(advice.duration, UNSET_FIELD);
        assert_eq!(advice.media_link, "/media/general.mp4");
    }

    #[test]
    fn resolve_drops_blank_lines_and_trims() {
        let table =
            TemplateTable::new(vec![minimal(CATCH_ALL_TOPIC, "  first  \n\n   \nsecond\n")])
                .unwrap();
        let advice = resolve(CATCH_ALL_TOPIC, &table);
        assert_eq!(advice.steps, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(advice.advice_text(), "first\nsecond");
    }

    #[test]
    fn table_without_catch_all_rejected() {
        let result = TemplateTable::new(vec![minimal("fractions-conceptual", "x")]);
        assert!(matches!(result, Err(TemplateError::MissingCatchAll)));
    }

    #[test]
    fn duplicate_topics_rejected() {
        let result = TemplateTable::new(vec![
            minimal(CATCH_ALL_TOPIC, "a"),
            minimal(CATCH_ALL_TOPIC, "b"),
        ]);
        assert!(matches!(result, Err(TemplateError::DuplicateTopic(t)) if t == CATCH_ALL_TOPIC));
    }

    #[test]
    fn load_missing_file_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let table = TemplateTable::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(table.len(), TemplateTable::builtin().len());
    }

    #[test]
    fn load_json_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        std::fs::write(
            &path,
            r#"[
                {"topic": "noise", "advice": "Clap twice", "materials": "hands"},
                {"topic": "general", "advice": "Ask your CRP"}
            ]"#,
        )
        .unwrap();

        let table = TemplateTable::load(&path).unwrap();
        assert_eq!(table.topics().collect::<Vec<_>>(), vec!["noise", "general"]);
        assert_eq!(resolve("noise", &table).materials, "hands");
    }

    #[test]
    fn load_malformed_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(TemplateTable::load(&path), Err(TemplateError::Json(_))));
    }

    #[test]
    fn load_without_catch_all_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        std::fs::write(&path, r#"[{"topic": "noise", "advice": "Clap"}]"#).unwrap();
        assert!(matches!(
            TemplateTable::load(&path),
            Err(TemplateError::MissingCatchAll)
        ));
    }

    #[test]
    fn display_names() {
        assert_eq!(topic_display_name("absenteeism"), "Student Attendance");
        assert_eq!(topic_display_name("peer-tutoring_groups"), "Peer Tutoring Groups");
    }
}
