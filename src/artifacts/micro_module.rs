//! Two-slide micro-modules for cluster-level teacher training.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use super::{discard_orphan, ExportError};
use crate::advice::{resolve, topic_display_name, ResolvedAdvice, TemplateTable};
use crate::db::repository::{get_or_create_cluster, insert_micro_module};
use crate::models::MicroModule;
use crate::render::{
    filename_timestamp, sanitize_filename_part, Deck, DeckRenderer, RenderError, Slide,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedModule {
    pub module: MicroModule,
    pub file_name: String,
}

/// Opening script a teacher can read aloud. Topics without a dedicated
/// script get one built from the first advice step.
pub fn classroom_script(topic: &str, first_step: &str) -> String {
    match topic {
        "subtraction-borrowing" => "\"Today we'll practice subtraction with borrowing. \
            Take out your pebbles. Let's show 13-7 together. Count 13 pebbles. \
            Now, can we take away 7 from the 3 we have? No! So we need to borrow \
            from the tens place...\""
            .to_string(),
        "fractions-conceptual" => "\"Let's explore fractions! Take your paper and fold it \
            in half. How many equal parts? That's right - 2 parts. Each part is 1/2. \
            Now fold again. How many parts now? 4 parts - each is 1/4...\""
            .to_string(),
        "multiplication-tables" => "\"Let's sing the 2s! 2, 4, 6, 8... Now let's show it \
            with dots. Draw 2 rows of 4 dots. How many total? Count with me: 2, 4, 6, 8!\""
            .to_string(),
        _ => format!("\"Let's start: {first_step}\""),
    }
}

fn module_title(topic: &str) -> String {
    format!("{} - Micro Module", topic_display_name(topic))
}

fn build_deck(title: &str, cluster: &str, topic: &str, advice: &ResolvedAdvice) -> Deck {
    let mut actions = Slide::new(title)
        .text(format!("For: {cluster}"))
        .text(format!("Topic: {}", topic_display_name(topic)))
        .heading("Quick Action Steps");
    for step in &advice.steps {
        actions = actions.bullet(step.clone());
    }

    let first_step = advice.steps.first().map(String::as_str).unwrap_or_default();
    let guide = Slide::new("Implementation Guide")
        .heading("Sample Classroom Script")
        .text(classroom_script(topic, first_step))
        .heading("Materials Needed")
        .bullet(advice.materials.clone())
        .heading("Time Required")
        .bullet(advice.duration.clone())
        .heading("Support Available")
        .bullet("Contact your CRP")
        .bullet("WhatsApp support")
        .bullet(format!("Demo video: {}", advice.media_link));

    Deck {
        title: title.to_string(),
        slides: vec![actions, guide],
    }
}

/// Render a micro-module for `topic` in `cluster` and record it.
///
/// Advice comes from the template table, so unknown topics get the
/// catch-all steps under their own title.
pub fn generate_micro_module(
    conn: &Connection,
    renderer: &dyn DeckRenderer,
    templates: &TemplateTable,
    exports_dir: &Path,
    cluster: &str,
    topic: &str,
    now: DateTime<Utc>,
) -> Result<GeneratedModule, ExportError> {
    let cluster = cluster.trim();
    let topic = topic.trim();
    let advice = resolve(topic, templates);
    let title = module_title(topic);
    let deck = build_deck(&title, cluster, topic, &advice);

    let file_name = format!(
        "module_{}_{}_{}.{}",
        sanitize_filename_part(cluster),
        sanitize_filename_part(topic),
        filename_timestamp(now),
        renderer.extension()
    );
    std::fs::create_dir_all(exports_dir).map_err(RenderError::from)?;
    let path = exports_dir.join(&file_name);
    renderer.render(&deck, &path)?;

    let recorded = get_or_create_cluster(conn, cluster).and_then(|cluster_row| {
        let module = MicroModule {
            id: Uuid::new_v4(),
            title,
            cluster_id: cluster_row.id,
            topic_tag: topic.to_string(),
            content_text: advice.advice_text(),
            slides_path: path.to_string_lossy().into_owned(),
            created_at: now,
        };
        insert_micro_module(conn, &module).map(|_| module)
    });

    let module = match recorded {
        Ok(module) => module,
        Err(e) => {
            discard_orphan(&path);
            return Err(e.into());
        }
    };

    tracing::info!(
        module_id = %module.id,
        topic = %module.topic_tag,
        file = %file_name,
        "Micro-module generated"
    );
    Ok(GeneratedModule { module, file_name })
}
