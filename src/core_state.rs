//! Transport-agnostic service state.
//!
//! `CoreState` is built once at startup from `Config` and shared behind
//! an `Arc` by the HTTP layer. It holds only read-only values; each
//! request opens its own database connection.

use std::sync::Arc;

use rusqlite::Connection;

use crate::advice::{AdviceContext, KeywordTable, TemplateError, TemplateTable};
use crate::config::Config;
use crate::db;
use crate::render::{DeckRenderer, PdfDeckRenderer};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

pub struct CoreState {
    pub config: Config,
    pub templates: TemplateTable,
    pub keywords: KeywordTable,
    renderer: Arc<dyn DeckRenderer>,
}

impl CoreState {
    pub fn new(
        config: Config,
        templates: TemplateTable,
        keywords: KeywordTable,
        renderer: Arc<dyn DeckRenderer>,
    ) -> Self {
        for (keyword, topic) in keywords.entries() {
            if !templates.contains(topic) {
                tracing::warn!(
                    keyword,
                    topic,
                    "Keyword maps to a topic without a template; it will never match"
                );
            }
        }
        Self {
            config,
            templates,
            keywords,
            renderer,
        }
    }

    /// Load templates named by the configuration and use the PDF renderer.
    pub fn from_config(config: Config) -> Result<Self, CoreError> {
        let templates = match &config.templates_path {
            Some(path) => TemplateTable::load(path)?,
            None => TemplateTable::builtin(),
        };
        Ok(Self::new(
            config,
            templates,
            KeywordTable::default(),
            Arc::new(PdfDeckRenderer::new()),
        ))
    }

    /// Create data directories and bring the schema up to date.
    pub fn initialize(&self) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.config.exports_dir)?;
        std::fs::create_dir_all(&self.config.media_dir)?;
        let conn = self.open_db()?;
        let version = db::get_current_version(&conn);
        tracing::info!(
            db = %self.config.db_path.display(),
            schema_version = version,
            topics = self.templates.len(),
            "Core state initialized"
        );
        Ok(())
    }

    /// Open a connection to the service database (migrations applied).
    pub fn open_db(&self) -> Result<Connection, CoreError> {
        db::open_database(&self.config.db_path).map_err(CoreError::Database)
    }

    pub fn advice_context(&self) -> AdviceContext<'_> {
        AdviceContext {
            salt: &self.config.secret_salt,
            templates: &self.templates,
            keywords: &self.keywords,
        }
    }

    pub fn renderer(&self) -> &dyn DeckRenderer {
        self.renderer.as_ref()
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Template error: {0}")]
    Templates(#[from] TemplateError),
    #[error("Cannot prepare data directory: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_in(dir: &std::path::Path) -> CoreState {
        CoreState::from_config(Config::for_data_dir(dir, "test-salt")).unwrap()
    }

    #[test]
    fn initialize_creates_directories_and_database() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        state.initialize().unwrap();
        assert!(state.config.exports_dir.is_dir());
        assert!(state.config.media_dir.is_dir());
        assert!(state.config.db_path.exists());
    }

    #[test]
    fn open_db_returns_migrated_connection() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        let conn = state.open_db().unwrap();
        assert_eq!(db::get_current_version(&conn), 1);
    }

    #[test]
    fn builtin_templates_without_path() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        assert_eq!(state.templates.len(), TemplateTable::builtin().len());
        assert_eq!(state.renderer().extension(), "pdf");
    }

    #[test]
    fn malformed_template_file_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        std::fs::write(&path, "{ not json").unwrap();
        let mut config = Config::for_data_dir(dir.path(), "test-salt");
        config.templates_path = Some(path);
        let result = CoreState::from_config(config);
        assert!(matches!(result, Err(CoreError::Templates(_))));
    }

    #[test]
    fn advice_context_uses_configured_salt() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        assert_eq!(state.advice_context().salt.expose(), "test-salt");
    }
}
