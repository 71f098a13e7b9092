//! Record-store seam used by the submission flow.

use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{NewTeacherQuery, TeacherQuery};
use crate::privacy::IdentityToken;

/// Durable storage of finalized submissions.
///
/// `exists_for_token` is the only history the consent gate consults, so an
/// implementation must answer it from the same data `insert` writes to.
pub trait QueryStore {
    /// Whether any finalized submission exists under `token`.
    fn exists_for_token(&self, token: &IdentityToken) -> Result<bool, DatabaseError>;

    /// Persist a new submission and return it with its assigned id.
    fn insert(&self, query: NewTeacherQuery) -> Result<TeacherQuery, DatabaseError>;

    fn get(&self, id: &Uuid) -> Result<Option<TeacherQuery>, DatabaseError>;

    /// Hard delete. Returns `true` if a record was removed.
    fn delete(&self, id: &Uuid) -> Result<bool, DatabaseError>;
}
