use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::cluster::{get_or_create_cluster, parse_uuid};
use crate::advice::QueryStore;
use crate::db::DatabaseError;
use crate::models::{NewTeacherQuery, TeacherQuery};
use crate::privacy::IdentityToken;

const QUERY_COLUMNS: &str = "q.id, q.phone_hash, q.cluster_id, c.name, q.topic_tag,
     q.narrative_text, q.created_at, q.resolved, q.flagged_for_crp, q.consent_given";

type QueryRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    DateTime<Utc>,
    i32,
    i32,
    i32,
);

fn read_query_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueryRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn query_from_row(row: QueryRow) -> Result<TeacherQuery, DatabaseError> {
    let (
        id,
        phone_hash,
        cluster_id,
        cluster_name,
        topic_tag,
        narrative_text,
        created_at,
        resolved,
        flagged,
        consent,
    ) = row;
    Ok(TeacherQuery {
        id: parse_uuid("teacher_queries.id", &id)?,
        phone_hash: IdentityToken::from_stored(phone_hash),
        cluster_id: parse_uuid("teacher_queries.cluster_id", &cluster_id)?,
        cluster_name,
        topic_tag,
        narrative_text,
        created_at,
        resolved: resolved != 0,
        flagged_for_crp: flagged != 0,
        consent_given: consent != 0,
    })
}

/// Persist a finalized submission. The cluster is created on first use,
/// in the same transaction as the submission row.
pub fn insert_query(
    conn: &Connection,
    new: &NewTeacherQuery,
) -> Result<TeacherQuery, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let cluster = get_or_create_cluster(&tx, &new.cluster_name)?;
    let record = TeacherQuery {
        id: Uuid::new_v4(),
        phone_hash: new.phone_hash.clone(),
        cluster_id: cluster.id,
        cluster_name: cluster.name,
        topic_tag: new.topic_tag.clone(),
        narrative_text: new.narrative_text.clone(),
        created_at: Utc::now(),
        resolved: false,
        flagged_for_crp: false,
        consent_given: new.consent_given,
    };

    tx.execute(
        "INSERT INTO teacher_queries (id, phone_hash, cluster_id, topic_tag, narrative_text,
         created_at, resolved, flagged_for_crp, consent_given)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.id.to_string(),
            record.phone_hash.as_str(),
            record.cluster_id.to_string(),
            record.topic_tag,
            record.narrative_text,
            record.created_at,
            record.resolved as i32,
            record.flagged_for_crp as i32,
            record.consent_given as i32,
        ],
    )?;
    tx.commit()?;
    Ok(record)
}

pub fn get_query(conn: &Connection, id: &Uuid) -> Result<Option<TeacherQuery>, DatabaseError> {
    let sql = format!(
        "SELECT {QUERY_COLUMNS} FROM teacher_queries q
         JOIN clusters c ON c.id = q.cluster_id
         WHERE q.id = ?1"
    );
    let row = conn
        .query_row(&sql, params![id.to_string()], read_query_row)
        .optional()?;
    row.map(query_from_row).transpose()
}

/// Whether any finalized submission exists for this identity.
pub fn query_exists_for_token(
    conn: &Connection,
    token: &IdentityToken,
) -> Result<bool, DatabaseError> {
    let exists: i32 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM teacher_queries WHERE phone_hash = ?1)",
        params![token.as_str()],
        |row| row.get(0),
    )?;
    Ok(exists != 0)
}

/// Returns `true` if a row was removed.
pub fn delete_query(conn: &Connection, id: &Uuid) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM teacher_queries WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(deleted > 0)
}

/// Mark a submission for follow-up by a cluster resource person.
pub fn flag_query(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    set_query_flag(conn, id, "flagged_for_crp")
}

pub fn resolve_query(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    set_query_flag(conn, id, "resolved")
}

fn set_query_flag(
    conn: &Connection,
    id: &Uuid,
    column: &'static str,
) -> Result<(), DatabaseError> {
    let sql = format!("UPDATE teacher_queries SET {column} = 1 WHERE id = ?1");
    let updated = conn.execute(&sql, params![id.to_string()])?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "TeacherQuery".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// `QueryStore` over one SQLite connection.
pub struct SqliteQueryStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteQueryStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl QueryStore for SqliteQueryStore<'_> {
    fn exists_for_token(&self, token: &IdentityToken) -> Result<bool, DatabaseError> {
        query_exists_for_token(self.conn, token)
    }

    fn insert(&self, query: NewTeacherQuery) -> Result<TeacherQuery, DatabaseError> {
        insert_query(self.conn, &query)
    }

    fn get(&self, id: &Uuid) -> Result<Option<TeacherQuery>, DatabaseError> {
        get_query(self.conn, id)
    }

    fn delete(&self, id: &Uuid) -> Result<bool, DatabaseError> {
        delete_query(self.conn, id)
    }
}
