use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::cluster::parse_uuid;
use crate::db::DatabaseError;
use crate::models::{LfaDesign, MicroModule};

pub fn insert_micro_module(
    conn: &Connection,
    module: &MicroModule,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO micro_modules
         (id, title, cluster_id, topic_tag, content_text, slides_path, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            module.id.to_string(),
            module.title,
            module.cluster_id.to_string(),
            module.topic_tag,
            module.content_text,
            module.slides_path,
            module.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_micro_module(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<MicroModule>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, title, cluster_id, topic_tag, content_text, slides_path, created_at
             FROM micro_modules WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, DateTime<Utc>>(6)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, title, cluster_id, topic_tag, content_text, slides_path, created_at)| {
        Ok(MicroModule {
            id: parse_uuid("micro_modules.id", &id)?,
            title,
            cluster_id: parse_uuid("micro_modules.cluster_id", &cluster_id)?,
            topic_tag,
            content_text,
            slides_path,
            created_at,
        })
    })
    .transpose()
}

fn list_to_json(field: &str, items: &[String]) -> Result<String, DatabaseError> {
    serde_json::to_string(items).map_err(|e| DatabaseError::InvalidValue {
        field: field.into(),
        value: e.to_string(),
    })
}

fn list_from_json(field: &str, raw: &str) -> Result<Vec<String>, DatabaseError> {
    serde_json::from_str(raw).map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: raw.into(),
    })
}

pub fn insert_lfa_design(conn: &Connection, design: &LfaDesign) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO lfa_designs (id, title, problem_statement, student_change, stakeholders_json,
         practice_changes_json, indicators_json, exported_path, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            design.id.to_string(),
            design.title,
            design.problem_statement,
            design.student_change,
            list_to_json("stakeholders", &design.stakeholders)?,
            list_to_json("practice_changes", &design.practice_changes)?,
            list_to_json("indicators", &design.indicators)?,
            design.exported_path,
            design.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_lfa_design(conn: &Connection, id: &Uuid) -> Result<Option<LfaDesign>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, title, problem_statement, student_change, stakeholders_json,
             practice_changes_json, indicators_json, exported_path, created_at
             FROM lfa_designs WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, DateTime<Utc>>(8)?,
                ))
            },
        )
        .optional()?;

    let Some((
        id,
        title,
        problem,
        change,
        stakeholders,
        practices,
        indicators,
        exported_path,
        created_at,
    )) = row
    else {
        return Ok(None);
    };

    Ok(Some(LfaDesign {
        id: parse_uuid("lfa_designs.id", &id)?,
        title,
        problem_statement: problem,
        student_change: change,
        stakeholders: list_from_json("stakeholders_json", &stakeholders)?,
        practice_changes: list_from_json("practice_changes_json", &practices)?,
        indicators: list_from_json("indicators_json", &indicators)?,
        exported_path,
        created_at,
    }))
}
