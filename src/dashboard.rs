//! Dashboard aggregation over stored teacher queries.
//!
//! Counts by topic and cluster, recent samples, and per-day topic trends.
//! Filters compose with AND; `by_topic` honours only the cluster filter and
//! `by_cluster` only the topic filter, so each breakdown shows the spread
//! along its own axis.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repository::find_cluster_by_name;
use crate::db::DatabaseError;

/// Number of recent queries included in a report.
pub const SAMPLE_LIMIT: usize = 10;
/// Sample narratives longer than this are cut and suffixed with "...".
pub const SAMPLE_TEXT_CHARS: usize = 200;
pub const DEFAULT_TREND_DAYS: u32 = 30;
pub const MAX_TREND_DAYS: u32 = 365;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Raw filter values as received from the dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregateFilter {
    pub cluster: Option<String>,
    pub topic: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleQuery {
    pub id: Uuid,
    pub cluster_id: Uuid,
    pub cluster_name: String,
    pub topic_tag: String,
    pub narrative_text: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    pub flagged_for_crp: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    pub total_queries: i64,
    pub by_topic: BTreeMap<String, i64>,
    pub by_cluster: BTreeMap<String, i64>,
    pub sample_queries: Vec<SampleQuery>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub topic: String,
    pub count: i64,
}

/// Upper date bound. A bare date covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpperBound {
    Inclusive(DateTime<Utc>),
    Before(DateTime<Utc>),
}

// ═══════════════════════════════════════════════════════════
// Date parsing
// ═══════════════════════════════════════════════════════════

/// Parse RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS`, or a bare date.
/// Naive values are taken as UTC. Returns the instant and whether the
/// input was date-only.
fn parse_instant(raw: &str) -> Option<(DateTime<Utc>, bool)> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some((dt.with_timezone(&Utc), false));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some((naive.and_utc(), false));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| (naive.and_utc(), true))
}

fn lower_bound(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw.filter(|s| !s.trim().is_empty())?;
    match parse_instant(raw) {
        Some((instant, _)) => Some(instant),
        None => {
            tracing::warn!(value = raw, "Ignoring unparseable date_from");
            None
        }
    }
}

fn upper_bound(raw: Option<&str>) -> Option<UpperBound> {
    let raw = raw.filter(|s| !s.trim().is_empty())?;
    match parse_instant(raw) {
        Some((instant, true)) => Some(UpperBound::Before(instant + Duration::days(1))),
        Some((instant, false)) => Some(UpperBound::Inclusive(instant)),
        None => {
            tracing::warn!(value = raw, "Ignoring unparseable date_to");
            None
        }
    }
}

fn truncate_narrative(text: &str) -> String {
    if text.chars().count() > SAMPLE_TEXT_CHARS {
        let cut: String = text.chars().take(SAMPLE_TEXT_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

// ═══════════════════════════════════════════════════════════
// Queries
// ═══════════════════════════════════════════════════════════

/// Build the dashboard report for `filter`.
///
/// An unknown cluster name yields an empty report rather than ignoring
/// the filter.
pub fn aggregate(
    conn: &Connection,
    filter: &AggregateFilter,
) -> Result<AggregateReport, DatabaseError> {
    let cluster_id = match filter.cluster.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(name) => match find_cluster_by_name(conn, name)? {
            Some(cluster) => Some(cluster.id.to_string()),
            None => {
                tracing::debug!(cluster = name, "Aggregate for unknown cluster");
                return Ok(AggregateReport::default());
            }
        },
        None => None,
    };
    let topic = filter
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from);
    let from = lower_bound(filter.date_from.as_deref());
    let to = upper_bound(filter.date_to.as_deref());

    let mut clauses: Vec<String> = Vec::new();
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(ref id) = cluster_id {
        params_vec.push(Box::new(id.clone()));
        clauses.push(format!("q.cluster_id = ?{}", params_vec.len()));
    }
    if let Some(ref t) = topic {
        params_vec.push(Box::new(t.clone()));
        clauses.push(format!("q.topic_tag = ?{}", params_vec.len()));
    }
    if let Some(from) = from {
        params_vec.push(Box::new(from));
        clauses.push(format!("q.created_at >= ?{}", params_vec.len()));
    }
    match to {
        Some(UpperBound::Inclusive(to)) => {
            params_vec.push(Box::new(to));
            clauses.push(format!("q.created_at <= ?{}", params_vec.len()));
        }
        Some(UpperBound::Before(to)) => {
            params_vec.push(Box::new(to));
            clauses.push(format!("q.created_at < ?{}", params_vec.len()));
        }
        None => {}
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();

    let total_queries: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM teacher_queries q{where_sql}"),
        param_refs.as_slice(),
        |row| row.get(0),
    )?;

    let sample_queries = {
        let mut stmt = conn.prepare(&format!(
            "SELECT q.id, q.cluster_id, c.name, q.topic_tag, q.narrative_text,
                    q.created_at, q.resolved, q.flagged_for_crp
             FROM teacher_queries q JOIN clusters c ON c.id = q.cluster_id{where_sql}
             ORDER BY q.created_at DESC LIMIT {SAMPLE_LIMIT}"
        ))?;
        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, DateTime<Utc>>(5)?,
                    row.get::<_, i32>(6)?,
                    row.get::<_, i32>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut samples = Vec::with_capacity(rows.len());
        for (id, cluster_id, cluster_name, topic_tag, text, created_at, resolved, flagged) in rows {
            samples.push(SampleQuery {
                id: parse_id("teacher_queries.id", &id)?,
                cluster_id: parse_id("teacher_queries.cluster_id", &cluster_id)?,
                cluster_name,
                topic_tag,
                narrative_text: truncate_narrative(&text),
                created_at,
                resolved: resolved != 0,
                flagged_for_crp: flagged != 0,
            });
        }
        samples
    };

    let by_topic = grouped_counts(
        conn,
        "SELECT q.topic_tag, COUNT(*) FROM teacher_queries q",
        "q.cluster_id",
        cluster_id.as_deref(),
        "q.topic_tag",
    )?;
    let by_cluster = grouped_counts(
        conn,
        "SELECT c.name, COUNT(*) FROM teacher_queries q JOIN clusters c ON c.id = q.cluster_id",
        "q.topic_tag",
        topic.as_deref(),
        "c.name",
    )?;

    Ok(AggregateReport {
        total_queries,
        by_topic,
        by_cluster,
        sample_queries,
    })
}

fn grouped_counts(
    conn: &Connection,
    select: &str,
    filter_column: &str,
    filter_value: Option<&str>,
    group_column: &str,
) -> Result<BTreeMap<String, i64>, DatabaseError> {
    let mut sql = select.to_string();
    if filter_value.is_some() {
        sql.push_str(&format!(" WHERE {filter_column} = ?1"));
    }
    sql.push_str(&format!(" GROUP BY {group_column}"));

    let mut stmt = conn.prepare(&sql)?;
    let rows = match filter_value {
        Some(value) => stmt
            .query_map([value], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?,
        None => stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(rows.into_iter().collect())
}

fn parse_id(field: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}

/// Per-day, per-topic counts for queries created in the last `days` days,
/// ordered by date then topic.
pub fn topic_trends(conn: &Connection, days: u32) -> Result<Vec<TrendPoint>, DatabaseError> {
    let days = days.clamp(1, MAX_TREND_DAYS);
    let cutoff = Utc::now() - Duration::days(i64::from(days));

    let mut stmt = conn.prepare(
        "SELECT substr(created_at, 1, 10) AS day, topic_tag, COUNT(*)
         FROM teacher_queries
         WHERE created_at >= ?1
         GROUP BY day, topic_tag
         ORDER BY day, topic_tag",
    )?;
    let points = stmt
        .query_map([cutoff], |row| {
            Ok(TrendPoint {
                date: row.get(0)?,
                topic: row.get(1)?,
                count: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(points)
}
