use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Cluster;

type ClusterRow = (String, String, Option<String>, DateTime<Utc>);

fn cluster_from_row(row: ClusterRow) -> Result<Cluster, DatabaseError> {
    let (id, name, region, created_at) = row;
    Ok(Cluster {
        id: parse_uuid("clusters.id", &id)?,
        name,
        region,
        created_at,
    })
}

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|_| DatabaseError::InvalidValue {
        field: field.into(),
        value: value.into(),
    })
}

pub fn find_cluster_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<Cluster>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, region, created_at FROM clusters WHERE name = ?1",
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;
    row.map(cluster_from_row).transpose()
}

/// Return the cluster named `name`, creating it on first use.
pub fn get_or_create_cluster(conn: &Connection, name: &str) -> Result<Cluster, DatabaseError> {
    if let Some(existing) = find_cluster_by_name(conn, name)? {
        return Ok(existing);
    }

    let cluster = Cluster {
        id: Uuid::new_v4(),
        name: name.to_string(),
        region: None,
        created_at: Utc::now(),
    };
    // OR IGNORE: a concurrent request may have created the same name first.
    conn.execute(
        "INSERT OR IGNORE INTO clusters (id, name, region, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![cluster.id.to_string(), cluster.name, cluster.region, cluster.created_at],
    )?;

    find_cluster_by_name(conn, name)?.ok_or_else(|| DatabaseError::NotFound {
        entity_type: "Cluster".into(),
        id: name.into(),
    })
}

pub fn list_clusters(conn: &Connection) -> Result<Vec<Cluster>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, region, created_at FROM clusters ORDER BY name")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
        .collect::<Result<Vec<ClusterRow>, _>>()?;
    rows.into_iter().map(cluster_from_row).collect()
}
