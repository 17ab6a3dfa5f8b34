//! Storage health probes: database sizes, backup recency, and relation
//! growth.
//!
//! Backup history comes from the `monitoring.backup_history` table written
//! by the backup tooling; sizes come from the catalog size functions.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dispatch::SqlProbe;

/// Which health probe a request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Per-database sizes (default).
    Size,
    /// Most recent backup per database and type.
    Backups,
    /// Largest relations and their index overhead.
    Files,
}

impl Section {
    /// Resolves the `?section=` parameter; unrecognized values fall back
    /// to the domain default.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("backups") => Self::Backups,
            Some("files") => Self::Files,
            _ => Self::Size,
        }
    }
}

/// Size and connection count of one database.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSizeRow {
    /// Database name.
    pub database: String,
    /// On-disk size in MB.
    pub size_mb: f64,
    /// Currently connected backends.
    pub connections: i64,
}

/// Most recent backup of one database and type.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BackupRow {
    /// Database name.
    pub database: String,
    /// Backup type (`"full"`, `"incremental"`, ...).
    pub backup_type: String,
    /// When the backup finished.
    pub last_backup_date: Option<DateTime<Utc>>,
    /// Backup size in MB.
    pub backup_size_mb: f64,
    /// Hours since the backup finished, `None` when never backed up.
    pub hours_ago: Option<f64>,
}

/// One of the largest relations on the server.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RelationSizeRow {
    /// Schema-qualified relation name.
    pub relation: String,
    /// Total size including indexes and toast, in MB.
    pub total_mb: f64,
    /// Heap size in MB.
    pub table_mb: f64,
    /// Index size in MB.
    pub index_mb: f64,
}

const DATABASE_SIZE_SQL: &str = "\
SELECT
  d.datname AS database,
  (pg_database_size(d.oid) / 1048576.0)::float8 AS size_mb,
  (SELECT count(*) FROM pg_stat_activity a WHERE a.datname = d.datname)::bigint AS connections
FROM pg_database d
WHERE NOT d.datistemplate
ORDER BY size_mb DESC";

const BACKUP_INFO_SQL: &str = "\
SELECT
  b.database,
  b.backup_type,
  b.finished_at AS last_backup_date,
  b.size_mb::float8 AS backup_size_mb,
  (EXTRACT(EPOCH FROM now() - b.finished_at) / 3600.0)::float8 AS hours_ago
FROM monitoring.backup_history b
WHERE b.finished_at = (
  SELECT max(x.finished_at)
  FROM monitoring.backup_history x
  WHERE x.database = b.database AND x.backup_type = b.backup_type
)
ORDER BY b.database, b.backup_type";

const RELATION_SIZE_SQL: &str = "\
SELECT
  n.nspname || '.' || c.relname AS relation,
  (pg_total_relation_size(c.oid) / 1048576.0)::float8 AS total_mb,
  (pg_relation_size(c.oid) / 1048576.0)::float8 AS table_mb,
  (pg_indexes_size(c.oid) / 1048576.0)::float8 AS index_mb
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE c.relkind = 'r'
  AND n.nspname NOT IN ('pg_catalog', 'information_schema')
ORDER BY total_mb DESC
LIMIT 25";

/// Database size probe.
pub const SIZE: SqlProbe<DatabaseSizeRow> = SqlProbe::new(DATABASE_SIZE_SQL);

/// Backup recency probe.
pub const BACKUPS: SqlProbe<BackupRow> = SqlProbe::new(BACKUP_INFO_SQL);

/// Relation growth probe.
pub const FILES: SqlProbe<RelationSizeRow> = SqlProbe::new(RELATION_SIZE_SQL);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_defaults_to_size() {
        assert_eq!(Section::from_param(None), Section::Size);
        assert_eq!(Section::from_param(Some("??")), Section::Size);
        assert_eq!(Section::from_param(Some("backups")), Section::Backups);
        assert_eq!(Section::from_param(Some("files")), Section::Files);
    }
}
