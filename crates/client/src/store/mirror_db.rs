// SQLite-backed mirror storage (`mirror.db`).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::backend::MirrorBackend;

const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE mirror_entries (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_V1_SQL)];

#[derive(Debug)]
pub struct MirrorDb {
    conn: Connection,
}

impl MirrorDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create mirror.db parent directory `{}`", parent.display())
            })?;
        }

        let mut conn = Connection::open(path)
            .with_context(|| format!("failed to open mirror.db at `{}`", path.display()))?;

        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .context("failed to configure sqlite pragmas for mirror.db")?;

        ensure_migration_table(&conn)?;
        apply_pending_migrations(&mut conn)?;

        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().context("failed to open in-memory mirror")?;
        ensure_migration_table(&conn)?;
        apply_pending_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn schema_version(&self) -> Result<i64> {
        current_schema_version(&self.conn)
    }
}

impl MirrorBackend for MirrorDb {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM mirror_entries WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("failed to read mirror entry `{key}`"))
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO mirror_entries (key, value, updated_at) \
                 VALUES (?1, ?2, datetime('now')) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
                                                updated_at = excluded.updated_at",
                params![key, value],
            )
            .with_context(|| format!("failed to write mirror entry `{key}`"))?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM mirror_entries WHERE substr(key, 1, ?2) = ?1 ORDER BY key")
            .context("failed to prepare mirror key listing")?;

        let prefix_len = i64::try_from(prefix.chars().count()).context("prefix too long")?;
        let rows = stmt
            .query_map(params![prefix, prefix_len], |row| row.get(0))
            .context("failed to list mirror keys")?;

        rows.collect::<std::result::Result<Vec<String>, _>>()
            .context("failed to collect mirror keys")
    }
}

fn ensure_migration_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY,
            applied_at  TEXT NOT NULL
        );
        ",
    )
    .context("failed to ensure schema_migrations table exists")
}

fn current_schema_version(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| row.get(0))
        .context("failed to read current schema version")
}

fn apply_pending_migrations(conn: &mut Connection) -> Result<()> {
    let mut current_version = current_schema_version(conn)?;

    for (version, sql) in MIGRATIONS {
        if *version <= current_version {
            continue;
        }

        let tx = conn.transaction().context("failed to start migration transaction")?;
        tx.execute_batch(sql)
            .with_context(|| format!("failed to apply mirror.db migration v{version}"))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            params![version],
        )
        .with_context(|| format!("failed to record migration v{version}"))?;
        tx.commit().with_context(|| format!("failed to commit migration v{version}"))?;
        current_version = *version;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn open_creates_schema() {
        let tmp = tempdir().expect("tempdir should be created");
        let db = MirrorDb::open(tmp.path().join("nested").join("mirror.db"))
            .expect("mirror db should open");

        let exists: i64 = db
            .connection()
            .query_row(
                "SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name = 'mirror_entries'",
                [],
                |row| row.get(0),
            )
            .expect("table existence query should succeed");
        assert_eq!(exists, 1);
        assert_eq!(db.schema_version().expect("schema version should be readable"), 1);
    }

    #[test]
    fn reopening_keeps_entries_and_migrations() {
        let tmp = tempdir().expect("tempdir should be created");
        let path = tmp.path().join("mirror.db");
        {
            let mut db = MirrorDb::open(&path).expect("first open should succeed");
            db.put("session/online", "true").expect("put should succeed");
        }

        let db = MirrorDb::open(&path).expect("second open should succeed");
        assert_eq!(db.get("session/online").expect("get should succeed").as_deref(), Some("true"));
        assert_eq!(db.schema_version().expect("schema version should be readable"), 1);
    }

    #[test]
    fn put_upserts_and_prefix_listing_is_exact() {
        let mut db = MirrorDb::open_in_memory().expect("in-memory mirror should open");
        db.put("documents/+a", "1").unwrap();
        db.put("documents/+a", "2").unwrap();
        db.put("documents/+b", "3").unwrap();
        db.put("documents_extra", "4").unwrap();
        db.put("session/online", "false").unwrap();

        assert_eq!(db.get("documents/+a").unwrap().as_deref(), Some("2"));
        assert_eq!(db.get("missing").unwrap(), None);
        assert_eq!(
            db.keys_with_prefix("documents/").unwrap(),
            vec!["documents/+a".to_string(), "documents/+b".to_string()]
        );
    }
}
