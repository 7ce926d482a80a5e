// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, params};
use staffbook_app::KeyValueStore;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const APP_NAME: &str = "staffbook";
pub const DB_PATH_ENV: &str = "STAFFBOOK_DB_PATH";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[("ui_state", &["key", "value", "updated_at"])];

/// One persisted view-state entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub key: String,
    pub value: String,
    pub updated_at: OffsetDateTime,
}

/// SQLite-backed key/value storage for view state that survives restarts.
pub struct Store {
    conn: Connection,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
            tracing::debug!("created ui_state schema");
        }
        Ok(())
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM ui_state WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("read view state {key}"))
    }

    pub fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO ui_state (key, value, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                  value = excluded.value,
                  updated_at = excluded.updated_at
                ",
                params![key, value, now],
            )
            .with_context(|| format!("upsert view state {key}"))?;
        Ok(())
    }

    /// Returns whether an entry was removed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM ui_state WHERE key = ?", params![key])
            .with_context(|| format!("delete view state {key}"))?;
        Ok(removed > 0)
    }

    pub fn entries(&self) -> Result<Vec<StateEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value, updated_at FROM ui_state ORDER BY key ASC")
            .context("prepare view state query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .context("query view state")?;

        let mut entries = Vec::new();
        for row in rows {
            let (key, value, updated_at) = row.context("read view state row")?;
            let updated_at = OffsetDateTime::parse(&updated_at, &Rfc3339).with_context(|| {
                format!("view state {key} has unreadable timestamp {updated_at:?}")
            })?;
            entries.push(StateEntry {
                key,
                value,
                updated_at,
            });
        }
        Ok(entries)
    }
}

impl KeyValueStore for Store {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_raw(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.put_raw(key, value)
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os(DB_PATH_ENV) {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set {DB_PATH_ENV} to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("staffbook.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; point storage.db_path at a staffbook database"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; remove the database file to start fresh",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}
