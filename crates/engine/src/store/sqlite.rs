// SQLite-backed workspace store.
//
// Workspace state and created items are stored as JSON documents; the
// columns next to them exist for lookups and ordering only.

use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use vaultkit_common::install::{CreatedItems, InstallLog};
use vaultkit_common::types::{InstallId, WorkspaceId};
use vaultkit_common::workspace::WorkspaceState;

use super::{check_revision, StoreError, StoreWrite, WorkspaceStore};

const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE workspaces (
    workspace_id    TEXT PRIMARY KEY,
    state_json      TEXT NOT NULL,
    revision        INTEGER NOT NULL DEFAULT 0,
    updated_at      TEXT NOT NULL
);

CREATE TABLE install_logs (
    install_id      TEXT PRIMARY KEY,
    workspace_id    TEXT NOT NULL,
    template_id     TEXT NOT NULL,
    version         INTEGER NOT NULL,
    installed_at    TEXT NOT NULL,
    created_items   TEXT NOT NULL
);
"#;

const MIGRATION_V2_SQL: &str = r#"
CREATE INDEX install_logs_workspace_idx
    ON install_logs (workspace_id, installed_at);
"#;

const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_V1_SQL), (2, MIGRATION_V2_SQL)];

/// How long a writer waits for another process holding the write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const INSTALL_LOG_COLUMNS: &str =
    "install_id, workspace_id, template_id, version, installed_at, created_items";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database parent directory `{}`", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("failed to open vaultkit database at `{}`", path.display()))?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            ",
        )
        .context("failed to configure sqlite pragmas")?;
        conn.busy_timeout(BUSY_TIMEOUT).context("failed to set sqlite busy timeout")?;

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        ensure_migration_table(&conn)?;
        apply_pending_migrations(&mut conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn schema_version(&self) -> Result<i64> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        current_schema_version(&conn)
    }
}

impl WorkspaceStore for SqliteStore {
    fn load_workspace(&self, workspace_id: &WorkspaceId) -> Result<Option<WorkspaceState>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT state_json FROM workspaces WHERE workspace_id = ?1",
                params![workspace_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|raw| serde_json::from_str(&raw).map_err(StoreError::from)).transpose()
    }

    fn get_install_log(&self, install_id: InstallId) -> Result<Option<InstallLog>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let row = conn
            .query_row(
                &format!("SELECT {INSTALL_LOG_COLUMNS} FROM install_logs WHERE install_id = ?1"),
                params![install_id.to_string()],
                InstallLogRow::from_row,
            )
            .optional()?;

        row.map(InstallLogRow::into_log).transpose()
    }

    fn list_install_logs(&self, workspace_id: &WorkspaceId) -> Result<Vec<InstallLog>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {INSTALL_LOG_COLUMNS} FROM install_logs
             WHERE workspace_id = ?1
             ORDER BY installed_at DESC, rowid DESC"
        ))?;
        let rows = stmt
            .query_map(params![workspace_id.as_str()], InstallLogRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(InstallLogRow::into_log).collect()
    }

    fn commit(&self, writes: Vec<StoreWrite>) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        // Immediate: take the write lock before reading revisions so another
        // process cannot commit between the check and the write.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for write in writes {
            match write {
                StoreWrite::SaveWorkspace(state) => {
                    let stored: Option<i64> = tx
                        .query_row(
                            "SELECT revision FROM workspaces WHERE workspace_id = ?1",
                            params![state.workspace_id.as_str()],
                            |row| row.get(0),
                        )
                        .optional()?;
                    let stored = stored
                        .map(|revision| {
                            u64::try_from(revision).map_err(|_| {
                                StoreError::Corrupt(format!("negative workspace revision {revision}"))
                            })
                        })
                        .transpose()?;
                    check_revision(&state, stored)?;

                    tx.execute(
                        "INSERT INTO workspaces (workspace_id, state_json, revision, updated_at)
                         VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT (workspace_id) DO UPDATE SET
                             state_json = excluded.state_json,
                             revision = excluded.revision,
                             updated_at = excluded.updated_at",
                        params![
                            state.workspace_id.as_str(),
                            serde_json::to_string(&state)?,
                            i64::try_from(state.revision).map_err(|_| {
                                StoreError::Corrupt(format!(
                                    "workspace revision {} overflows storage",
                                    state.revision
                                ))
                            })?,
                            format_timestamp(state.updated_at),
                        ],
                    )?;
                }
                StoreWrite::SaveInstallLog(log) => {
                    tx.execute(
                        &format!(
                            "INSERT INTO install_logs ({INSTALL_LOG_COLUMNS})
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                        ),
                        params![
                            log.install_id.to_string(),
                            log.workspace_id.as_str(),
                            log.template_id,
                            log.version,
                            format_timestamp(log.installed_at),
                            serde_json::to_string(&log.created_items)?,
                        ],
                    )?;
                }
                StoreWrite::DeleteInstallLog(install_id) => {
                    tx.execute(
                        "DELETE FROM install_logs WHERE install_id = ?1",
                        params![install_id.to_string()],
                    )?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}

struct InstallLogRow {
    install_id: String,
    workspace_id: String,
    template_id: String,
    version: u32,
    installed_at: String,
    created_items: String,
}

impl InstallLogRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            install_id: row.get(0)?,
            workspace_id: row.get(1)?,
            template_id: row.get(2)?,
            version: row.get(3)?,
            installed_at: row.get(4)?,
            created_items: row.get(5)?,
        })
    }

    fn into_log(self) -> Result<InstallLog, StoreError> {
        let install_id = self
            .install_id
            .parse::<InstallId>()
            .map_err(|error| StoreError::Corrupt(format!("install_id: {error}")))?;
        let workspace_id = WorkspaceId::parse(&self.workspace_id)
            .map_err(|error| StoreError::Corrupt(format!("workspace_id: {error}")))?;
        let installed_at = DateTime::parse_from_rfc3339(&self.installed_at)
            .map_err(|error| StoreError::Corrupt(format!("installed_at: {error}")))?
            .with_timezone(&Utc);
        let created_items: CreatedItems = serde_json::from_str(&self.created_items)?;

        Ok(InstallLog {
            install_id,
            workspace_id,
            template_id: self.template_id,
            version: self.version,
            installed_at,
            created_items,
        })
    }
}

/// Fixed-width UTC timestamps so lexical order matches time order.
fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
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
            .with_context(|| format!("failed to apply database migration v{version}"))?;
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
