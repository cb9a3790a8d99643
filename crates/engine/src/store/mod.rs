// Persistence for workspace state and install logs.
//
// Engine operations read through the getters and write through a single
// `commit` call per operation, so every store only has to make one batch of
// writes atomic.

pub mod memory;
pub mod sqlite;

use chrono::Utc;
use thiserror::Error;
use vaultkit_common::install::InstallLog;
use vaultkit_common::types::{InstallId, WorkspaceId};
use vaultkit_common::workspace::WorkspaceState;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode or decode a stored record: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("stored record is corrupt: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(
        "workspace `{workspace_id}` changed concurrently: stored revision {stored:?}, write expects {expected}"
    )]
    RevisionConflict { workspace_id: WorkspaceId, stored: Option<u64>, expected: u64 },
}

/// One write inside an atomic batch.
#[derive(Debug, Clone)]
pub enum StoreWrite {
    /// Compare-and-swap on `revision`: the stored row must be exactly one
    /// revision behind, or absent when the state is at revision 0 or 1.
    SaveWorkspace(WorkspaceState),
    SaveInstallLog(InstallLog),
    DeleteInstallLog(InstallId),
}

/// Reject a workspace write whose base revision is not the stored one.
pub(crate) fn check_revision(state: &WorkspaceState, stored: Option<u64>) -> Result<(), StoreError> {
    let matches = match stored {
        Some(stored) => stored.checked_add(1) == Some(state.revision),
        None => state.revision <= 1,
    };
    if matches {
        Ok(())
    } else {
        Err(StoreError::RevisionConflict {
            workspace_id: state.workspace_id.clone(),
            stored,
            expected: state.revision,
        })
    }
}

/// Backing store for tenant workspace configuration.
pub trait WorkspaceStore: Send + Sync {
    /// Current state, or `None` if the workspace was never referenced.
    fn load_workspace(&self, workspace_id: &WorkspaceId) -> Result<Option<WorkspaceState>, StoreError>;

    fn get_install_log(&self, install_id: InstallId) -> Result<Option<InstallLog>, StoreError>;

    /// Stored logs for one workspace, newest first.
    fn list_install_logs(&self, workspace_id: &WorkspaceId) -> Result<Vec<InstallLog>, StoreError>;

    /// Apply every write or none of them.
    fn commit(&self, writes: Vec<StoreWrite>) -> Result<(), StoreError>;

    fn get_or_create_workspace(&self, workspace_id: &WorkspaceId) -> Result<WorkspaceState, StoreError> {
        if let Some(state) = self.load_workspace(workspace_id)? {
            return Ok(state);
        }
        let state = WorkspaceState::new(workspace_id.clone(), Utc::now());
        self.save_workspace(&state)?;
        Ok(state)
    }

    fn save_workspace(&self, state: &WorkspaceState) -> Result<(), StoreError> {
        self.commit(vec![StoreWrite::SaveWorkspace(state.clone())])
    }

    fn save_install_log(&self, log: &InstallLog) -> Result<(), StoreError> {
        self.commit(vec![StoreWrite::SaveInstallLog(log.clone())])
    }

    fn delete_install_log(&self, install_id: InstallId) -> Result<(), StoreError> {
        self.commit(vec![StoreWrite::DeleteInstallLog(install_id)])
    }
}
