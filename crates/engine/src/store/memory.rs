// In-memory workspace store, used by tests and ephemeral deployments.

use std::collections::HashMap;
use std::sync::Mutex;

use vaultkit_common::install::InstallLog;
use vaultkit_common::types::{InstallId, WorkspaceId};
use vaultkit_common::workspace::WorkspaceState;

use super::{check_revision, StoreError, StoreWrite, WorkspaceStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<MemoryTables>,
}

#[derive(Debug, Default)]
struct MemoryTables {
    workspaces: HashMap<WorkspaceId, WorkspaceState>,
    install_logs: HashMap<InstallId, InstallLog>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored install logs across all workspaces.
    pub fn install_log_count(&self) -> Result<usize, StoreError> {
        Ok(self.tables.lock().map_err(|_| StoreError::Poisoned)?.install_logs.len())
    }
}

impl WorkspaceStore for MemoryStore {
    fn load_workspace(&self, workspace_id: &WorkspaceId) -> Result<Option<WorkspaceState>, StoreError> {
        let tables = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.workspaces.get(workspace_id).cloned())
    }

    fn get_install_log(&self, install_id: InstallId) -> Result<Option<InstallLog>, StoreError> {
        let tables = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(tables.install_logs.get(&install_id).cloned())
    }

    fn list_install_logs(&self, workspace_id: &WorkspaceId) -> Result<Vec<InstallLog>, StoreError> {
        let tables = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        let mut logs: Vec<InstallLog> = tables
            .install_logs
            .values()
            .filter(|log| &log.workspace_id == workspace_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| {
            b.installed_at.cmp(&a.installed_at).then_with(|| b.install_id.cmp(&a.install_id))
        });
        Ok(logs)
    }

    fn commit(&self, writes: Vec<StoreWrite>) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().map_err(|_| StoreError::Poisoned)?;
        for write in &writes {
            if let StoreWrite::SaveWorkspace(state) = write {
                let stored = tables.workspaces.get(&state.workspace_id).map(|current| current.revision);
                check_revision(state, stored)?;
            }
        }
        for write in writes {
            match write {
                StoreWrite::SaveWorkspace(state) => {
                    tables.workspaces.insert(state.workspace_id.clone(), state);
                }
                StoreWrite::SaveInstallLog(log) => {
                    tables.install_logs.insert(log.install_id, log);
                }
                StoreWrite::DeleteInstallLog(install_id) => {
                    tables.install_logs.remove(&install_id);
                }
            }
        }
        Ok(())
    }
}
