// Install engine: the operations every adapter calls.

use std::sync::Arc;

use anyhow::{Context, Result as AnyResult};
use chrono::Utc;
use tracing::{debug, info, warn};
use vaultkit_common::install::{CollisionReport, InstallLog, RollbackResult};
use vaultkit_common::template::{TemplateSpec, TemplateSummary};
use vaultkit_common::types::{InstallId, Vertical, WorkspaceId};
use vaultkit_common::workspace::WorkspaceState;

use crate::catalog::{StaticCatalog, TemplateCatalog};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::install::{self, OrderedRollback};
use crate::lock::{lock_workspace, WorkspaceLocks};
use crate::store::{SqliteStore, StoreWrite, WorkspaceStore};

pub type EngineResult<T> = Result<T, EngineError>;

pub struct InstallEngine {
    catalog: Arc<dyn TemplateCatalog>,
    store: Arc<dyn WorkspaceStore>,
    locks: WorkspaceLocks,
    ordered_rollback: OrderedRollback,
}

impl std::fmt::Debug for InstallEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallEngine")
            .field("locks", &self.locks)
            .field("ordered_rollback", &self.ordered_rollback)
            .finish_non_exhaustive()
    }
}

impl InstallEngine {
    pub fn new(catalog: Arc<dyn TemplateCatalog>, store: Arc<dyn WorkspaceStore>) -> Self {
        Self { catalog, store, locks: WorkspaceLocks::new(), ordered_rollback: OrderedRollback::default() }
    }

    pub fn with_ordered_rollback(mut self, policy: OrderedRollback) -> Self {
        self.ordered_rollback = policy;
        self
    }

    /// Built-in catalog plus `catalog_dir`, backed by the SQLite database at
    /// `database_path`.
    pub fn open(config: &EngineConfig) -> AnyResult<Self> {
        let catalog = StaticCatalog::with_dir(config.catalog_dir.as_deref())
            .context("failed to load template catalog")?;
        let store = SqliteStore::open(&config.database_path)?;
        info!(
            database = %config.database_path.display(),
            templates = catalog.len(),
            ordered_rollback = ?config.ordered_rollback,
            "install engine ready"
        );
        Ok(Self::new(Arc::new(catalog), Arc::new(store)).with_ordered_rollback(config.ordered_rollback))
    }

    pub fn ordered_rollback(&self) -> OrderedRollback {
        self.ordered_rollback
    }

    pub fn list_templates(&self, vertical: Option<Vertical>) -> Vec<TemplateSummary> {
        self.catalog.list_vertical(vertical)
    }

    /// `requested`, or the newest published version of `template_id`.
    ///
    /// Falls back to version 1 so an unknown template still fails with
    /// `TemplateNotFound` on lookup.
    pub fn resolve_version(&self, template_id: &str, requested: Option<u32>) -> u32 {
        requested.or_else(|| self.catalog.latest_version(template_id)).unwrap_or(1)
    }

    pub fn get_template(&self, template_id: &str, version: u32) -> EngineResult<Arc<TemplateSpec>> {
        let template = self.catalog.get_template(template_id, version)?;
        template.validate()?;
        Ok(template)
    }

    /// Template folders and labels that already exist in the workspace.
    ///
    /// Takes no lock and never creates the workspace.
    pub fn preview_collisions(
        &self,
        workspace_id: &str,
        template_id: &str,
        version: u32,
    ) -> EngineResult<CollisionReport> {
        let workspace_id = parse_workspace_id(workspace_id)?;
        let template = self.get_template(template_id, version)?;
        let state = self.current_state(&workspace_id)?;

        let report = install::preview_collisions(&state, &template);
        debug!(
            %workspace_id,
            template_id,
            version,
            folder_collisions = report.folders.len(),
            label_collisions = report.labels.len(),
            "previewed template install"
        );
        Ok(report)
    }

    /// Install a template and persist the state together with its log.
    pub fn apply_install(
        &self,
        workspace_id: &str,
        template_id: &str,
        version: u32,
    ) -> EngineResult<InstallLog> {
        let workspace_id = parse_workspace_id(workspace_id)?;
        let template = self.get_template(template_id, version)?;

        let handle = self.locks.handle(&workspace_id);
        let _guard = lock_workspace(&handle);

        let mut state = self.current_state(&workspace_id)?;
        let created_items = install::apply_template(&mut state, &template);
        let now = Utc::now();
        state.touch(now);

        let log = InstallLog {
            install_id: InstallId::new(),
            workspace_id,
            template_id: template.id.clone(),
            version: template.version,
            installed_at: now,
            created_items,
        };
        self.store.commit(vec![StoreWrite::SaveWorkspace(state), StoreWrite::SaveInstallLog(log.clone())])?;

        info!(
            install_id = %log.install_id,
            workspace_id = %log.workspace_id,
            template_id = %log.template_id,
            version = log.version,
            folders = log.created_items.folders.len(),
            labels = log.created_items.labels.len(),
            label_rules = log.created_items.label_rules.len(),
            request_templates = log.created_items.request_templates.len(),
            share_presets = log.created_items.share_presets.len(),
            "template installed"
        );
        Ok(log)
    }

    /// Remove what one install added and discard its log.
    pub fn rollback(&self, install_id: InstallId) -> EngineResult<RollbackResult> {
        let workspace_id = self.require_install(install_id)?.workspace_id;

        let handle = self.locks.handle(&workspace_id);
        let _guard = lock_workspace(&handle);

        // A concurrent rollback may have won the race for the lock.
        let log = self.require_install(install_id)?;
        let mut state = self.current_state(&log.workspace_id)?;
        let (reverted, partial) = install::revert(&mut state, &log.created_items, self.ordered_rollback);
        state.touch(Utc::now());

        self.store.commit(vec![StoreWrite::SaveWorkspace(state), StoreWrite::DeleteInstallLog(install_id)])?;

        if partial.any() {
            warn!(
                %install_id,
                workspace_id = %log.workspace_id,
                policy = ?self.ordered_rollback,
                label_rules = partial.label_rules,
                request_templates = partial.request_templates,
                share_presets = partial.share_presets,
                "ordered categories only partially reverted"
            );
        }
        info!(
            %install_id,
            workspace_id = %log.workspace_id,
            template_id = %log.template_id,
            folders = reverted.folders,
            labels = reverted.labels,
            label_rules = reverted.label_rules,
            request_templates = reverted.request_templates,
            share_presets = reverted.share_presets,
            "install rolled back"
        );

        Ok(RollbackResult {
            install_id,
            workspace_id: log.workspace_id,
            reverted,
            partial,
            ui_hints_retained: true,
        })
    }

    /// Stored install logs for a workspace, newest first.
    pub fn list_installs(&self, workspace_id: &str) -> EngineResult<Vec<InstallLog>> {
        let workspace_id = parse_workspace_id(workspace_id)?;
        Ok(self.store.list_install_logs(&workspace_id)?)
    }

    pub fn get_install(&self, install_id: InstallId) -> EngineResult<InstallLog> {
        self.require_install(install_id)
    }

    /// Current state, or an empty one that is not persisted.
    pub fn get_workspace(&self, workspace_id: &str) -> EngineResult<WorkspaceState> {
        let workspace_id = parse_workspace_id(workspace_id)?;
        self.current_state(&workspace_id)
    }

    fn current_state(&self, workspace_id: &WorkspaceId) -> EngineResult<WorkspaceState> {
        Ok(self
            .store
            .load_workspace(workspace_id)?
            .unwrap_or_else(|| WorkspaceState::new(workspace_id.clone(), Utc::now())))
    }

    fn require_install(&self, install_id: InstallId) -> EngineResult<InstallLog> {
        self.store
            .get_install_log(install_id)?
            .ok_or_else(|| EngineError::UnknownInstall(install_id.to_string()))
    }
}

fn parse_workspace_id(raw: &str) -> EngineResult<WorkspaceId> {
    WorkspaceId::parse(raw).map_err(|error| EngineError::UnknownWorkspace {
        workspace_id: raw.to_owned(),
        reason: error.to_string(),
    })
}
