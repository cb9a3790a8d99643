// Live per-tenant workspace configuration.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::category::Category;
use crate::types::{ItemId, WorkspaceId};

/// Entry of an ordered workspace collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedEntry {
    pub id: ItemId,
    pub body: Value,
}

/// Union-merged UI shortcut sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintSets {
    pub kpis: BTreeSet<String>,
    pub quick_actions: BTreeSet<String>,
    pub checklist: BTreeSet<String>,
}

/// A tenant's workspace configuration as the install engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceState {
    pub workspace_id: WorkspaceId,
    #[serde(default)]
    pub folders: BTreeSet<String>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub label_rules: Vec<OrderedEntry>,
    #[serde(default)]
    pub request_templates: Vec<OrderedEntry>,
    #[serde(default)]
    pub share_presets: Vec<OrderedEntry>,
    #[serde(default)]
    pub ui_hints: HintSets,
    /// Bumped on every committed mutation.
    #[serde(default)]
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

impl WorkspaceState {
    pub fn new(workspace_id: WorkspaceId, now: DateTime<Utc>) -> Self {
        Self {
            workspace_id,
            folders: BTreeSet::new(),
            labels: BTreeSet::new(),
            label_rules: Vec::new(),
            request_templates: Vec::new(),
            share_presets: Vec::new(),
            ui_hints: HintSets::default(),
            revision: 0,
            updated_at: now,
        }
    }

    /// String set backing a set-membership or hint category.
    pub fn keys(&self, category: Category) -> Option<&BTreeSet<String>> {
        match category {
            Category::Folders => Some(&self.folders),
            Category::Labels => Some(&self.labels),
            Category::Kpis => Some(&self.ui_hints.kpis),
            Category::QuickActions => Some(&self.ui_hints.quick_actions),
            Category::Checklist => Some(&self.ui_hints.checklist),
            Category::LabelRules | Category::RequestTemplates | Category::SharePresets => None,
        }
    }

    pub fn keys_mut(&mut self, category: Category) -> Option<&mut BTreeSet<String>> {
        match category {
            Category::Folders => Some(&mut self.folders),
            Category::Labels => Some(&mut self.labels),
            Category::Kpis => Some(&mut self.ui_hints.kpis),
            Category::QuickActions => Some(&mut self.ui_hints.quick_actions),
            Category::Checklist => Some(&mut self.ui_hints.checklist),
            Category::LabelRules | Category::RequestTemplates | Category::SharePresets => None,
        }
    }

    /// Collection backing an ordered category.
    pub fn entries(&self, category: Category) -> Option<&Vec<OrderedEntry>> {
        match category {
            Category::LabelRules => Some(&self.label_rules),
            Category::RequestTemplates => Some(&self.request_templates),
            Category::SharePresets => Some(&self.share_presets),
            _ => None,
        }
    }

    pub fn entries_mut(&mut self, category: Category) -> Option<&mut Vec<OrderedEntry>> {
        match category {
            Category::LabelRules => Some(&mut self.label_rules),
            Category::RequestTemplates => Some(&mut self.request_templates),
            Category::SharePresets => Some(&mut self.share_presets),
            _ => None,
        }
    }

    /// Record a committed mutation.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.revision += 1;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> WorkspaceState {
        WorkspaceState::new(WorkspaceId::parse("org-1").expect("valid id"), Utc::now())
    }

    #[test]
    fn accessors_cover_every_category_once() {
        let state = workspace();
        for category in Category::ALL {
            let keyed = state.keys(category).is_some();
            let ordered = state.entries(category).is_some();
            assert!(keyed ^ ordered, "{category} must map to exactly one collection");
        }
    }

    #[test]
    fn touch_bumps_revision() {
        let mut state = workspace();
        let later = state.updated_at + chrono::Duration::seconds(5);
        state.touch(later);
        assert_eq!(state.revision, 1);
        assert_eq!(state.updated_at, later);
    }

    #[test]
    fn serialized_state_round_trips_with_missing_collections() {
        let raw = serde_json::json!({
            "workspace_id": "org-1",
            "folders": ["Welcome"],
            "updated_at": "2025-01-01T00:00:00Z"
        });
        let state: WorkspaceState = serde_json::from_value(raw).expect("state should decode");
        assert!(state.folders.contains("Welcome"));
        assert!(state.label_rules.is_empty());
        assert_eq!(state.revision, 0);
    }
}
