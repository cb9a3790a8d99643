// Install bookkeeping: collision reports, install logs and rollback results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::types::{InstallId, ItemId, WorkspaceId};

/// Template folders and labels already present in a workspace (dry run).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionReport {
    pub folders: Vec<String>,
    pub labels: Vec<String>,
}

impl CollisionReport {
    pub fn keys_mut(&mut self, category: Category) -> Option<&mut Vec<String>> {
        match category {
            Category::Folders => Some(&mut self.folders),
            Category::Labels => Some(&mut self.labels),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.labels.is_empty()
    }
}

/// One ordered-category entry appended by an install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendedEntry {
    pub id: ItemId,
    /// Index the entry occupied right after it was appended. Informational only.
    pub position: usize,
}

/// Exactly what one install added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatedItems {
    pub folders: Vec<String>,
    pub labels: Vec<String>,
    pub label_rules: Vec<AppendedEntry>,
    pub request_templates: Vec<AppendedEntry>,
    pub share_presets: Vec<AppendedEntry>,
}

impl CreatedItems {
    pub fn keys(&self, category: Category) -> &[String] {
        match category {
            Category::Folders => &self.folders,
            Category::Labels => &self.labels,
            _ => &[],
        }
    }

    pub fn keys_mut(&mut self, category: Category) -> Option<&mut Vec<String>> {
        match category {
            Category::Folders => Some(&mut self.folders),
            Category::Labels => Some(&mut self.labels),
            _ => None,
        }
    }

    pub fn appended(&self, category: Category) -> &[AppendedEntry] {
        match category {
            Category::LabelRules => &self.label_rules,
            Category::RequestTemplates => &self.request_templates,
            Category::SharePresets => &self.share_presets,
            _ => &[],
        }
    }

    pub fn appended_mut(&mut self, category: Category) -> Option<&mut Vec<AppendedEntry>> {
        match category {
            Category::LabelRules => Some(&mut self.label_rules),
            Category::RequestTemplates => Some(&mut self.request_templates),
            Category::SharePresets => Some(&mut self.share_presets),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
            && self.labels.is_empty()
            && self.label_rules.is_empty()
            && self.request_templates.is_empty()
            && self.share_presets.is_empty()
    }
}

/// Audit record of one committed install; deleted when rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallLog {
    pub install_id: InstallId,
    pub workspace_id: WorkspaceId,
    pub template_id: String,
    pub version: u32,
    pub installed_at: DateTime<Utc>,
    pub created_items: CreatedItems,
}

/// Items a rollback removed, per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertedCounts {
    pub folders: usize,
    pub labels: usize,
    pub label_rules: usize,
    pub request_templates: usize,
    pub share_presets: usize,
}

impl RevertedCounts {
    pub fn slot_mut(&mut self, category: Category) -> Option<&mut usize> {
        match category {
            Category::Folders => Some(&mut self.folders),
            Category::Labels => Some(&mut self.labels),
            Category::LabelRules => Some(&mut self.label_rules),
            Category::RequestTemplates => Some(&mut self.request_templates),
            Category::SharePresets => Some(&mut self.share_presets),
            _ => None,
        }
    }
}

/// Ordered categories that were not fully reverted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialFlags {
    pub label_rules: bool,
    pub request_templates: bool,
    pub share_presets: bool,
}

impl PartialFlags {
    pub fn flag_mut(&mut self, category: Category) -> Option<&mut bool> {
        match category {
            Category::LabelRules => Some(&mut self.label_rules),
            Category::RequestTemplates => Some(&mut self.request_templates),
            Category::SharePresets => Some(&mut self.share_presets),
            _ => None,
        }
    }

    pub fn any(&self) -> bool {
        self.label_rules || self.request_templates || self.share_presets
    }
}

/// Outcome of rolling back one install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackResult {
    pub install_id: InstallId,
    pub workspace_id: WorkspaceId,
    pub reverted: RevertedCounts,
    pub partial: PartialFlags,
    /// UI hints merged by the install are always left in place.
    pub ui_hints_retained: bool,
}
