// Template categories and the handling strategy each one follows.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the engine treats a category when installing and rolling back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    /// Unordered string keys; inserted only when absent, reverted exactly.
    SetMembership,
    /// Opaque objects appended unconditionally under a fresh [`crate::types::ItemId`].
    OrderedAppend,
    /// Unordered string hints union-merged into the workspace; never reverted.
    HintMerge,
}

/// Every category a template can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Folders,
    Labels,
    LabelRules,
    RequestTemplates,
    SharePresets,
    Kpis,
    QuickActions,
    Checklist,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Self::Folders,
        Self::Labels,
        Self::LabelRules,
        Self::RequestTemplates,
        Self::SharePresets,
        Self::Kpis,
        Self::QuickActions,
        Self::Checklist,
    ];

    pub const fn kind(self) -> CategoryKind {
        match self {
            Self::Folders | Self::Labels => CategoryKind::SetMembership,
            Self::LabelRules | Self::RequestTemplates | Self::SharePresets => {
                CategoryKind::OrderedAppend
            }
            Self::Kpis | Self::QuickActions | Self::Checklist => CategoryKind::HintMerge,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Folders => "folders",
            Self::Labels => "labels",
            Self::LabelRules => "label_rules",
            Self::RequestTemplates => "request_templates",
            Self::SharePresets => "share_presets",
            Self::Kpis => "kpis",
            Self::QuickActions => "quick_actions",
            Self::Checklist => "checklist",
        }
    }

    /// Categories of the given kind, in declaration order.
    pub fn of_kind(kind: CategoryKind) -> impl Iterator<Item = Category> {
        Self::ALL.into_iter().filter(move |category| category.kind() == kind)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
