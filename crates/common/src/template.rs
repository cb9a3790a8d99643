//! Starter-kit templates.
//!
//! A [`TemplateSpec`] is the validated, immutable form of a template file.
//! Catalogs parse a [`TemplateDocument`] (every field optional, so missing
//! fields can be reported by name) and promote it with
//! [`TemplateSpec::from_document`]. Folder paths are normalized and label
//! keys trimmed during promotion; the three ordered categories are kept as
//! opaque JSON objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::category::{Category, CategoryKind};
use crate::path::{normalize_folder_path, PathError};
use crate::types::Vertical;

const MAX_TEMPLATE_ID_CHARS: usize = 64;
const MAX_KEY_CHARS: usize = 128;

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("template is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("template id `{0}` must be 1-{MAX_TEMPLATE_ID_CHARS} lowercase letters, digits or `-`")]
    InvalidId(String),

    #[error("template version must be at least 1")]
    InvalidVersion,

    #[error("invalid folder `{path}`: {source}")]
    InvalidFolder {
        path: String,
        #[source]
        source: PathError,
    },

    #[error("{category} entry #{index} is blank or longer than {MAX_KEY_CHARS} characters")]
    InvalidKey { category: Category, index: usize },

    #[error("{category} entry #{index} must be a JSON object")]
    OpaqueItemNotObject { category: Category, index: usize },

    #[error("folder `{0}` is not in normalized form")]
    FolderNotNormalized(String),

    #[error("template document is not valid JSON: {0}")]
    Syntax(String),
}

/// UI shortcuts a template suggests; merged into the workspace, never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiHints {
    pub kpis: Vec<String>,
    #[serde(alias = "quickActions")]
    pub quick_actions: Vec<String>,
    #[serde(alias = "checklistItems", alias = "checklist_items")]
    pub checklist: Vec<String>,
}

/// Template file as written on disk; nothing is validated yet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplateDocument {
    #[serde(alias = "templateId", alias = "template_id")]
    pub id: Option<String>,
    pub version: Option<u32>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub vertical: Option<Vertical>,
    pub folders: Option<Vec<String>>,
    pub labels: Option<Vec<String>>,
    #[serde(alias = "labelRules")]
    pub label_rules: Vec<Value>,
    #[serde(alias = "requestTemplates")]
    pub request_templates: Vec<Value>,
    #[serde(alias = "sharePresets")]
    pub share_presets: Vec<Value>,
    #[serde(alias = "uiHints")]
    pub ui_hints: UiHints,
}

/// Immutable, versioned bundle of items to install into a workspace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateSpec {
    pub id: String,
    pub version: u32,
    pub title: String,
    pub summary: String,
    pub vertical: Vertical,
    pub folders: Vec<String>,
    pub labels: Vec<String>,
    pub label_rules: Vec<Value>,
    pub request_templates: Vec<Value>,
    pub share_presets: Vec<Value>,
    pub ui_hints: UiHints,
}

/// Catalog listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: String,
    pub version: u32,
    pub title: String,
    pub summary: String,
    pub vertical: Vertical,
    pub folder_count: usize,
    pub label_count: usize,
    pub ordered_item_count: usize,
}

impl TemplateSpec {
    pub fn from_json(raw: &str) -> Result<Self, TemplateError> {
        let document: TemplateDocument =
            serde_json::from_str(raw).map_err(|error| TemplateError::Syntax(error.to_string()))?;
        Self::from_document(document)
    }

    pub fn from_document(document: TemplateDocument) -> Result<Self, TemplateError> {
        let id = document.id.ok_or(TemplateError::MissingField("id"))?;
        let id = id.trim().to_owned();
        if !is_valid_template_id(&id) {
            return Err(TemplateError::InvalidId(id));
        }

        let version = document.version.ok_or(TemplateError::MissingField("version"))?;
        if version == 0 {
            return Err(TemplateError::InvalidVersion);
        }

        let folders = document
            .folders
            .ok_or(TemplateError::MissingField("folders"))?
            .iter()
            .map(|raw| {
                normalize_folder_path(raw)
                    .map_err(|source| TemplateError::InvalidFolder { path: raw.clone(), source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let labels = normalize_keys(
            Category::Labels,
            document.labels.ok_or(TemplateError::MissingField("labels"))?,
        )?;

        check_objects(Category::LabelRules, &document.label_rules)?;
        check_objects(Category::RequestTemplates, &document.request_templates)?;
        check_objects(Category::SharePresets, &document.share_presets)?;

        let ui_hints = UiHints {
            kpis: normalize_keys(Category::Kpis, document.ui_hints.kpis)?,
            quick_actions: normalize_keys(Category::QuickActions, document.ui_hints.quick_actions)?,
            checklist: normalize_keys(Category::Checklist, document.ui_hints.checklist)?,
        };

        let title = document
            .title
            .map(|title| title.trim().to_owned())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| id.clone());

        Ok(Self {
            id,
            version,
            title,
            summary: document.summary.unwrap_or_default().trim().to_owned(),
            vertical: document.vertical.unwrap_or_default(),
            folders,
            labels,
            label_rules: document.label_rules,
            request_templates: document.request_templates,
            share_presets: document.share_presets,
            ui_hints,
        })
    }

    /// Re-check a spec that may have been assembled outside
    /// [`TemplateSpec::from_document`].
    pub fn validate(&self) -> Result<(), TemplateError> {
        if !is_valid_template_id(&self.id) {
            return Err(TemplateError::InvalidId(self.id.clone()));
        }
        if self.version == 0 {
            return Err(TemplateError::InvalidVersion);
        }
        for folder in &self.folders {
            let normalized = normalize_folder_path(folder)
                .map_err(|source| TemplateError::InvalidFolder { path: folder.clone(), source })?;
            if normalized != *folder {
                return Err(TemplateError::FolderNotNormalized(folder.clone()));
            }
        }
        for category in Category::ALL {
            match category.kind() {
                CategoryKind::SetMembership | CategoryKind::HintMerge
                    if category != Category::Folders =>
                {
                    let keys = self.keys(category);
                    if let Some(index) = keys.iter().position(|key| !is_valid_key(key)) {
                        return Err(TemplateError::InvalidKey { category, index });
                    }
                }
                CategoryKind::OrderedAppend => check_objects(category, self.values(category))?,
                _ => {}
            }
        }
        Ok(())
    }

    /// String keys the template carries for a set-membership or hint category.
    ///
    /// Empty for ordered categories.
    pub fn keys(&self, category: Category) -> &[String] {
        match category {
            Category::Folders => &self.folders,
            Category::Labels => &self.labels,
            Category::Kpis => &self.ui_hints.kpis,
            Category::QuickActions => &self.ui_hints.quick_actions,
            Category::Checklist => &self.ui_hints.checklist,
            Category::LabelRules | Category::RequestTemplates | Category::SharePresets => &[],
        }
    }

    /// Opaque objects the template carries for an ordered category.
    ///
    /// Empty for every other category.
    pub fn values(&self, category: Category) -> &[Value] {
        match category {
            Category::LabelRules => &self.label_rules,
            Category::RequestTemplates => &self.request_templates,
            Category::SharePresets => &self.share_presets,
            _ => &[],
        }
    }

    pub fn summary(&self) -> TemplateSummary {
        TemplateSummary {
            id: self.id.clone(),
            version: self.version,
            title: self.title.clone(),
            summary: self.summary.clone(),
            vertical: self.vertical,
            folder_count: self.folders.len(),
            label_count: self.labels.len(),
            ordered_item_count: Category::of_kind(CategoryKind::OrderedAppend)
                .map(|category| self.values(category).len())
                .sum(),
        }
    }
}

fn is_valid_template_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_TEMPLATE_ID_CHARS
        && id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn normalize_keys(category: Category, raw: Vec<String>) -> Result<Vec<String>, TemplateError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, key)| {
            let trimmed = key.trim();
            if is_valid_key(trimmed) {
                Ok(trimmed.to_owned())
            } else {
                Err(TemplateError::InvalidKey { category, index })
            }
        })
        .collect()
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.trim() == key
        && key.chars().count() <= MAX_KEY_CHARS
        && !key.chars().any(char::is_control)
}

fn check_objects(category: Category, values: &[Value]) -> Result<(), TemplateError> {
    match values.iter().position(|value| !value.is_object()) {
        Some(index) => Err(TemplateError::OpaqueItemNotObject { category, index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn minimal() -> Value {
        json!({
            "id": "receipts-expenses",
            "version": 1,
            "folders": ["Receipts", "Receipts/2024"],
            "labels": ["Receipt"]
        })
    }

    #[test]
    fn minimal_document_promotes_with_defaults() {
        let spec = TemplateSpec::from_json(&minimal().to_string()).expect("template should parse");
        assert_eq!(spec.title, "receipts-expenses");
        assert_eq!(spec.vertical, Vertical::Business);
        assert!(spec.label_rules.is_empty());
        assert!(spec.ui_hints.kpis.is_empty());
    }

    #[test]
    fn camel_case_aliases_are_accepted() {
        let raw = json!({
            "templateId": "client-intake",
            "version": 2,
            "folders": [],
            "labels": [],
            "labelRules": [{ "match": "invoice", "labels": ["Invoice"] }],
            "uiHints": { "quickActions": ["request-docs"], "checklistItems": ["Invite client"] }
        });
        let spec = TemplateSpec::from_json(&raw.to_string()).expect("template should parse");
        assert_eq!(spec.id, "client-intake");
        assert_eq!(spec.label_rules.len(), 1);
        assert_eq!(spec.ui_hints.quick_actions, vec!["request-docs"]);
        assert_eq!(spec.ui_hints.checklist, vec!["Invite client"]);
    }

    #[test]
    fn missing_required_fields_are_named() {
        for field in ["id", "version", "folders", "labels"] {
            let mut raw = minimal();
            raw.as_object_mut().expect("object").remove(field);
            let error = TemplateSpec::from_json(&raw.to_string()).expect_err("should fail");
            assert_eq!(error, TemplateError::MissingField(field));
        }
    }

    #[test]
    fn folders_are_normalized() {
        let mut raw = minimal();
        raw["folders"] = json!(["/Taxes//2024/ ", "Clients\\Acme"]);
        let spec = TemplateSpec::from_json(&raw.to_string()).expect("template should parse");
        assert_eq!(spec.folders, vec!["Taxes/2024", "Clients/Acme"]);
    }

    #[test]
    fn traversal_folder_is_rejected() {
        let mut raw = minimal();
        raw["folders"] = json!(["Taxes/../Payroll"]);
        let error = TemplateSpec::from_json(&raw.to_string()).expect_err("should fail");
        assert!(matches!(error, TemplateError::InvalidFolder { .. }));
    }

    #[test]
    fn blank_label_is_rejected_with_index() {
        let mut raw = minimal();
        raw["labels"] = json!(["Receipt", "  "]);
        let error = TemplateSpec::from_json(&raw.to_string()).expect_err("should fail");
        assert_eq!(error, TemplateError::InvalidKey { category: Category::Labels, index: 1 });
    }

    #[test]
    fn non_object_ordered_item_is_rejected() {
        let mut raw = minimal();
        raw["share_presets"] = json!([{ "expires_days": 7 }, "public"]);
        let error = TemplateSpec::from_json(&raw.to_string()).expect_err("should fail");
        assert_eq!(
            error,
            TemplateError::OpaqueItemNotObject { category: Category::SharePresets, index: 1 }
        );
    }

    #[test]
    fn uppercase_template_id_is_rejected() {
        let mut raw = minimal();
        raw["id"] = json!("Receipts");
        let error = TemplateSpec::from_json(&raw.to_string()).expect_err("should fail");
        assert_eq!(error, TemplateError::InvalidId("Receipts".to_owned()));
    }

    #[test]
    fn zero_version_is_rejected() {
        let mut raw = minimal();
        raw["version"] = json!(0);
        let error = TemplateSpec::from_json(&raw.to_string()).expect_err("should fail");
        assert_eq!(error, TemplateError::InvalidVersion);
    }

    #[test]
    fn validate_accepts_promoted_spec_and_catches_hand_built_mistakes() {
        let spec = TemplateSpec::from_json(&minimal().to_string()).expect("template should parse");
        assert_eq!(spec.validate(), Ok(()));

        let mut unnormalized = spec.clone();
        unnormalized.folders.push("/Taxes/".to_owned());
        assert_eq!(
            unnormalized.validate(),
            Err(TemplateError::FolderNotNormalized("/Taxes/".to_owned()))
        );

        let mut opaque = spec;
        opaque.request_templates.push(json!(42));
        assert_eq!(
            opaque.validate(),
            Err(TemplateError::OpaqueItemNotObject {
                category: Category::RequestTemplates,
                index: 0
            })
        );
    }

    #[test]
    fn summary_counts_ordered_items_across_categories() {
        let mut raw = minimal();
        raw["label_rules"] = json!([{}, {}]);
        raw["request_templates"] = json!([{}]);
        let spec = TemplateSpec::from_json(&raw.to_string()).expect("template should parse");
        let summary = spec.summary();
        assert_eq!(summary.folder_count, 2);
        assert_eq!(summary.label_count, 1);
        assert_eq!(summary.ordered_item_count, 3);
    }
}
