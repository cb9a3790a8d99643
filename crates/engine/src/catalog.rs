// Read-only template catalog.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use vaultkit_common::template::{TemplateError, TemplateSpec, TemplateSummary};
use vaultkit_common::types::Vertical;

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("starter-vault.json", include_str!("../templates/starter-vault.json")),
    ("receipts-expenses.json", include_str!("../templates/receipts-expenses.json")),
    ("client-intake-basics.json", include_str!("../templates/client-intake-basics.json")),
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("template `{template_id}` version {version} not found")]
    NotFound { template_id: String, version: u32 },

    #[error("template file `{source_name}` is malformed: {error}")]
    Malformed { source_name: String, error: TemplateError },

    #[error("template `{template_id}` version {version} is defined twice")]
    Duplicate { template_id: String, version: u32 },

    #[error("failed to read template catalog at `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of immutable template specs.
pub trait TemplateCatalog: Send + Sync {
    fn get_template(&self, template_id: &str, version: u32) -> Result<Arc<TemplateSpec>, CatalogError>;

    /// Summaries of every template, ordered by id then version.
    fn list(&self) -> Vec<TemplateSummary>;

    /// Highest version published for `template_id`.
    fn latest_version(&self, template_id: &str) -> Option<u32>;

    fn list_vertical(&self, vertical: Option<Vertical>) -> Vec<TemplateSummary> {
        self.list()
            .into_iter()
            .filter(|summary| match vertical {
                Some(vertical) => summary.vertical == vertical,
                None => true,
            })
            .collect()
    }
}

/// Catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    templates: BTreeMap<(String, u32), Arc<TemplateSpec>>,
}

impl StaticCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog of the starter kits shipped with the engine.
    pub fn builtin() -> Result<Self, CatalogError> {
        let mut catalog = Self::empty();
        for (name, raw) in BUILTIN_TEMPLATES {
            catalog.insert_json(name, raw)?;
        }
        Ok(catalog)
    }

    /// Built-in kits plus every `*.json` file in `dir`, when given.
    pub fn with_dir(dir: Option<&Path>) -> Result<Self, CatalogError> {
        let mut catalog = Self::builtin()?;
        if let Some(dir) = dir {
            catalog.load_dir(dir)?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, spec: TemplateSpec) -> Result<(), CatalogError> {
        let key = (spec.id.clone(), spec.version);
        if self.templates.contains_key(&key) {
            return Err(CatalogError::Duplicate { template_id: key.0, version: key.1 });
        }
        self.templates.insert(key, Arc::new(spec));
        Ok(())
    }

    /// Load every `*.json` file in `dir`, in file-name order.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, CatalogError> {
        let io_error = |source| CatalogError::Io { path: dir.to_path_buf(), source };
        let mut paths = fs::read_dir(dir)
            .map_err(io_error)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_error)?;
        paths.retain(|path| path.extension().is_some_and(|ext| ext == "json") && path.is_file());
        paths.sort();

        for path in &paths {
            let raw = fs::read_to_string(path)
                .map_err(|source| CatalogError::Io { path: path.clone(), source })?;
            self.insert_json(&path.display().to_string(), &raw)?;
        }
        debug!(dir = %dir.display(), loaded = paths.len(), "loaded template directory");
        Ok(paths.len())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn insert_json(&mut self, source_name: &str, raw: &str) -> Result<(), CatalogError> {
        let spec = TemplateSpec::from_json(raw).map_err(|error| CatalogError::Malformed {
            source_name: source_name.to_owned(),
            error,
        })?;
        self.insert(spec)
    }
}

impl TemplateCatalog for StaticCatalog {
    fn get_template(&self, template_id: &str, version: u32) -> Result<Arc<TemplateSpec>, CatalogError> {
        self.templates.get(&(template_id.to_owned(), version)).cloned().ok_or_else(|| {
            CatalogError::NotFound { template_id: template_id.to_owned(), version }
        })
    }

    fn list(&self) -> Vec<TemplateSummary> {
        self.templates.values().map(|spec| spec.summary()).collect()
    }

    fn latest_version(&self, template_id: &str) -> Option<u32> {
        self.templates
            .range((template_id.to_owned(), 0)..=(template_id.to_owned(), u32::MAX))
            .next_back()
            .map(|((_, version), _)| *version)
    }
}
