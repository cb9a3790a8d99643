// Engine error taxonomy surfaced to every caller.

use thiserror::Error;
use vaultkit_common::template::TemplateError;

use crate::catalog::CatalogError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown workspace `{workspace_id}`: {reason}")]
    UnknownWorkspace { workspace_id: String, reason: String },

    #[error("template `{template_id}` version {version} not found")]
    TemplateNotFound { template_id: String, version: u32 },

    #[error("malformed template: {0}")]
    MalformedTemplate(#[from] TemplateError),

    #[error("unknown install `{0}`")]
    UnknownInstall(String),

    #[error("workspace store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

impl EngineError {
    /// Stable machine-readable name of the failure.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownWorkspace { .. } => "UNKNOWN_WORKSPACE",
            Self::TemplateNotFound { .. } => "TEMPLATE_NOT_FOUND",
            Self::MalformedTemplate(_) => "MALFORMED_TEMPLATE",
            Self::UnknownInstall(_) => "UNKNOWN_INSTALL",
            Self::StoreFailure(_) => "STORE_FAILURE",
        }
    }
}

impl From<CatalogError> for EngineError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::NotFound { template_id, version } => {
                Self::TemplateNotFound { template_id, version }
            }
            CatalogError::Malformed { error, .. } => Self::MalformedTemplate(error),
            other => Self::MalformedTemplate(TemplateError::Syntax(other.to_string())),
        }
    }
}
