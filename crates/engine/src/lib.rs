// vaultkit-engine: template catalog, workspace stores and install operations.

pub mod catalog;
pub mod config;
pub mod error;
pub mod install;
pub mod lock;
pub mod service;
pub mod store;

pub use catalog::{CatalogError, StaticCatalog, TemplateCatalog};
pub use config::EngineConfig;
pub use error::EngineError;
pub use install::OrderedRollback;
pub use service::{EngineResult, InstallEngine};
pub use store::{MemoryStore, SqliteStore, StoreError, StoreWrite, WorkspaceStore};
