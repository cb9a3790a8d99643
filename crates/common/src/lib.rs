// vaultkit-common: shared types for the workspace template installation engine

pub mod category;
pub mod install;
pub mod path;
pub mod template;
pub mod types;
pub mod workspace;
