// Workspace folder path handling.

pub mod normalize;

pub use normalize::{normalize_folder_path, PathError};
