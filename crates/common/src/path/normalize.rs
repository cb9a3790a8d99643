// Folder path canonicalization: NFKC normalization, traversal rejection, 256 char max.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Maximum allowed folder path length in characters.
const MAX_FOLDER_PATH_CHARS: usize = 256;

/// Maximum nesting depth of a folder path.
const MAX_FOLDER_DEPTH: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("folder path is empty")]
    Empty,

    #[error("folder path exceeds maximum length of {MAX_FOLDER_PATH_CHARS} characters")]
    TooLong,

    #[error("folder path nests deeper than {MAX_FOLDER_DEPTH} levels")]
    TooDeep,

    #[error("folder path contains directory traversal component: {0}")]
    Traversal(String),

    #[error("folder path contains a control character")]
    ControlCharacter,

    #[error("folder path contains invalid component: {0}")]
    InvalidComponent(String),
}

/// Normalize a workspace folder path so that set membership is stable.
///
/// Rules:
/// - Apply Unicode NFKC normalization
/// - Convert `\` separators to `/`
/// - Trim surrounding whitespace from every component
/// - Collapse empty components (leading, trailing and doubled `/`)
/// - Reject `.` and `..` components and control characters
/// - Enforce the length and depth limits after normalization
pub fn normalize_folder_path(input: &str) -> Result<String, PathError> {
    if input.chars().any(char::is_control) {
        return Err(PathError::ControlCharacter);
    }

    let normalized: String = input.nfkc().collect();
    let unified = normalized.replace('\\', "/");

    let components: Vec<&str> =
        unified.split('/').map(str::trim).filter(|s| !s.is_empty()).collect();

    if components.is_empty() {
        return Err(PathError::Empty);
    }

    for component in &components {
        match *component {
            "." | ".." => return Err(PathError::Traversal((*component).to_string())),
            _ if component.starts_with('.') && component.chars().all(|c| c == '.') => {
                return Err(PathError::InvalidComponent((*component).to_string()));
            }
            _ => {}
        }
    }

    if components.len() > MAX_FOLDER_DEPTH {
        return Err(PathError::TooDeep);
    }

    let result = components.join("/");

    if result.chars().count() > MAX_FOLDER_PATH_CHARS {
        return Err(PathError::TooLong);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_path_is_unchanged() {
        assert_eq!(normalize_folder_path("Taxes/2024").unwrap(), "Taxes/2024");
    }

    #[test]
    fn backslashes_become_forward_slashes() {
        assert_eq!(normalize_folder_path("Clients\\Acme\\Intake").unwrap(), "Clients/Acme/Intake");
    }

    #[test]
    fn leading_trailing_and_doubled_slashes_collapse() {
        assert_eq!(normalize_folder_path("//Receipts///2024/").unwrap(), "Receipts/2024");
    }

    #[test]
    fn component_whitespace_is_trimmed() {
        assert_eq!(normalize_folder_path(" Taxes / 2024 ").unwrap(), "Taxes/2024");
    }

    #[test]
    fn nfkc_folds_compatibility_characters() {
        // U+FB01 (fi ligature) folds to "fi"
        assert_eq!(normalize_folder_path("\u{FB01}les").unwrap(), "files");
    }

    #[test]
    fn combining_accents_compose() {
        let composed = normalize_folder_path("Caf\u{0065}\u{0301}").unwrap();
        assert_eq!(composed, normalize_folder_path("Café").unwrap());
    }

    #[test]
    fn rejects_traversal_components() {
        assert_eq!(
            normalize_folder_path("Taxes/../Payroll"),
            Err(PathError::Traversal("..".to_string()))
        );
        assert_eq!(normalize_folder_path("./Taxes"), Err(PathError::Traversal(".".to_string())));
    }

    #[test]
    fn rejects_dot_only_components() {
        assert_eq!(
            normalize_folder_path("Taxes/..."),
            Err(PathError::InvalidComponent("...".to_string()))
        );
    }

    #[test]
    fn rejects_empty_and_slash_only() {
        assert_eq!(normalize_folder_path(""), Err(PathError::Empty));
        assert_eq!(normalize_folder_path(" / / "), Err(PathError::Empty));
    }

    #[test]
    fn rejects_control_characters() {
        assert_eq!(normalize_folder_path("Tax\0es"), Err(PathError::ControlCharacter));
        assert_eq!(normalize_folder_path("Tax\nes"), Err(PathError::ControlCharacter));
    }

    #[test]
    fn enforces_length_limit() {
        assert!(normalize_folder_path(&"a".repeat(256)).is_ok());
        assert_eq!(normalize_folder_path(&"a".repeat(257)), Err(PathError::TooLong));
    }

    #[test]
    fn enforces_depth_limit() {
        assert!(normalize_folder_path(&["a"; 8].join("/")).is_ok());
        assert_eq!(normalize_folder_path(&["a"; 9].join("/")), Err(PathError::TooDeep));
    }

    #[test]
    fn dotted_names_are_allowed() {
        assert_eq!(normalize_folder_path(".archive/v1.2").unwrap(), ".archive/v1.2");
    }
}
