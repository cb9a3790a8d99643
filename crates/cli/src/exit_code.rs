// Consistent exit codes for the vaultkit CLI.
//
//   0 = success
//   1 = general error
//   2 = usage/argument error
//   3 = unknown workspace, template or install
//   4 = malformed template
//   5 = store failure

use std::process;

use vaultkit_engine::EngineError;

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    NotFound = 3,
    Malformed = 4,
    Store = 5,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<EngineError>())
            .map(|engine_error| Self::from_engine_code(engine_error.code()))
            .unwrap_or(Self::Error)
    }

    /// Map an engine error code string to an exit code.
    pub fn from_engine_code(code: &str) -> Self {
        match code {
            "UNKNOWN_WORKSPACE" | "TEMPLATE_NOT_FOUND" | "UNKNOWN_INSTALL" => Self::NotFound,
            "MALFORMED_TEMPLATE" => Self::Malformed,
            "STORE_FAILURE" => Self::Store,
            "VALIDATION_FAILED" => Self::Usage,
            _ => Self::Error,
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultkit_common::template::TemplateError;
    use vaultkit_engine::StoreError;

    #[test]
    fn exit_code_values() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Error.code(), 1);
        assert_eq!(ExitCode::Usage.code(), 2);
        assert_eq!(ExitCode::NotFound.code(), 3);
        assert_eq!(ExitCode::Malformed.code(), 4);
        assert_eq!(ExitCode::Store.code(), 5);
    }

    #[test]
    fn from_engine_code_not_found_family() {
        for code in ["UNKNOWN_WORKSPACE", "TEMPLATE_NOT_FOUND", "UNKNOWN_INSTALL"] {
            assert_eq!(ExitCode::from_engine_code(code), ExitCode::NotFound);
        }
    }

    #[test]
    fn from_engine_code_unknown_is_general_error() {
        assert_eq!(ExitCode::from_engine_code("SOMETHING_ELSE"), ExitCode::Error);
    }

    #[test]
    fn from_error_engine_error_in_chain() {
        let err = anyhow::Error::new(EngineError::MalformedTemplate(TemplateError::InvalidVersion))
            .context("install failed");
        assert_eq!(ExitCode::from_error(&err), ExitCode::Malformed);

        let err = anyhow::Error::new(EngineError::StoreFailure(StoreError::Poisoned));
        assert_eq!(ExitCode::from_error(&err), ExitCode::Store);
    }

    #[test]
    fn from_error_generic_is_error() {
        let err = anyhow::anyhow!("something went wrong");
        assert_eq!(ExitCode::from_error(&err), ExitCode::Error);
    }
}
