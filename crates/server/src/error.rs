use std::future::Future;

use axum::{
    http::{header::HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;
use vaultkit_engine::EngineError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationFailed,
    UnknownWorkspace,
    TemplateNotFound,
    MalformedTemplate,
    UnknownInstall,
    NotFound,
    StoreFailure,
    InternalError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::UnknownWorkspace => "UNKNOWN_WORKSPACE",
            Self::TemplateNotFound => "TEMPLATE_NOT_FOUND",
            Self::MalformedTemplate => "MALFORMED_TEMPLATE",
            Self::UnknownInstall => "UNKNOWN_INSTALL",
            Self::NotFound => "NOT_FOUND",
            Self::StoreFailure => "STORE_FAILURE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub const fn status(self) -> StatusCode {
        match self {
            Self::ValidationFailed => StatusCode::BAD_REQUEST,
            Self::UnknownWorkspace
            | Self::TemplateNotFound
            | Self::UnknownInstall
            | Self::NotFound => StatusCode::NOT_FOUND,
            Self::MalformedTemplate => StatusCode::UNPROCESSABLE_ENTITY,
            Self::StoreFailure => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn retryable(self) -> bool {
        matches!(self, Self::StoreFailure | Self::InternalError)
    }

    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ValidationFailed => "request validation failed",
            Self::UnknownWorkspace => "workspace could not be resolved",
            Self::TemplateNotFound => "template not found",
            Self::MalformedTemplate => "template is malformed",
            Self::UnknownInstall => "install not found",
            Self::NotFound => "requested resource not found",
            Self::StoreFailure => "workspace store is unavailable",
            Self::InternalError => "internal server error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Value,
    request_id: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), details: json!({}), request_id: None }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl From<EngineError> for ApiError {
    fn from(error: EngineError) -> Self {
        match &error {
            EngineError::UnknownWorkspace { workspace_id, reason } => {
                Self::new(ErrorCode::UnknownWorkspace, error.to_string())
                    .with_details(json!({ "workspace_id": workspace_id, "reason": reason }))
            }
            EngineError::TemplateNotFound { template_id, version } => {
                Self::new(ErrorCode::TemplateNotFound, error.to_string())
                    .with_details(json!({ "template_id": template_id, "version": version }))
            }
            EngineError::MalformedTemplate(_) => {
                Self::new(ErrorCode::MalformedTemplate, error.to_string())
            }
            EngineError::UnknownInstall(install_id) => {
                Self::new(ErrorCode::UnknownInstall, error.to_string())
                    .with_details(json!({ "install_id": install_id }))
            }
            EngineError::StoreFailure(source) => {
                tracing::error!(error = %source, "workspace store failure");
                Self::from_code(ErrorCode::StoreFailure)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = self.request_id.or_else(current_request_id);

        let mut response = (
            self.code.status(),
            Json(json!({
                "error": {
                    "code": self.code.as_str(),
                    "message": self.message,
                    "retryable": self.code.retryable(),
                    "request_id": request_id.clone(),
                    "details": self.details,
                }
            })),
        )
            .into_response();

        if let Some(request_id) = request_id {
            attach_request_id_header(&mut response, &request_id);
        }

        response
    }
}

pub async fn with_request_id_scope<F>(request_id: String, future: F) -> F::Output
where
    F: Future,
{
    REQUEST_ID.scope(request_id, future).await
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

pub fn request_id_from_headers_or_generate(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub fn attach_request_id_header(response: &mut Response, request_id: &str) {
    if let Ok(header) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use serde_json::Value;
    use vaultkit_common::template::TemplateError;
    use vaultkit_engine::{EngineError, StoreError};

    use super::{with_request_id_scope, ApiError, ErrorCode};

    async fn read_body(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("error response body should be readable");
        serde_json::from_slice(&body).expect("error response body should be valid json")
    }

    #[tokio::test]
    async fn api_error_uses_scoped_request_id() {
        let response = with_request_id_scope("req-scoped-123".to_owned(), async {
            ApiError::from_code(ErrorCode::InternalError).into_response()
        })
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["x-request-id"], "req-scoped-123");
        let parsed = read_body(response).await;
        assert_eq!(parsed["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(parsed["error"]["retryable"], true);
        assert_eq!(parsed["error"]["request_id"], "req-scoped-123");
        assert_eq!(parsed["error"]["details"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn explicit_request_id_overrides_scope() {
        let response = with_request_id_scope("req-scoped-123".to_owned(), async {
            ApiError::from_code(ErrorCode::NotFound).with_request_id("req-explicit-456").into_response()
        })
        .await;

        let parsed = read_body(response).await;
        assert_eq!(parsed["error"]["request_id"], "req-explicit-456");
    }

    #[test]
    fn engine_errors_map_to_documented_statuses() {
        let cases = [
            (
                EngineError::UnknownWorkspace { workspace_id: String::new(), reason: "empty".into() },
                ErrorCode::UnknownWorkspace,
                StatusCode::NOT_FOUND,
            ),
            (
                EngineError::TemplateNotFound { template_id: "kit".into(), version: 2 },
                ErrorCode::TemplateNotFound,
                StatusCode::NOT_FOUND,
            ),
            (
                EngineError::MalformedTemplate(TemplateError::InvalidVersion),
                ErrorCode::MalformedTemplate,
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                EngineError::UnknownInstall("abc".into()),
                ErrorCode::UnknownInstall,
                StatusCode::NOT_FOUND,
            ),
            (
                EngineError::StoreFailure(StoreError::Poisoned),
                ErrorCode::StoreFailure,
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (engine_error, code, status) in cases {
            let api_error = ApiError::from(engine_error);
            assert_eq!(api_error.code(), code);
            assert_eq!(code.status(), status);
        }
        assert!(ErrorCode::StoreFailure.retryable());
        assert!(!ErrorCode::UnknownInstall.retryable());
    }

    #[tokio::test]
    async fn store_failure_hides_internal_detail() {
        let response = ApiError::from(EngineError::StoreFailure(StoreError::Unavailable(
            "disk /var/lib/vaultkit full".into(),
        )))
        .into_response();

        let parsed = read_body(response).await;
        assert_eq!(parsed["error"]["code"], "STORE_FAILURE");
        assert_eq!(parsed["error"]["message"], "workspace store is unavailable");
        assert_eq!(parsed["error"]["retryable"], true);
    }

    #[tokio::test]
    async fn template_not_found_carries_details() {
        let response = ApiError::from(EngineError::TemplateNotFound {
            template_id: "payroll".into(),
            version: 3,
        })
        .into_response();

        let parsed = read_body(response).await;
        assert_eq!(parsed["error"]["details"]["template_id"], "payroll");
        assert_eq!(parsed["error"]["details"]["version"], 3);
    }
}
