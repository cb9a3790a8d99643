// JSON routes over the install engine.
//
// Handlers only parse input and serialize output; every engine call runs on
// the blocking pool because the engine and its stores are synchronous.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use vaultkit_common::install::{CollisionReport, InstallLog, RollbackResult};
use vaultkit_common::template::TemplateSummary;
use vaultkit_common::types::{InstallId, Vertical};
use vaultkit_common::workspace::WorkspaceState;
use vaultkit_engine::{EngineResult, InstallEngine};

use crate::error::{ApiError, ErrorCode};

#[derive(Clone)]
struct ApiState {
    engine: Arc<InstallEngine>,
}

#[derive(Debug, Deserialize)]
struct TemplatesQuery {
    vertical: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstallRequest {
    template_id: String,
    /// Latest published version when absent.
    version: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TemplatesEnvelope {
    templates: Vec<TemplateSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
struct InstallsEnvelope {
    installs: Vec<InstallLog>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PreviewEnvelope {
    template_id: String,
    version: u32,
    collisions: CollisionReport,
}

pub fn router(engine: Arc<InstallEngine>) -> Router {
    Router::new()
        .route("/v1/templates", get(list_templates))
        .route("/v1/workspaces/{workspace_id}", get(get_workspace))
        .route("/v1/workspaces/{workspace_id}/installs", post(apply_install).get(list_installs))
        .route("/v1/workspaces/{workspace_id}/installs/preview", post(preview_install))
        .route("/v1/installs/{install_id}", get(get_install))
        .route("/v1/installs/{install_id}/rollback", post(rollback_install))
        .with_state(ApiState { engine })
}

async fn list_templates(
    State(state): State<ApiState>,
    Query(query): Query<TemplatesQuery>,
) -> Result<Json<TemplatesEnvelope>, ApiError> {
    let vertical = query
        .vertical
        .as_deref()
        .map(str::parse::<Vertical>)
        .transpose()
        .map_err(ApiError::validation)?;

    let templates = state.engine.list_templates(vertical);
    Ok(Json(TemplatesEnvelope { templates }))
}

async fn get_workspace(
    State(state): State<ApiState>,
    Path(workspace_id): Path<String>,
) -> Result<Json<WorkspaceState>, ApiError> {
    run_blocking(state, move |engine| engine.get_workspace(&workspace_id)).await.map(Json)
}

async fn preview_install(
    State(state): State<ApiState>,
    Path(workspace_id): Path<String>,
    payload: Result<Json<InstallRequest>, JsonRejection>,
) -> Result<Json<PreviewEnvelope>, ApiError> {
    let request = parse_install_request(payload)?;
    run_blocking(state, move |engine| {
        let version = engine.resolve_version(&request.template_id, request.version);
        let collisions = engine.preview_collisions(&workspace_id, &request.template_id, version)?;
        Ok(PreviewEnvelope { template_id: request.template_id, version, collisions })
    })
    .await
    .map(Json)
}

async fn apply_install(
    State(state): State<ApiState>,
    Path(workspace_id): Path<String>,
    payload: Result<Json<InstallRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InstallLog>), ApiError> {
    let request = parse_install_request(payload)?;
    let log = run_blocking(state, move |engine| {
        let version = engine.resolve_version(&request.template_id, request.version);
        engine.apply_install(&workspace_id, &request.template_id, version)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn list_installs(
    State(state): State<ApiState>,
    Path(workspace_id): Path<String>,
) -> Result<Json<InstallsEnvelope>, ApiError> {
    let installs = run_blocking(state, move |engine| engine.list_installs(&workspace_id)).await?;
    Ok(Json(InstallsEnvelope { installs }))
}

async fn get_install(
    State(state): State<ApiState>,
    Path(install_id): Path<String>,
) -> Result<Json<InstallLog>, ApiError> {
    let install_id = parse_install_id(&install_id)?;
    run_blocking(state, move |engine| engine.get_install(install_id)).await.map(Json)
}

async fn rollback_install(
    State(state): State<ApiState>,
    Path(install_id): Path<String>,
) -> Result<Json<RollbackResult>, ApiError> {
    let install_id = parse_install_id(&install_id)?;
    run_blocking(state, move |engine| engine.rollback(install_id)).await.map(Json)
}

async fn run_blocking<T, F>(state: ApiState, operation: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&InstallEngine) -> EngineResult<T> + Send + 'static,
{
    let engine = state.engine;
    match tokio::task::spawn_blocking(move || operation(&engine)).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(join_error) => {
            tracing::error!(?join_error, "engine task failed");
            Err(ApiError::from_code(ErrorCode::InternalError))
        }
    }
}

fn parse_install_request(
    payload: Result<Json<InstallRequest>, JsonRejection>,
) -> Result<InstallRequest, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::validation(rejection.body_text()))?;
    if request.template_id.trim().is_empty() {
        return Err(ApiError::validation("template_id must not be empty"));
    }
    Ok(request)
}

fn parse_install_id(raw: &str) -> Result<InstallId, ApiError> {
    raw.parse().map_err(|_| ApiError::validation(format!("`{raw}` is not a valid install id")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use vaultkit_engine::{MemoryStore, StaticCatalog};

    fn test_router() -> Router {
        let catalog = StaticCatalog::builtin().expect("builtin catalog");
        let engine = InstallEngine::new(Arc::new(catalog), Arc::new(MemoryStore::new()));
        router(Arc::new(engine))
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        router
            .clone()
            .oneshot(request.body(body).expect("request should build"))
            .await
            .expect("request should return response")
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let body =
            to_bytes(response.into_body(), usize::MAX).await.expect("response body should read");
        serde_json::from_slice(&body).expect("response body should be valid json")
    }

    #[tokio::test]
    async fn list_templates_filters_by_vertical() {
        let router = test_router();

        let response = send(&router, Method::GET, "/v1/templates", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let all: TemplatesEnvelope = read_json(response).await;
        assert_eq!(all.templates.len(), 3);

        let response = send(&router, Method::GET, "/v1/templates?vertical=personal", None).await;
        let personal: TemplatesEnvelope = read_json(response).await;
        assert!(!personal.templates.is_empty());
        assert!(personal.templates.iter().all(|t| t.vertical == Vertical::Personal));

        let response = send(&router, Method::GET, "/v1/templates?vertical=enterprise", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn preview_install_rollback_flow() {
        let router = test_router();
        let body = json!({ "template_id": "receipts-expenses", "version": 1 });

        let response =
            send(&router, Method::POST, "/v1/workspaces/org-1/installs/preview", Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let preview: PreviewEnvelope = read_json(response).await;
        assert!(preview.collisions.is_empty());

        let response = send(&router, Method::POST, "/v1/workspaces/org-1/installs", Some(body.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let log: InstallLog = read_json(response).await;
        assert!(log.created_items.folders.contains(&"Receipts".to_owned()));

        let response =
            send(&router, Method::POST, "/v1/workspaces/org-1/installs/preview", Some(body)).await;
        let preview: PreviewEnvelope = read_json(response).await;
        assert_eq!(preview.collisions.folders, log.created_items.folders);

        let response = send(&router, Method::GET, "/v1/workspaces/org-1/installs", None).await;
        let installs: InstallsEnvelope = read_json(response).await;
        assert_eq!(installs.installs, vec![log.clone()]);

        let uri = format!("/v1/installs/{}", log.install_id);
        let response = send(&router, Method::GET, &uri, None).await;
        assert_eq!(read_json::<InstallLog>(response).await, log);

        let uri = format!("/v1/installs/{}/rollback", log.install_id);
        let response = send(&router, Method::POST, &uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let result: RollbackResult = read_json(response).await;
        assert_eq!(result.reverted.folders, log.created_items.folders.len());
        assert!(result.ui_hints_retained);

        let response = send(&router, Method::POST, &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: Value = read_json(response).await;
        assert_eq!(error["error"]["code"], "UNKNOWN_INSTALL");

        let response = send(&router, Method::GET, "/v1/workspaces/org-1", None).await;
        let workspace: WorkspaceState = read_json(response).await;
        assert!(workspace.folders.is_empty());
        assert_eq!(workspace.revision, 2);
    }

    #[tokio::test]
    async fn install_without_version_uses_latest() {
        let router = test_router();
        let response = send(
            &router,
            Method::POST,
            "/v1/workspaces/org-1/installs",
            Some(json!({ "template_id": "starter-vault" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let log: InstallLog = read_json(response).await;
        assert_eq!(log.version, 1);
    }

    #[tokio::test]
    async fn unknown_template_is_not_found() {
        let router = test_router();
        let response = send(
            &router,
            Method::POST,
            "/v1/workspaces/org-1/installs",
            Some(json!({ "template_id": "payroll", "version": 1 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: Value = read_json(response).await;
        assert_eq!(error["error"]["code"], "TEMPLATE_NOT_FOUND");
        assert_eq!(error["error"]["retryable"], false);
    }

    #[tokio::test]
    async fn invalid_workspace_id_is_unknown_workspace() {
        let router = test_router();
        let response = send(
            &router,
            Method::POST,
            "/v1/workspaces/org%201/installs",
            Some(json!({ "template_id": "starter-vault", "version": 1 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: Value = read_json(response).await;
        assert_eq!(error["error"]["code"], "UNKNOWN_WORKSPACE");
    }

    #[tokio::test]
    async fn malformed_bodies_fail_validation() {
        let router = test_router();
        for body in [json!({ "version": 1 }), json!({ "template_id": "  " }), json!([1, 2])] {
            let response =
                send(&router, Method::POST, "/v1/workspaces/org-1/installs", Some(body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let error: Value = read_json(response).await;
            assert_eq!(error["error"]["code"], "VALIDATION_FAILED");
        }
    }

    #[tokio::test]
    async fn invalid_install_id_fails_validation() {
        let router = test_router();
        let response = send(&router, Method::POST, "/v1/installs/not-a-uuid/rollback", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unseen_workspace_reads_as_empty() {
        let router = test_router();
        let response = send(&router, Method::GET, "/v1/workspaces/org-new", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let workspace: WorkspaceState = read_json(response).await;
        assert_eq!(workspace.revision, 0);
        assert!(workspace.labels.is_empty());
    }
}
