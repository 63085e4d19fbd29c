//! REST API handlers.
//!
//! Each handler checks the admin password, calls the deployer, and returns
//! JSON. Failures carry the deployer's error code and kind so the panel can
//! show a specific hint.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use appfleet_core::{DeploymentPolicy, MigrationStrategy, SelectionStrategy, SetConfigStrategy};
use appfleet_deployer::{DeployError, ErrorKind};
use appfleet_platform::ConfigVars;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
            message: None,
        })
        .into_response()
    }
}

fn not_authorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some("not_authorized".to_string()),
            kind: None,
            message: None,
        }),
    )
        .into_response()
}

fn error_response(err: &DeployError) -> Response {
    let status = match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidParams => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
    };
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(err.code().to_string()),
            kind: Some(err.kind()),
            message: Some(err.to_string()),
        }),
    )
        .into_response()
}

/// A body that did not parse still gets the JSON envelope.
fn invalid_request(rejection: &JsonRejection) -> Response {
    warn!(status = %rejection.status(), error = %rejection.body_text(), "rejected request body");
    (
        rejection.status(),
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some("invalid_request".to_string()),
            kind: Some(ErrorKind::InvalidParams),
            message: Some(rejection.body_text()),
        }),
    )
        .into_response()
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|Json(req)| req).map_err(|e| invalid_request(&e))
}

fn respond<T: Serialize>(result: Result<T, DeployError>) -> Response {
    match result {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => error_response(&e),
    }
}

// ── Request bodies ─────────────────────────────────────────────

/// Body of every admin request.
#[derive(Debug, Default, Deserialize)]
pub struct AdminRequest {
    #[serde(rename = "ADMIN_PASS", default)]
    pub admin_pass: Option<String>,
}

/// Deploy request body. Policy fields left out take the server default.
#[derive(Debug, Default, Deserialize)]
pub struct DeployRequest {
    #[serde(rename = "ADMIN_PASS", default)]
    pub admin_pass: Option<String>,
    #[serde(default)]
    pub migration_strategy: Option<MigrationStrategy>,
    #[serde(default)]
    pub selection_strategy: Option<SelectionStrategy>,
    #[serde(default)]
    pub set_config_strategy: Option<SetConfigStrategy>,
    #[serde(default)]
    pub deploy_to: Option<String>,
}

impl DeployRequest {
    pub fn policy(&self, defaults: &DeploymentPolicy) -> DeploymentPolicy {
        DeploymentPolicy {
            migration_strategy: self.migration_strategy.unwrap_or(defaults.migration_strategy),
            selection_strategy: self.selection_strategy.unwrap_or(defaults.selection_strategy),
            set_config_strategy: self.set_config_strategy.unwrap_or(defaults.set_config_strategy),
            deploy_to: self.deploy_to.clone().or_else(|| defaults.deploy_to.clone()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SetConfigRequest {
    #[serde(rename = "ADMIN_PASS", default)]
    pub admin_pass: Option<String>,
    #[serde(default)]
    pub config: ConfigVars,
}

// ── Server ─────────────────────────────────────────────────────

/// GET /api/init
pub async fn init(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(serde_json::json!({
        "server_started_at": state.started_at,
        "index_title": state.title,
    }))
}

/// POST /api/appman
pub async fn appman(
    State(state): State<ApiState>,
    body: Result<Json<AdminRequest>, JsonRejection>,
) -> Response {
    let req = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    if !state.is_admin(req.admin_pass.as_deref()) {
        return not_authorized();
    }
    let report = state.deployer.refresh().await;
    let snapshot = state.deployer.snapshot().await;
    ApiResponse::ok(serde_json::json!({
        "refresh": report,
        "accounts": snapshot.view(),
        "configured_apps": state.deployer.app_names().collect::<Vec<_>>(),
    }))
}

// ── Apps ───────────────────────────────────────────────────────

/// POST /api/apps/:name/deploy
pub async fn deploy(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: Result<Json<DeployRequest>, JsonRejection>,
) -> Response {
    let req = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    if !state.is_admin(req.admin_pass.as_deref()) {
        return not_authorized();
    }
    let policy = req.policy(&state.default_policy);
    let result = state.deployer.deploy(&name, &policy).await;
    match &result {
        Ok(report) => info!(app = %name, account = %report.account, "deploy request done"),
        Err(e) => warn!(app = %name, code = e.code(), error = %e, "deploy request failed"),
    }
    respond(result)
}

/// POST /api/apps/:name/delete
pub async fn delete_app(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: Result<Json<AdminRequest>, JsonRejection>,
) -> Response {
    let req = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    if !state.is_admin(req.admin_pass.as_deref()) {
        return not_authorized();
    }
    respond(state.deployer.delete_app(&name).await)
}

/// POST /api/apps/:name/config
pub async fn get_config(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: Result<Json<AdminRequest>, JsonRejection>,
) -> Response {
    let req = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    if !state.is_admin(req.admin_pass.as_deref()) {
        return not_authorized();
    }
    respond(state.deployer.get_config(&name).await)
}

/// POST /api/apps/:name/config/set
pub async fn set_config(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: Result<Json<SetConfigRequest>, JsonRejection>,
) -> Response {
    let req = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    if !state.is_admin(req.admin_pass.as_deref()) {
        return not_authorized();
    }
    respond(state.deployer.set_config(&name, &req.config).await)
}

/// POST /api/apps/:name/builds
pub async fn list_builds(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: Result<Json<AdminRequest>, JsonRejection>,
) -> Response {
    let req = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    if !state.is_admin(req.admin_pass.as_deref()) {
        return not_authorized();
    }
    respond(state.deployer.get_builds(&name).await)
}
