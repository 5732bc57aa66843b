//! HTTP API over the pipeline.

use axum::{
    Extension, Router,
    extract::{Path, Request, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use scriptorium_core::{
    EvaluationCriteria, GenerationRequest, GenerationRun, ProductMetadata, StyleOptions, new_id,
};
use scriptorium_error::{PipelineError, ScriptoriumError};
use scriptorium_pipeline::Pipeline;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Header carrying the caller's request id; echoed on every response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const REQUEST_PREFIX: &str = "req";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct ApiState {
    pipeline: Pipeline,
}

impl ApiState {
    /// Creates new API state.
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    /// The wrapped pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

/// Creates the API router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/generate", post(generate))
        .route("/select", post(select))
        .route("/evaluate", post(evaluate))
        .route("/runs/:run_id", get(get_run))
        .route("/projects/:project_id/runs", get(list_runs))
        .layer(middleware::from_fn(assign_request_id))
        .with_state(state)
}

/// Request id for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Reuses the caller's `x-request-id` or generates one, and echoes it back.
async fn assign_request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| new_id(REQUEST_PREFIX));

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Structured error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    /// Short summary of the failure class
    pub error: String,
    /// Stable kind label (e.g. "InvalidSelection")
    pub kind: String,
    /// Human-readable detail
    pub message: String,
    /// Request id the failure belongs to
    pub request_id: String,
}

/// Pipeline error bound to the request it occurred in.
#[derive(Debug)]
pub struct ApiError {
    error: ScriptoriumError,
    request_id: String,
}

impl ApiError {
    /// Bind `error` to `request_id`.
    pub fn new(error: impl Into<ScriptoriumError>, request_id: &str) -> Self {
        Self {
            error: error.into(),
            request_id: request_id.to_string(),
        }
    }

    fn rejected(rejection: JsonRejection, request_id: &str) -> Self {
        Self::new(
            PipelineError::invalid_request(rejection.body_text()),
            request_id,
        )
    }
}

/// HTTP status and summary for an envelope kind.
pub fn status_for(kind: &str) -> (StatusCode, &'static str) {
    match kind {
        "InvalidRequest" => (StatusCode::BAD_REQUEST, "Invalid request"),
        "NotFound" => (StatusCode::NOT_FOUND, "Not found"),
        "InvalidSelection" => (StatusCode::CONFLICT, "Invalid selection"),
        "GenerationTimeout" => (StatusCode::GATEWAY_TIMEOUT, "Generation timed out"),
        "BackendFailure" => (StatusCode::BAD_GATEWAY, "Generation backend failed"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.error.kind_label();
        let (status, summary) = status_for(kind);
        if status.is_server_error() {
            tracing::error!(
                request_id = %self.request_id,
                kind,
                error = %self.error,
                "Request failed"
            );
        } else {
            tracing::debug!(
                request_id = %self.request_id,
                kind,
                error = %self.error,
                "Request rejected"
            );
        }

        let body = ErrorEnvelope {
            error: summary.to_string(),
            kind: kind.to_string(),
            message: self.error.message(),
            request_id: self.request_id,
        };
        (status, Json(body)).into_response()
    }
}

/// `POST /generate` body.
///
/// Unlike [`GenerationRequest`], every field is optional here so that a missing
/// `projectId` is reported as a validation failure and a missing `variantCount`
/// picks up the configured default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    /// External project reference
    #[serde(default)]
    pub project_id: Option<String>,
    /// Number of variants to produce
    #[serde(default)]
    pub variant_count: Option<u32>,
    /// Attributes used to fill content templates
    #[serde(default)]
    pub product_metadata: ProductMetadata,
    /// Phrasing options
    #[serde(default)]
    pub style: StyleOptions,
}

impl GenerateBody {
    /// Convert to a request, applying `default_variant_count` when absent.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when `projectId` is missing.
    pub fn into_request(
        self,
        default_variant_count: u32,
    ) -> Result<GenerationRequest, PipelineError> {
        let project_id = self
            .project_id
            .ok_or_else(|| PipelineError::invalid_request("projectId is required"))?;
        GenerationRequest::builder()
            .project_id(project_id)
            .variant_count(self.variant_count.unwrap_or(default_variant_count))
            .product_metadata(self.product_metadata)
            .style(self.style)
            .build()
            .map_err(|e| PipelineError::invalid_request(e.to_string()))
    }
}

/// `POST /select` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectBody {
    /// Run to update
    pub run_id: String,
    /// Variant to select
    pub variant_id: String,
}

/// `POST /evaluate` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateBody {
    /// Run to evaluate
    pub run_id: String,
    /// Evaluation input; every field optional
    #[serde(default)]
    pub criteria: EvaluationCriteria,
}

/// `GET /projects/{project_id}/runs` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRuns {
    /// Project listed
    pub project_id: String,
    /// Runs, oldest first
    pub runs: Vec<GenerationRun>,
}

/// Health check endpoint.
async fn health_check(State(state): State<ApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "generator": state.pipeline.generator()})),
    )
}

async fn generate(
    State(state): State<ApiState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerationRun>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::rejected(e, &request_id))?;
    let default_count = *state.pipeline.config().default_variant_count();
    let request = body
        .into_request(default_count)
        .map_err(|e| ApiError::new(e, &request_id))?;

    let run = state
        .pipeline
        .generate(&request_id, request)
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;
    Ok(Json(run))
}

async fn select(
    State(state): State<ApiState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    body: Result<Json<SelectBody>, JsonRejection>,
) -> Result<Json<GenerationRun>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::rejected(e, &request_id))?;
    let run = state
        .pipeline
        .select(&request_id, &body.run_id, &body.variant_id)
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;
    Ok(Json(run))
}

async fn evaluate(
    State(state): State<ApiState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    body: Result<Json<EvaluateBody>, JsonRejection>,
) -> Result<Json<GenerationRun>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::rejected(e, &request_id))?;
    let run = state
        .pipeline
        .evaluate(&request_id, &body.run_id, body.criteria)
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;
    Ok(Json(run))
}

async fn get_run(
    State(state): State<ApiState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path(run_id): Path<String>,
) -> Result<Json<GenerationRun>, ApiError> {
    let run = state
        .pipeline
        .get(&request_id, &run_id)
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;
    Ok(Json(run))
}

async fn list_runs(
    State(state): State<ApiState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectRuns>, ApiError> {
    let runs = state
        .pipeline
        .list_runs(&request_id, &project_id)
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;
    Ok(Json(ProjectRuns { project_id, runs }))
}
