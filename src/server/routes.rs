//! Request handlers and the API error type.

use super::AppState;
use crate::error::AnalysisError;
use crate::models::{AnalysisResponse, ErrorResponse, RunId};
use crate::orchestrator::{AnalysisRequest, Document, RunFailure};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::error;

/// Error returned by a handler, rendered as `{error, runId}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    run_id: Option<RunId>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            run_id: None,
        }
    }

    fn with_run(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }
}

impl From<RunFailure> for ApiError {
    fn from(failure: RunFailure) -> Self {
        let status = if failure.error.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        ApiError::new(status, failure.error.to_string()).with_run(failure.run_id)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
            run_id: self.run_id,
        });

        (self.status, body).into_response()
    }
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// `POST /api/analyze`
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let run_id = RunId::generate();

    let request = match read_analysis_form(multipart).await {
        Ok(request) => request,
        Err(error) => {
            state
                .analyzer
                .logger()
                .append_line(&run_id, &format!("Invalid request: {}", error))
                .await;
            return Err(RunFailure { run_id, error }.into());
        }
    };

    let analyzer = state.analyzer.clone();
    let task_run_id = run_id.clone();
    let outcome = tokio::spawn(async move { analyzer.analyze(task_run_id, request).await }).await;

    match outcome {
        Ok(Ok(run)) => Ok(Json(run.response)),
        Ok(Err(failure)) => Err(failure.into()),
        Err(join_error) => {
            // the run task panicked; its own failure line was never written
            error!("Run {} aborted: {}", run_id, join_error);
            state
                .analyzer
                .logger()
                .append_line(&run_id, &format!("Analysis failed with error: {}", join_error))
                .await;
            Err(RunFailure {
                run_id,
                error: AnalysisError::Internal("Internal server error".to_string()),
            }
            .into())
        }
    }
}

/// Collect the `ticker` field and every `files` part.
async fn read_analysis_form(mut multipart: Multipart) -> Result<AnalysisRequest, AnalysisError> {
    let mut request = AnalysisRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalysisError::BadRequest(format!("Failed to parse multipart data: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "ticker" => {
                request.ticker = field.text().await.map_err(|e| {
                    AnalysisError::BadRequest(format!("Failed to read ticker: {}", e))
                })?;
            }
            "files" => {
                let name = field.file_name().unwrap_or("upload.pdf").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AnalysisError::BadRequest(format!("Failed to read file {}: {}", name, e))
                })?;
                request.documents.push(Document {
                    name,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(request)
}

/// `GET /api/runs/:run_id/log`
pub async fn run_log(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let run_id = RunId::parse(&raw_id)
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Invalid run id"))?;

    match state.analyzer.logger().read_log(&run_id).await {
        Ok(Some(content)) => Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            content,
        )
            .into_response()),
        Ok(None) => Err(ApiError::new(StatusCode::NOT_FOUND, "Run log not found").with_run(run_id)),
        Err(e) => {
            error!("Failed to read log for {}: {}", run_id, e);
            Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read run log")
                .with_run(run_id))
        }
    }
}
