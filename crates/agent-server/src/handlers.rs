//! HTTP Handlers

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;

use agent_core::{CancellationToken, ProviderError, RewriteError, RewriteRequest};
use market_analyst::{AnalystError, EthAnalysis};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_reachable: bool,
}

#[derive(Debug, Serialize)]
pub struct RewriteResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct StyleSummary {
    pub name: &'static str,
    pub instruction: String,
    pub tone_constraints: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StylesResponse {
    pub styles: Vec<StyleSummary>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// HTTP status for each pipeline failure kind
pub const fn status_for(err: &RewriteError) -> StatusCode {
    match err {
        RewriteError::Validation(_) | RewriteError::UnknownStyle(_) => StatusCode::BAD_REQUEST,
        RewriteError::SafetyRejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RewriteError::Provider(ProviderError::RateLimit(_)) => StatusCode::TOO_MANY_REQUESTS,
        RewriteError::Provider(ProviderError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        RewriteError::Provider(_) => StatusCode::BAD_GATEWAY,
        RewriteError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn rewrite_error(err: &RewriteError) -> ApiError {
    error_response(status_for(err), err.user_message())
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_reachable = state.runtime.provider().health_check().await;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.runtime.settings.kind().to_string(),
        provider_reachable,
    })
}

/// Available rewrite styles
pub async fn list_styles(State(state): State<AppState>) -> Json<StylesResponse> {
    let styles = state
        .runtime
        .catalog
        .profiles()
        .map(|p| StyleSummary {
            name: p.style.as_str(),
            instruction: p.instruction.clone(),
            tone_constraints: p.tone_constraints.clone(),
        })
        .collect();

    Json(StylesResponse { styles })
}

/// Rewrite text into the requested style
///
/// The pipeline's cancellation token fires if this future is dropped, so a
/// client disconnect stops retries and in-flight provider calls.
pub async fn rewrite_handler(
    State(state): State<AppState>,
    payload: Result<Json<RewriteRequest>, JsonRejection>,
) -> Result<Json<RewriteResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Malformed rewrite request");
        error_response(StatusCode::BAD_REQUEST, format!("Invalid request: {}", rejection.body_text()))
    })?;

    let request_id = uuid::Uuid::new_v4();
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    tracing::debug!(%request_id, style = %request.style, "Rewrite request");

    match state.runtime.pipeline.rewrite_with_cancel(&request, &cancel).await {
        Ok(outcome) => Ok(Json(RewriteResponse { text: outcome.text })),
        Err(e) => {
            tracing::warn!(%request_id, kind = e.kind(), "Rewrite failed: {}", e);
            Err(rewrite_error(&e))
        }
    }
}

/// ETH metrics plus LLM commentary
pub async fn eth_analysis(
    State(state): State<AppState>,
) -> Result<Json<EthAnalysis>, ApiError> {
    state.analyzer.analyze().await.map(Json).map_err(|e| {
        tracing::warn!(kind = e.kind(), "ETH analysis failed: {}", e);
        match &e {
            AnalystError::Generation(inner) => rewrite_error(inner),
            AnalystError::DataSource(_) => error_response(StatusCode::BAD_GATEWAY, e.to_string()),
            AnalystError::InsufficientData { .. } => {
                error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
        }
    })
}
