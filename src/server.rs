//! HTTP route layer. Thin over the rate provider: validates query
//! parameters, formats responses, maps failures to status codes.

use crate::core::rates::{CurrencyRecord, RateProvider};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    provider: Arc<dyn RateProvider>,
}

#[derive(Debug, Deserialize)]
struct ConvertQuery {
    amount: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Serialize)]
struct ConvertResponse {
    result: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// User-caused failures carry their message to the client; internal ones are
/// logged in full and surfaced as a generic response, so no upstream error
/// text or filesystem path leaks out.
enum ApiError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message })).into_response()
            }
            ApiError::Internal(err) => {
                error!(error = ?err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "internal server error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

pub fn router(provider: Arc<dyn RateProvider>) -> Router {
    Router::new()
        .route("/api/convert", get(convert))
        .route("/api/currencies", get(currencies))
        .layer(CorsLayer::permissive())
        .with_state(AppState { provider })
}

pub async fn serve(provider: Arc<dyn RateProvider>, port: u16) -> anyhow::Result<()> {
    let app = router(provider);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn convert(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let amount = query
        .amount
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("missing query parameter: amount".to_string()))?
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| {
            ApiError::BadRequest("query parameter 'amount' must be a number".to_string())
        })?;
    let code = query
        .code
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("missing query parameter: code".to_string()))?;

    let table = state.provider.current_rates().await?;
    let result = table
        .convert(amount, code)
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;
    Ok(Json(ConvertResponse { result }))
}

async fn currencies(
    State(state): State<AppState>,
) -> Result<Json<Vec<CurrencyRecord>>, ApiError> {
    let table = state.provider.current_rates().await?;
    Ok(Json(table.into_records()))
}
