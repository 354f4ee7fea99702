//! API response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{error::CompanionError, state::Advisory};

/// Envelope for every successful JSON response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Create a new API response
    pub fn new(status: &str, message: impl Into<String>, data: T) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            data,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new("ok", message, data)
    }
}

/// Shorthand for handler return types
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub fn ok<T>(message: impl Into<String>, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(message, data)))
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Maps engine errors onto HTTP status codes
#[derive(Debug)]
pub struct ApiError(pub CompanionError);

impl From<CompanionError> for ApiError {
    fn from(e: CompanionError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            CompanionError::NotFound { .. } => StatusCode::NOT_FOUND,
            CompanionError::InvalidAlarm(_) | CompanionError::InvalidQuantity(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        let body = ErrorBody {
            status: "error".to_string(),
            message: self.0.to_string(),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

/// Counts per engine, reported by `/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSummary {
    pub timers: usize,
    pub running_timers: usize,
    pub stopwatch: String,
    pub alarms: usize,
    pub enabled_alarms: usize,
    pub pending_alarms: usize,
    pub recipes: usize,
}

/// Status response with engine and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub engines: EngineSummary,
    pub advisories: Vec<Advisory>,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_status_codes() {
        let code = |e| ApiError(e).status_code();
        assert_eq!(code(CompanionError::not_found("timer", "x")), StatusCode::NOT_FOUND);
        assert_eq!(code(CompanionError::unsupported("g", "ml")), StatusCode::BAD_REQUEST);
        assert_eq!(
            code(CompanionError::InvalidAlarm("25:00".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            code(CompanionError::StatePoisoned("timers")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
