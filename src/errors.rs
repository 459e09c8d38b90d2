use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::ml::{ForecastError, SeriesPoint};

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Product not found",
    "message": "No product found with ID 42",
    "details": null,
    "request_id": "3f1c8e9a-4a7b-4b8e-9a51-6c0f0b7c9d11",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// Short error category
    #[schema(example = "Product not found")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "No product found with ID 42")]
    pub message: String,
    /// Structured diagnostics, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// RFC 3339 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("{message}")]
    NotFound {
        error: &'static str,
        message: String,
    },

    #[error("{message}")]
    InvalidParameter {
        error: &'static str,
        message: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No inventory movements found for the specified criteria")]
    NoData { details: Option<Value> },

    #[error("Found only {} data point(s). Minimum 2 required for trend analysis.", points.len())]
    InsufficientData { points: Vec<SeriesPoint> },

    #[error("{0}")]
    ModelFit(String),
}

impl crate::tracing::OperationFailure for ServiceError {
    fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<ForecastError> for ServiceError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::EmptySeries => ServiceError::NoData { details: None },
            ForecastError::InsufficientData { points } => {
                ServiceError::InsufficientData { points }
            }
            ForecastError::ModelFit(cause) => ServiceError::ModelFit(cause),
        }
    }
}

impl ServiceError {
    pub fn product_not_found(id: i32) -> Self {
        ServiceError::NotFound {
            error: "Product not found",
            message: format!("No product found with ID {}", id),
        }
    }

    pub fn shop_not_found(id: i32) -> Self {
        ServiceError::NotFound {
            error: "Shop not found",
            message: format!("No shop found with ID {}", id),
        }
    }

    pub fn invalid_parameter(error: &'static str, message: impl Into<String>) -> Self {
        ServiceError::InvalidParameter {
            error,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidParameter { .. }
            | Self::ValidationError(_)
            | Self::NoData { .. }
            | Self::InsufficientData { .. } => StatusCode::BAD_REQUEST,
            Self::DatabaseError(_) | Self::ModelFit(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short category placed in the `error` field of the response body.
    pub fn error_label(&self) -> &'static str {
        match self {
            Self::NotFound { error, .. } | Self::InvalidParameter { error, .. } => *error,
            Self::ValidationError(_) => "Validation error",
            Self::NoData { .. } => "No data available for forecasting",
            Self::InsufficientData { .. } => "Insufficient data for forecasting",
            Self::ModelFit(_) => "Failed to generate forecast model",
            Self::DatabaseError(_) => "Internal server error",
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Structured diagnostics for the response body.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::NoData { details } => details.clone(),
            Self::InsufficientData { points } => Some(json!({
                "points": points.len(),
                "dates": points.iter().map(|p| p.date.format("%Y-%m-%d").to_string()).collect::<Vec<_>>(),
                "values": points.iter().map(|p| p.value).collect::<Vec<_>>(),
            })),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let err = ErrorResponse {
            error: self.error_label().to_string(),
            message: self.response_message(),
            details: self.details(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

pub type AppError = ServiceError;
