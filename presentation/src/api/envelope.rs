//! Response envelope shared by every API endpoint
//!
//! Success: `{"success": true, "data": ...}`
//! Failure: `{"success": false, "error": {"code": ..., "message": ...}}`

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
pub const CONFLICT: &str = "CONFLICT";
pub const ACCESS_DENIED: &str = "ACCESS_DENIED";
pub const COLLAB_NOT_FOUND: &str = "COLLAB_NOT_FOUND";
pub const EXTENSION_NOT_FOUND: &str = "EXTENSION_NOT_FOUND";
pub const MISSING_EXTENSION_ID: &str = "MISSING_EXTENSION_ID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ApiEnvelope {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// What a controller hands back to the transport: status, optional
/// `Location`, and an optional envelope (absent for 204)
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Option<ApiEnvelope>,
}

impl ControllerResponse {
    /// Serialize `data` into a success envelope. A serialization failure
    /// becomes a 500.
    pub fn ok<T: Serialize>(status: StatusCode, data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                status,
                location: None,
                body: Some(ApiEnvelope::success(value)),
            },
            Err(e) => Self::error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR, e.to_string()),
        }
    }

    pub fn error(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            location: None,
            body: Some(ApiEnvelope::error(code, message)),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            location: None,
            body: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::error(StatusCode::BAD_REQUEST, VALIDATION_ERROR, message)
    }

    pub fn internal() -> Self {
        Self::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_ERROR,
            "An unexpected error occurred",
        )
    }

    pub fn error_code(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.error.as_ref())
            .map(|e| e.code.as_str())
    }

    pub fn data(&self) -> Option<&Value> {
        self.body.as_ref().and_then(|b| b.data.as_ref())
    }
}

impl IntoResponse for ControllerResponse {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        };
        if let Some(location) = self.location
            && let Ok(value) = HeaderValue::from_str(&location)
        {
            response.headers_mut().insert(header::LOCATION, value);
        }
        response
    }
}
