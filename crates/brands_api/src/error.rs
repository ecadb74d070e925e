//! HTTP error envelope for the brands API.
//!
//! Every failure leaves the service as `{"error_code", "message"}` with a
//! status code derived from the gateway outcome. Validation failures add a
//! `fields` list. Store internals are logged, never returned.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use brands_core::{BrandServiceError, BrandValidationError, FieldViolation};
use log::error;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Seconds a client should wait before retrying after a 503.
const RETRY_AFTER_SECS: &str = "1";

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    /// Request could not be decoded (bad JSON, bad query string).
    BadRequest { status: StatusCode, message: String },
    Validation(Vec<FieldViolation>),
    NotFound,
    Conflict,
    StoreUnavailable(String),
    Internal(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest { message, .. } => write!(f, "bad request: {message}"),
            Self::Validation(fields) => write!(f, "validation failed on {} field(s)", fields.len()),
            Self::NotFound => write!(f, "brand not found"),
            Self::Conflict => write!(f, "brand name already exists"),
            Self::StoreUnavailable(details) => write!(f, "store unavailable: {details}"),
            Self::Internal(details) => write!(f, "internal error: {details}"),
        }
    }
}

impl Error for ApiError {}

impl From<BrandServiceError> for ApiError {
    fn from(value: BrandServiceError) -> Self {
        match value {
            BrandServiceError::Validation(err) => err.into(),
            BrandServiceError::NotFound(_) => Self::NotFound,
            BrandServiceError::Conflict => Self::Conflict,
            BrandServiceError::StoreUnavailable(err) => Self::StoreUnavailable(err.to_string()),
            BrandServiceError::Internal(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<BrandValidationError> for ApiError {
    fn from(value: BrandValidationError) -> Self {
        Self::Validation(value.violations().to_vec())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        let message = match &value {
            JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON",
            JsonRejection::JsonDataError(_) => "request body must be a JSON object",
            JsonRejection::MissingJsonContentType(_) => {
                "expected request with `Content-Type: application/json`"
            }
            _ => "request body could not be read",
        };
        Self::BadRequest {
            status: value.status(),
            message: message.to_string(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(_: QueryRejection) -> Self {
        Self::BadRequest {
            status: StatusCode::BAD_REQUEST,
            message: "`limit` and `offset` must be integers".to_string(),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { status, .. } => *status,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest { status, .. } => match *status {
                StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
                StatusCode::UNPROCESSABLE_ENTITY => "INVALID_BODY",
                _ => "BAD_REQUEST",
            },
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.error_code();

        let body = match &self {
            Self::BadRequest { message, .. } => json!({
                "error_code": error_code,
                "message": message,
            }),
            Self::Validation(fields) => json!({
                "error_code": error_code,
                "message": "request payload failed validation",
                "fields": fields,
            }),
            Self::NotFound | Self::Conflict => json!({
                "error_code": error_code,
                "message": self.to_string(),
            }),
            Self::StoreUnavailable(details) | Self::Internal(details) => {
                error!(
                    "event=http_error module=api status={} error_code={} error={}",
                    status.as_u16(),
                    error_code,
                    details
                );
                let message = if matches!(self, Self::StoreUnavailable(_)) {
                    "brand store is temporarily unavailable"
                } else {
                    "internal server error"
                };
                json!({
                    "error_code": error_code,
                    "message": message,
                })
            }
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::StoreUnavailable(_)) {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from_static(RETRY_AFTER_SECS),
            );
        }
        response
    }
}
