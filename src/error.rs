// src/error.rs
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

use crate::entry::EntryError;
use crate::store::StoreError;
use crate::validation::{Field, ValidationError};

#[derive(Debug)]
pub enum AppError {
    Store(StoreError),
    Unauthorized(String),
    ValidationError { message: String, field: Option<Field> },
    Internal(String),
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, field) = match self {
            AppError::Store(e @ StoreError::Unavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string(), None)
            }
            AppError::Store(e @ StoreError::Rejected(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None)
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::ValidationError { message, field } => (StatusCode::BAD_REQUEST, message, field),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
        };

        let body = match field {
            Some(field) => Json(json!({ "error": error_message, "field": field })),
            None => Json(json!({ "error": error_message })),
        };

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::MissingField(field) => Some(*field),
            _ => None,
        };
        AppError::ValidationError { message: err.to_string(), field }
    }
}

impl From<EntryError> for AppError {
    fn from(err: EntryError) -> Self {
        match err {
            EntryError::Invalid(e) => e.into(),
            EntryError::Store(e) => e.into(),
        }
    }
}
