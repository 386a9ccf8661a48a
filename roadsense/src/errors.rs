use crate::db::errors::DbError;
use crate::types::RecordId;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Input payload violates a field constraint
    #[error("Invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    /// Requested record not found
    #[error("{resource} with id {id} not found")]
    NotFound { resource: &'static str, id: RecordId },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { field, message } => {
                format!("Invalid value for {field}: {message}")
            }
            Error::NotFound { resource, id } => {
                format!("{resource} with id {id} not found")
            }
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Record not found".to_string(),
                DbError::UniqueViolation { .. } => "Record already exists".to_string(),
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related record".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }

    /// Prefix the field path of a validation error with its position in a
    /// batch payload, e.g. `road_state` -> `[2].road_state`.
    pub fn at_index(self, index: usize) -> Self {
        match self {
            Error::Validation { field, message } => Error::Validation {
                field: format!("[{index}].{field}"),
                message,
            },
            other => other,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Validation { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), self.user_message()).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
