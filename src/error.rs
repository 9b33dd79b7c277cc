use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::envelope::SealError;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error("missing form field '{0}'")]
    MissingField(&'static str),
    #[error("invalid form field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("paste id already taken")]
    DuplicateId,
    #[error("database error")]
    Database { source: sqlx::Error },
    #[error("encryption error")]
    Seal {
        #[from]
        source: SealError,
    },
    #[error("key derivation pool closed")]
    KdfClosed {
        #[from]
        source: tokio::sync::AcquireError,
    },
    #[error("background task failed")]
    Task {
        #[from]
        source: tokio::task::JoinError,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MissingField(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidField { .. } => StatusCode::BAD_REQUEST,
            AppError::DuplicateId => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Seal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::KdfClosed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Task { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            match std::error::Error::source(&self) {
                Some(source) => error!("{self}: {source}"),
                None => error!("{self}"),
            }
        }

        (status_code, format!("{self}")).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(source: sqlx::Error) -> Self {
        match source {
            sqlx::Error::RowNotFound => AppError::NotFound,
            _ => AppError::Database { source },
        }
    }
}
