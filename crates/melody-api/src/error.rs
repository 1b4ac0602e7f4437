use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use melody_db::DbError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("not found")]
    NotFound,
    #[error("username already exists")]
    Conflict,
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Database(DbError),
    #[error("internal server error")]
    Internal,
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Conflict => Self::Conflict,
            other => Self::Database(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Multipart(e) => e.status(),
            Self::Database(_) | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing text. Statement errors stay in the server log.
    fn public_message(&self) -> String {
        match self {
            Self::Database(DbError::Unavailable(_)) => "database unavailable".into(),
            Self::Database(_) => "database error".into(),
            Self::Multipart(e) => e.body_text(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(ErrorBody { error: self.public_message() })).into_response()
    }
}

/// Shape for list endpoints: failures become a bare `[]` with the error status.
pub fn list_response<T: Serialize>(result: Result<Vec<T>, ApiError>) -> Response {
    match result {
        Ok(items) => Json(items).into_response(),
        Err(e) => {
            let status = e.status();
            error!("list query failed: {}", e);
            (status, Json(Vec::<T>::new())).into_response()
        }
    }
}
