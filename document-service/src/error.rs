use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use document_storage::{DocumentError, ErrorKind};
use shared::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Document(e) => match e.kind {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                // The store rejected our credentials, not the caller's
                ErrorKind::Unauthorized => StatusCode::BAD_GATEWAY,
                ErrorKind::Transport => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
