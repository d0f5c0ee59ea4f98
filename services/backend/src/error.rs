use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use cf_collections::{StoreError, ValidationErrors};

/// Backend HTTP error variants.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("collection not found")]
    CollectionNotFound,
    #[error("record not found")]
    RecordNotFound,
    #[error("invalid sort")]
    InvalidSort,
    #[error("invalid query")]
    InvalidQuery,
    #[error("forbidden")]
    Forbidden,
    #[error("failed to validate record data")]
    Validation(ValidationErrors),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl BackendError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CollectionNotFound => "COLLECTION_NOT_FOUND",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::InvalidSort => "INVALID_SORT",
            Self::InvalidQuery => "INVALID_QUERY",
            Self::Forbidden => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl From<StoreError> for BackendError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::CollectionNotFound(_) => Self::CollectionNotFound,
            StoreError::RecordNotFound(_) => Self::RecordNotFound,
            StoreError::InvalidSort(_) => Self::InvalidSort,
            StoreError::Validation(errors) => Self::Validation(errors),
            other => Self::Internal(other.into()),
        }
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::CollectionNotFound | Self::RecordNotFound => StatusCode::NOT_FOUND,
            Self::InvalidSort | Self::InvalidQuery | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Self::Validation(ref errors) = self {
            body["data"] = errors.to_json();
        }
        (status, axum::Json(body)).into_response()
    }
}
