//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use soundboard_domain::error::SoundboardError;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`SoundboardError`] to an HTTP response with an appropriate status code.
#[derive(Debug)]
pub struct ApiError(SoundboardError);

impl<E: Into<SoundboardError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            SoundboardError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            SoundboardError::Parse(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            SoundboardError::Command(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            SoundboardError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            other => {
                tracing::error!(error = %other, source = ?std::error::Error::source(other), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundboard_domain::error::{NotFoundError, ValidationError};

    #[test]
    fn should_map_validation_to_bad_request() {
        let response = ApiError::from(ValidationError::EmptyName).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn should_map_missing_routine_to_not_found() {
        let response = ApiError::from(NotFoundError {
            entity: "routine",
            id: "x".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn should_hide_storage_details_behind_internal_error() {
        let err = SoundboardError::Storage(Box::new(std::io::Error::other("disk on fire")));
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
