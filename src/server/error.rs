use crate::models::ApiErrorBody;
use crate::Error;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

/// Failure returned by a route, rendered as `{message: "Error", error}`.
#[derive(Debug)]
pub enum ApiError {
    Domain(Error),
    BadRequest(String),
    MethodNotAllowed {
        method: Method,
        allow: &'static str,
    },
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Domain(err) => {
                warn!("Request failed: {}", err);
                (StatusCode::BAD_REQUEST, Json(ApiErrorBody::new(err.to_string()))).into_response()
            }
            ApiError::BadRequest(reason) => {
                warn!("Bad request: {}", reason);
                (StatusCode::BAD_REQUEST, Json(ApiErrorBody::new(reason))).into_response()
            }
            ApiError::MethodNotAllowed { method, allow } => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, allow)],
                Json(ApiErrorBody::new(format!("Method {} not allowed", method))),
            )
                .into_response(),
        }
    }
}
