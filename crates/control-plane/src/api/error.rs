// Domain error to HTTP response mapping
//
// Every handler returns `ApiError` on failure. The status code comes from an
// exhaustive match on `ErrorKind`, so a new kind cannot go unmapped.

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crowdpulse_core::{DomainError, ErrorKind};

use super::common::ErrorResponse;
use super::validation::{ValidationError, VALIDATION_ERROR_MESSAGE};

/// Error returned by HTTP handlers
#[derive(Debug)]
pub struct ApiError(pub DomainError);

pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP status for a domain error kind
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(_: ValidationError) -> Self {
        ApiError(DomainError::invalid(VALIDATION_ERROR_MESSAGE))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(DomainError::invalid(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if kind == ErrorKind::Internal {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = %status, "Request rejected");
        }
        let body = ErrorResponse::new(self.0.to_string(), kind.code());
        (status, Json(body)).into_response()
    }
}

/// JSON body extractor whose rejections use the API error shape (400)
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_each_kind_maps_to_status_and_code() {
        let cases = [
            (DomainError::not_found("Event"), 404, "NOT_FOUND"),
            (DomainError::forbidden("no"), 403, "FORBIDDEN"),
            (DomainError::unauthorized("no"), 401, "UNAUTHORIZED"),
            (DomainError::invalid("bad"), 400, "BAD_REQUEST"),
            (DomainError::internal("boom"), 500, "INTERNAL_SERVER_ERROR"),
        ];
        for (err, status, code) in cases {
            let (actual, body) = body_json(ApiError(err)).await;
            assert_eq!(actual.as_u16(), status);
            assert_eq!(body["code"], code);
        }
    }

    #[tokio::test]
    async fn test_internal_error_keeps_message() {
        let (_, body) = body_json(ApiError(DomainError::internal("pool timed out"))).await;
        assert!(body["error"].as_str().unwrap().contains("pool timed out"));
    }

    #[tokio::test]
    async fn test_validation_error_is_bad_request() {
        let (status, body) = body_json(ValidationError.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], format!("Invalid input: {}", VALIDATION_ERROR_MESSAGE));
    }
}
