use axum::{
    Json,
    body::Body,
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Result alias for the proxy handlers.
pub(crate) type ProxyResult<T> = std::result::Result<T, ProxyError>;

/// Proxy errors with their HTTP status mapping.
///
/// Individual malformed elements inside a translation are skipped rather
/// than reported; these variants cover the exchange-level failures only.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The client body was not valid JSON or not structurally a Messages
    /// request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Neither `X-Api-Key` nor a bearer `Authorization` header was sent.
    #[error("API key required")]
    MissingApiKey,

    /// The upstream could not be reached.
    #[error("Connection error: {0}")]
    UpstreamConnection(String),

    /// Request or response marshalling failed inside the proxy.
    #[error("Internal server error: {0}")]
    Internal(String),

    /// The upstream answered with a non-2xx status; relayed body-intact.
    #[error("upstream returned status {status}")]
    UpstreamStatus {
        /// Upstream HTTP status, forwarded unchanged.
        status: StatusCode,
        /// Upstream `Content-Type`, forwarded when present.
        content_type: Option<HeaderValue>,
        /// Upstream body, forwarded unchanged.
        body: axum::body::Bytes,
    },
}

impl ProxyError {
    /// The HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingApiKey => StatusCode::UNAUTHORIZED,
            Self::UpstreamConnection(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamStatus { status, .. } => *status,
        }
    }

    /// The dialect error type string for the response body.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request_error",
            Self::MissingApiKey => "authentication_error",
            Self::UpstreamConnection(_) => "api_error",
            Self::Internal(_) => "internal_error",
            Self::UpstreamStatus { .. } => "api_error",
        }
    }
}

/// Error body in the client dialect's shape.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    r#type: &'static str,
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    r#type: &'static str,
    message: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        if let Self::UpstreamStatus {
            status,
            content_type,
            body,
        } = self
        {
            let mut response = Response::new(Body::from(body));
            *response.status_mut() = status;
            if let Some(content_type) = content_type {
                response.headers_mut().insert(CONTENT_TYPE, content_type);
            }
            return response;
        }

        let status = self.status_code();
        let body = ErrorResponse {
            r#type: "error",
            error: ErrorDetails {
                r#type: self.error_type(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::ProxyError;

    #[test]
    fn status_codes() {
        assert_eq!(
            ProxyError::InvalidRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ProxyError::MissingApiKey.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ProxyError::Internal("oops".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::UpstreamConnection("refused".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn upstream_status_is_relayed_intact() {
        let error = ProxyError::UpstreamStatus {
            status: StatusCode::TOO_MANY_REQUESTS,
            content_type: Some("application/json".parse().unwrap()),
            body: axum::body::Bytes::from_static(b"{\"error\":\"slow down\"}"),
        };

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn error_types() {
        assert_eq!(ProxyError::MissingApiKey.error_type(), "authentication_error");
        assert_eq!(ProxyError::InvalidRequest("x".into()).error_type(), "invalid_request_error");
    }
}
