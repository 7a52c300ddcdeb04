// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps [`HelpmateError`] onto HTTP responses.
//!
//! The body is always `{"error": {"kind", "code", "message"}}`. Storage and
//! internal failures are logged here and answered with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use helpmate_core::{ErrorKind, HelpmateError};

/// Error body for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

/// A [`HelpmateError`] on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub HelpmateError);

impl From<HelpmateError> for ApiError {
    fn from(err: HelpmateError) -> Self {
        Self(err)
    }
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::InvalidState | ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::DependencyFailure => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "request failed");
        } else {
            tracing::debug!(code = self.0.code(), error = %self.0, "request rejected");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                kind,
                code: self.0.code(),
                message: self.0.public_message(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpmate_core::SessionStatus;

    #[test]
    fn kinds_map_to_statuses() {
        let cases = [
            (HelpmateError::SessionNotFound("s".into()), StatusCode::NOT_FOUND),
            (HelpmateError::Unauthorized, StatusCode::UNAUTHORIZED),
            (HelpmateError::NotAParticipant, StatusCode::FORBIDDEN),
            (HelpmateError::NotSender, StatusCode::FORBIDDEN),
            (
                HelpmateError::SessionNotActive {
                    status: SessionStatus::Cancelled,
                },
                StatusCode::BAD_REQUEST,
            ),
            (HelpmateError::AlreadyRead, StatusCode::BAD_REQUEST),
            (HelpmateError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                HelpmateError::Dependency {
                    message: "revoke failed".into(),
                    source: None,
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                HelpmateError::Storage {
                    source: "disk".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn storage_detail_is_not_leaked() {
        let response = ApiError(HelpmateError::Storage {
            source: "no such table: chat_messages".into(),
        })
        .into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["kind"], "internal");
        assert_eq!(body["error"]["code"], "storage");
        assert_eq!(body["error"]["message"], "internal server error");
    }
}
