use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Every failure a request can end in. Handlers and services return this;
/// `into_response` is the only place it becomes HTTP.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Timeout(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Stable error body: `{ success: false, message, code, details? }`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, details: Value) -> Self {
        AppError::Validation {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, details) = match self {
            AppError::Validation { message, details } => (message, details),
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                ("Internal server error".to_string(), None)
            }
            AppError::Unauthenticated(m)
            | AppError::Forbidden(m)
            | AppError::NotFound(m)
            | AppError::Conflict(m)
            | AppError::Timeout(m) => (m, None),
        };
        let body = ErrorBody {
            success: false,
            message,
            code: status.as_u16(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(constraint) => {
                AppError::Conflict(format!("Resource already exists ({constraint})"))
            }
            StoreError::Timeout => AppError::Timeout(
                "Storage did not respond in time; re-query to learn the current state".into(),
            ),
            StoreError::Backend(e) => AppError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn each_variant_maps_to_its_status() {
        let cases = [
            (AppError::validation("bad"), 400),
            (AppError::Unauthenticated("no".into()), 401),
            (AppError::Forbidden("no".into()), 403),
            (AppError::NotFound("gone".into()), 404),
            (AppError::Conflict("dup".into()), 409),
            (AppError::Timeout("slow".into()), 504),
            (AppError::Internal(anyhow::anyhow!("boom")), 500),
        ];
        for (err, code) in cases {
            let (status, body) = body_json(err).await;
            assert_eq!(status.as_u16(), code);
            assert_eq!(body["code"], code);
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let (_, body) = body_json(AppError::Internal(anyhow::anyhow!("db password is hunter2"))).await;
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn validation_details_are_included() {
        let err = AppError::validation_with("Bad request", json!({ "field": "name" }));
        let (_, body) = body_json(err).await;
        assert_eq!(body["message"], "Bad request");
        assert_eq!(body["details"]["field"], "name");
    }

    #[test]
    fn store_errors_translate() {
        assert!(matches!(
            AppError::from(StoreError::Duplicate("users_email_key".into())),
            AppError::Conflict(_)
        ));
        assert!(matches!(AppError::from(StoreError::Timeout), AppError::Timeout(_)));
        assert!(matches!(
            AppError::from(StoreError::Backend(anyhow::anyhow!("x"))),
            AppError::Internal(_)
        ));
    }
}
