use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;

pub const MIN_TEXT_LEN: usize = 2;
pub const MAX_TEXT_LEN: usize = 30;
pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref URL_RE: Regex = Regex::new(
        r"(?i)^https?://(www\.)?[\da-z.-]+\.[a-z.]{2,6}(:\d{1,5})?(/[\w.~%!$&'()*+,;=:@/?#-]*)?$"
    )
    .unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_url(url: &str) -> bool {
    URL_RE.is_match(url)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Length is counted in characters, not bytes.
pub fn check_text(field: &'static str, value: &str) -> Result<(), AppError> {
    let len = value.chars().count();
    if (MIN_TEXT_LEN..=MAX_TEXT_LEN).contains(&len) {
        Ok(())
    } else {
        Err(AppError::validation_with(
            format!("{field} must be between {MIN_TEXT_LEN} and {MAX_TEXT_LEN} characters"),
            json!({ "field": field, "length": len }),
        ))
    }
}

pub fn check_url(field: &'static str, value: &str) -> Result<(), AppError> {
    if is_valid_url(value) {
        Ok(())
    } else {
        Err(AppError::validation_with(
            format!("{field} must be a valid http(s) URL"),
            json!({ "field": field }),
        ))
    }
}

/// Parses a path id. Malformed ids are a client error, never a lookup miss.
pub fn parse_id(what: &'static str, raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| {
        AppError::validation_with(format!("Invalid {what} id"), json!({ "id": raw }))
    })
}

/// `Json` whose rejections come back in the standard error body.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => Err(AppError::validation_with(
                "Bad request",
                json!(rejection.body_text()),
            )),
        }
    }
}
