use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenError};
use crate::error::AppError;

/// Identity of the caller, taken from a verified token. Only `require_auth`
/// puts it in the request; handlers read it back with this extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Why a request was turned away. All of them answer 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    MissingHeader,
    MalformedHeader,
    InvalidToken,
    ExpiredToken,
}

impl AuthFailure {
    pub fn detail(self) -> &'static str {
        match self {
            AuthFailure::MissingHeader => "Missing Authorization header",
            AuthFailure::MalformedHeader => "Malformed Authorization header",
            AuthFailure::InvalidToken => "Invalid token",
            AuthFailure::ExpiredToken => "Token expired",
        }
    }
}

impl From<TokenError> for AuthFailure {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid => AuthFailure::InvalidToken,
            TokenError::Expired => AuthFailure::ExpiredToken,
        }
    }
}

impl From<AuthFailure> for AppError {
    fn from(f: AuthFailure) -> Self {
        AppError::Unauthenticated(f.detail().to_string())
    }
}

/// Reads `Authorization: Bearer <token>` and verifies the token locally.
/// No store access happens here.
pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<AuthUser, AuthFailure> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or(AuthFailure::MissingHeader)?
        .to_str()
        .map_err(|_| AuthFailure::MalformedHeader)?;

    let token = raw
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.contains(char::is_whitespace))
        .ok_or(AuthFailure::MalformedHeader)?;

    let claims = keys.verify(token)?;
    Ok(AuthUser {
        id: claims.sub,
        email: claims.email,
    })
}

/// Gate for protected routes. Rejected requests never reach a handler.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match authenticate(req.headers(), &keys) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(failure) => {
            warn!(reason = failure.detail(), path = %req.uri().path(), "request rejected");
            Err(failure.into())
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::from(AuthFailure::MissingHeader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::http::HeaderValue;

    fn keys(secret: &str) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 10,
        })
    }

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn missing_header() {
        let err = authenticate(&HeaderMap::new(), &keys("k")).unwrap_err();
        assert_eq!(err, AuthFailure::MissingHeader);
    }

    #[test]
    fn malformed_headers() {
        let k = keys("k");
        for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer ", "bearer abc", "Bearer a b", "token"] {
            assert_eq!(
                authenticate(&headers(value), &k).unwrap_err(),
                AuthFailure::MalformedHeader,
                "header {value:?}"
            );
        }
    }

    #[test]
    fn invalid_token() {
        let err = authenticate(&headers("Bearer abc.def.ghi"), &keys("k")).unwrap_err();
        assert_eq!(err, AuthFailure::InvalidToken);
    }

    #[test]
    fn foreign_token_rejected_the_same_way_twice() {
        let token = keys("other").issue(Uuid::new_v4(), None).unwrap();
        let h = headers(&format!("Bearer {token}"));
        let first = authenticate(&h, &keys("k")).unwrap_err();
        let second = authenticate(&h, &keys("k")).unwrap_err();
        assert_eq!(first, AuthFailure::InvalidToken);
        assert_eq!(first, second);
    }

    #[test]
    fn expired_token() {
        let k = JwtKeys::from_config(&JwtConfig {
            secret: "k".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 0,
        });
        // a zero TTL token expires the instant it is issued
        let token = k.issue(Uuid::new_v4(), None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let err = authenticate(&headers(&format!("Bearer {token}")), &k).unwrap_err();
        assert_eq!(err, AuthFailure::ExpiredToken);
    }

    #[test]
    fn valid_token_yields_identity() {
        let k = keys("k");
        let id = Uuid::new_v4();
        let token = k.issue(id, Some("a@x.com")).unwrap();
        let user = authenticate(&headers(&format!("Bearer {token}")), &k).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn failures_map_to_unauthenticated() {
        for f in [
            AuthFailure::MissingHeader,
            AuthFailure::MalformedHeader,
            AuthFailure::InvalidToken,
            AuthFailure::ExpiredToken,
        ] {
            let err = AppError::from(f);
            assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
            assert_eq!(err.to_string(), f.detail());
        }
    }
}
