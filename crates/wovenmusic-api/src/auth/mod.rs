//! JWT bearer authentication.
//!
//! Tokens are accepted from the `Authorization: Bearer <token>` header or,
//! for media elements that cannot set headers (`<audio src=...>`), from a
//! `?token=` query parameter. Query-string tokens can leak through logs and
//! referrers, so they are only honored on streaming routes.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::HttpAppError;
use wovenmusic_core::AppError;

#[derive(Debug, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
}

#[derive(Clone)]
pub struct AuthConfig {
    decoding_key: DecodingKey,
}

impl AuthConfig {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| AppError::Unauthorized(format!("Invalid token: {}", err)))
    }
}

/// An authenticated caller. Extraction fails with 401 when no valid token
/// is presented.
pub struct AuthUser {
    pub user_id: Uuid,
    /// The raw token, kept so handlers can mint self-referencing URLs.
    pub token: String,
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn query_token(parts: &Parts) -> Option<String> {
    let query = parts.uri.query()?;
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("token=") {
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn extract_token(parts: &Parts) -> Option<String> {
    bearer_token(parts).or_else(|| query_token(parts))
}

impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or_else(|| {
            HttpAppError(AppError::Unauthorized("Missing bearer token".to_string()))
        })?;
        let auth = AuthConfig::from_ref(state);
        let claims = auth.decode_token(&token)?;
        Ok(AuthUser {
            user_id: claims.sub,
            token,
        })
    }
}

/// Optional authentication: absent token yields `None`, a present but
/// invalid token is still rejected with 401.
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    AuthConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(parts) else {
            return Ok(OptionalAuthUser(None));
        };
        let auth = AuthConfig::from_ref(state);
        let claims = auth.decode_token(&token)?;
        Ok(OptionalAuthUser(Some(AuthUser {
            user_id: claims.sub,
            token,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: Uuid,
        exp: usize,
    }

    fn make_token(secret: &str, user_id: Uuid, exp: usize) -> String {
        encode(
            &Header::default(),
            &TestClaims { sub: user_id, exp },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encode token")
    }

    fn far_future() -> usize {
        4_102_444_800 // 2100-01-01
    }

    #[test]
    fn test_decode_valid_token() {
        let auth = AuthConfig::new("test-secret");
        let user_id = Uuid::new_v4();
        let token = make_token("test-secret", user_id, far_future());
        let claims = auth.decode_token(&token).expect("valid token");
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn test_decode_wrong_secret() {
        let auth = AuthConfig::new("test-secret");
        let token = make_token("other-secret", Uuid::new_v4(), far_future());
        assert!(auth.decode_token(&token).is_err());
    }

    #[test]
    fn test_decode_expired_token() {
        let auth = AuthConfig::new("test-secret");
        let token = make_token("test-secret", Uuid::new_v4(), 1_000_000);
        assert!(auth.decode_token(&token).is_err());
    }

    #[test]
    fn test_query_token_extraction() {
        let request = axum::http::Request::builder()
            .uri("/track-stream?id=abc&token=xyz")
            .body(())
            .expect("request");
        let (parts, _) = request.into_parts();
        assert_eq!(query_token(&parts), Some("xyz".to_string()));
    }

    #[test]
    fn test_query_token_absent() {
        let request = axum::http::Request::builder()
            .uri("/track-stream?id=abc")
            .body(())
            .expect("request");
        let (parts, _) = request.into_parts();
        assert_eq!(query_token(&parts), None);
    }

    #[test]
    fn test_bearer_token_preferred_over_query() {
        let request = axum::http::Request::builder()
            .uri("/track-stream?token=from-query")
            .header("authorization", "Bearer from-header")
            .body(())
            .expect("request");
        let (parts, _) = request.into_parts();
        assert_eq!(extract_token(&parts), Some("from-header".to_string()));
    }
}
