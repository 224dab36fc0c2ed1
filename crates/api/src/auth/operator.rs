//! Operator identity extraction
//!
//! A missing or invalid token simply means "no operator": the request gate never
//! rejects a request because of its credentials. Routes that need an operator call
//! [`require_operator`].

use axum::{http::HeaderMap, Extension};
use multisite_shared::Operator;

use super::JwtManager;
use crate::error::{ApiError, ApiResult};

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the authenticated operator for a request, if any
pub fn authenticate(headers: &HeaderMap, jwt: &JwtManager) -> Option<Operator> {
    let token = bearer_token(headers)?;
    match jwt.validate_token(token) {
        Ok(claims) => Some(claims.into()),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid operator token");
            None
        }
    }
}

/// Unwrap the operator the gate attached to the request
pub fn require_operator(operator: Option<Extension<Operator>>) -> ApiResult<Operator> {
    operator
        .map(|Extension(op)| op)
        .ok_or(ApiError::OperatorRequired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use multisite_shared::SiteId;
    use uuid::Uuid;

    fn jwt() -> JwtManager {
        JwtManager::new("test-secret-key-at-least-32-chars!", 1)
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert("authorization", HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_authenticate_valid_token() {
        let jwt = jwt();
        let operator = Operator {
            id: Uuid::new_v4(),
            site_id: Some(SiteId(3)),
        };
        let token = jwt.generate_token(&operator).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        assert_eq!(authenticate(&headers, &jwt), Some(operator));
    }

    #[test]
    fn test_authenticate_garbage_token_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer not-a-jwt"));
        assert_eq!(authenticate(&headers, &jwt()), None);
    }

    #[test]
    fn test_require_operator() {
        assert!(matches!(
            require_operator(None),
            Err(ApiError::OperatorRequired)
        ));

        let operator = Operator {
            id: Uuid::new_v4(),
            site_id: None,
        };
        assert_eq!(require_operator(Some(Extension(operator))).unwrap(), operator);
    }
}
