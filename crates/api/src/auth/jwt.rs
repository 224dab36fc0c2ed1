//! JWT token generation and validation for backend operators

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use multisite_shared::{Operator, SiteId};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// JWT claims carried by operator tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorClaims {
    /// Subject (operator ID)
    pub sub: Uuid,
    /// Site the operator administers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

impl From<OperatorClaims> for Operator {
    fn from(claims: OperatorClaims) -> Self {
        Operator {
            id: claims.sub,
            site_id: claims.site_id.map(SiteId),
        }
    }
}

/// JWT manager for operator token operations
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secret: &str, token_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_expiry_hours,
        }
    }

    /// Issue a token for an operator
    pub fn generate_token(&self, operator: &Operator) -> Result<String, JwtError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + Duration::hours(self.token_expiry_hours);

        let claims = OperatorClaims {
            sub: operator.id,
            site_id: operator.site_id.map(|id| id.0),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Encoding(e.to_string()))
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<OperatorClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 60; // 60 second clock skew tolerance

        decode::<OperatorClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidToken => JwtError::Invalid,
                jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => JwtError::Invalid,
                _ => JwtError::Validation(e.to_string()),
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    Invalid,
    #[error("Token encoding failed: {0}")]
    Encoding(String),
    #[error("Token validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-chars!";

    #[test]
    fn test_token_generation_and_validation() {
        let jwt = JwtManager::new(SECRET, 24);
        let operator = Operator {
            id: Uuid::new_v4(),
            site_id: Some(SiteId(5)),
        };

        let token = jwt.generate_token(&operator).expect("Failed to generate token");
        let claims = jwt.validate_token(&token).expect("Invalid token");

        assert_eq!(claims.sub, operator.id);
        assert_eq!(claims.site_id, Some(5));
        assert_eq!(Operator::from(claims), operator);
    }

    #[test]
    fn test_operator_without_site() {
        let jwt = JwtManager::new(SECRET, 24);
        let operator = Operator {
            id: Uuid::new_v4(),
            site_id: None,
        };

        let token = jwt.generate_token(&operator).unwrap();
        let decoded = Operator::from(jwt.validate_token(&token).unwrap());
        assert_eq!(decoded.site_id, None);
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JwtManager::new(SECRET, -2);
        let operator = Operator {
            id: Uuid::new_v4(),
            site_id: None,
        };

        let token = jwt.generate_token(&operator).unwrap();
        assert!(matches!(jwt.validate_token(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let issuer = JwtManager::new("another-secret-that-is-32-chars-long!!", 24);
        let jwt = JwtManager::new(SECRET, 24);
        let operator = Operator {
            id: Uuid::new_v4(),
            site_id: Some(SiteId(1)),
        };

        let token = issuer.generate_token(&operator).unwrap();
        assert!(jwt.validate_token(&token).is_err());
    }
}
