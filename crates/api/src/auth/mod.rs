//! Operator authentication for the administrative area

pub mod jwt;
pub mod operator;

pub use jwt::{JwtError, JwtManager, OperatorClaims};
pub use operator::{authenticate, bearer_token, require_operator};
