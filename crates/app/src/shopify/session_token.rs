//! App Bridge session token verification.
//!
//! Embedded pages receive a short-lived HS256 JWT signed with the app's API
//! secret. A valid token identifies the shop (`dest`) and proves the request
//! came from inside that shop's admin.

use clarity_pixel_core::ShopDomain;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use serde::Deserialize;
use thiserror::Error;

/// Clock skew tolerated on `exp` and `nbf`, in seconds.
pub const LEEWAY_SECONDS: u64 = 10;

/// Reasons a session token is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionTokenError {
    #[error("malformed session token")]
    Malformed,
    #[error("unsupported signing algorithm")]
    UnsupportedAlgorithm,
    #[error("invalid session token signature")]
    InvalidSignature,
    #[error("session token expired")]
    Expired,
    #[error("session token not yet valid")]
    NotYetValid,
    #[error("session token audience does not match this app")]
    InvalidAudience,
    #[error("invalid session token destination: {0}")]
    InvalidDestination(String),
}

impl From<jsonwebtoken::errors::Error> for SessionTokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidAudience => Self::InvalidAudience,
            ErrorKind::InvalidAlgorithm => Self::UnsupportedAlgorithm,
            _ => Self::Malformed,
        }
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionTokenClaims {
    /// Shop admin URL (`https://{shop}/admin`)
    pub iss: String,
    /// Shop URL (`https://{shop}`)
    pub dest: String,
    /// App API key
    pub aud: String,
    /// Staff member ID
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: i64,
    pub nbf: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub sid: Option<String>,
}

/// A verified session token.
#[derive(Debug, Clone)]
pub struct SessionToken {
    /// Shop the token was issued for
    pub shop: ShopDomain,
    pub claims: SessionTokenClaims,
}

fn validation(api_key: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[api_key]);
    validation.set_required_spec_claims(&["exp", "nbf", "aud"]);
    validation.validate_nbf = true;
    validation.leeway = LEEWAY_SECONDS;
    validation
}

/// Verify `token` against the app credentials.
///
/// # Errors
///
/// Returns a `SessionTokenError` describing the first failed check.
pub fn verify_session_token(
    token: &str,
    api_key: &str,
    api_secret: &str,
) -> Result<SessionToken, SessionTokenError> {
    let key = DecodingKey::from_secret(api_secret.as_bytes());
    let claims = decode::<SessionTokenClaims>(token, &key, &validation(api_key))?.claims;

    let shop = shop_from_url(&claims.dest)?;
    if shop_from_url(&claims.iss)? != shop {
        return Err(SessionTokenError::InvalidDestination(
            "issuer and destination differ".to_string(),
        ));
    }

    Ok(SessionToken { shop, claims })
}

fn shop_from_url(raw: &str) -> Result<ShopDomain, SessionTokenError> {
    let url =
        url::Url::parse(raw).map_err(|e| SessionTokenError::InvalidDestination(e.to_string()))?;
    if url.scheme() != "https" {
        return Err(SessionTokenError::InvalidDestination(
            "destination must use https".to_string(),
        ));
    }
    let host = url
        .host_str()
        .ok_or_else(|| SessionTokenError::InvalidDestination("missing host".to_string()))?;
    ShopDomain::parse(host).map_err(|e| SessionTokenError::InvalidDestination(e.to_string()))
}
