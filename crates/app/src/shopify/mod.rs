//! Shopify Admin API integration.
//!
//! # Architecture
//!
//! - [`AdminClient`] is a single pooled HTTP client shared by every shop; each
//!   call takes the [`ShopContext`] of the authenticated shop
//! - GraphQL request bodies use `graphql_client::QueryBody`
//! - Embedded page requests are authenticated with App Bridge session tokens
//!   (see [`session_token`])
//!
//! # Example
//!
//! ```rust,ignore
//! use clarity_pixel_app::shopify::{AdminClient, ThemeSource};
//!
//! let client = AdminClient::new(&config.shopify)?;
//! if let Some(theme) = client.main_theme(&ctx).await? {
//!     let raw = client.settings_data(&ctx, &theme).await?;
//! }
//! ```

mod client;
pub mod session_token;
pub mod signature;
mod themes;

pub use client::{AdminClient, OAuthToken};
pub use session_token::{SessionToken, SessionTokenError, verify_session_token};
pub use themes::{ThemeRef, ThemeSource};

use clarity_pixel_core::ShopDomain;
use secrecy::SecretString;
use thiserror::Error;

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// OAuth code or token exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Response was well-formed but not usable.
    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The authenticated shop a request acts for.
///
/// Built per request from a verified session token and the shop's stored
/// offline token. Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopContext {
    /// Shop the request acts for.
    pub shop: ShopDomain,
    /// Offline Admin API access token.
    pub access_token: SecretString,
    /// Granted scopes, comma-separated as Shopify reports them.
    pub scope: Option<String>,
}

impl ShopContext {
    /// Build a context from a shop and its access token.
    #[must_use]
    pub fn new(shop: ShopDomain, access_token: SecretString, scope: Option<String>) -> Self {
        Self {
            shop,
            access_token,
            scope,
        }
    }
}

impl From<OAuthToken> for ShopContext {
    fn from(token: OAuthToken) -> Self {
        Self::new(token.shop, token.access_token, Some(token.scope))
    }
}

impl std::fmt::Debug for ShopContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopContext")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Access denied for themes field".to_string(),
                locations: vec![],
                path: vec![],
            },
        ];
        let err = AdminShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Access denied for themes field"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = AdminShopifyError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_shop_context_debug_redacts_token() {
        let ctx = ShopContext::new(
            ShopDomain::parse("demo.myshopify.com").unwrap(),
            SecretString::from("shpat_live_token"),
            Some("read_themes".to_string()),
        );

        let debug_output = format!("{ctx:?}");
        assert!(debug_output.contains("demo.myshopify.com"));
        assert!(!debug_output.contains("shpat_live_token"));
    }
}
