//! Shop authentication extractor for embedded requests.
//!
//! App Bridge attaches a session token to every request: as a `Bearer`
//! header on `fetch` calls and as the `id_token` query parameter on the
//! initial document load. The token names the shop; the shop's offline access
//! token comes from storage, or from token exchange on first use.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use clarity_pixel_core::ShopDomain;
use tracing::{debug, error, info, warn};

use crate::error::set_sentry_shop;
use crate::shopify::{ShopContext, verify_session_token};
use crate::state::AppState;

/// Header telling App Bridge to fetch a fresh session token and retry.
pub const RETRY_INVALID_SESSION_HEADER: &str = "x-shopify-retry-invalid-session-request";

/// Extractor that requires an authenticated shop.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireShop(ctx): RequireShop) -> impl IntoResponse {
///     format!("Hello, {}!", ctx.shop)
/// }
/// ```
pub struct RequireShop(pub ShopContext);

/// Why a request could not be tied to a shop.
#[derive(Debug)]
pub enum ShopAuthRejection {
    /// A page load from outside the admin; send it through install.
    RedirectToInstall(ShopDomain),
    /// Missing, invalid, or expired session token.
    Unauthorized,
    /// Token storage failed.
    Internal,
}

impl IntoResponse for ShopAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToInstall(shop) => {
                Redirect::to(&format!("/auth?shop={}", urlencoding::encode(shop.as_str())))
                    .into_response()
            }
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                [(
                    HeaderName::from_static(RETRY_INVALID_SESSION_HEADER),
                    HeaderValue::from_static("1"),
                )],
            )
                .into_response(),
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireShop {
    type Rejection = ShopAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers, parts.uri.query()) else {
            let is_api = parts.uri.path().starts_with("/api/");
            let shop = parts.uri.query().and_then(|q| query_param(q, "shop"));
            return Err(match shop.and_then(|s| ShopDomain::parse(&s).ok()) {
                Some(shop) if !is_api => ShopAuthRejection::RedirectToInstall(shop),
                _ => ShopAuthRejection::Unauthorized,
            });
        };

        let shopify = state.shopify();
        let verified = verify_session_token(&token, shopify.api_key(), shopify.api_secret())
            .map_err(|e| {
                debug!(error = %e, "Rejected session token");
                ShopAuthRejection::Unauthorized
            })?;

        set_sentry_shop(verified.shop.as_str());
        let ctx = resolve_context(state, &verified.shop, &token).await?;
        Ok(Self(ctx))
    }
}

/// Stored offline token for `shop`, exchanging `session_token` for one if
/// none is stored yet.
async fn resolve_context(
    state: &AppState,
    shop: &ShopDomain,
    session_token: &str,
) -> Result<ShopContext, ShopAuthRejection> {
    let stored = state.tokens().get_by_shop(shop).await.map_err(|e| {
        error!(error = %e, "Failed to load offline token");
        ShopAuthRejection::Internal
    })?;
    if let Some(token) = stored {
        return Ok(token.into());
    }

    let token = state
        .shopify()
        .exchange_session_token(shop, session_token)
        .await
        .map_err(|e| {
            warn!(error = %e, "Session token exchange failed");
            ShopAuthRejection::Unauthorized
        })?;

    state.tokens().save(&token).await.map_err(|e| {
        error!(error = %e, "Failed to store offline token");
        ShopAuthRejection::Internal
    })?;

    info!(shop = %shop, "Stored offline token from token exchange");
    Ok(token.into())
}

/// Session token from the `Authorization` header or the `id_token` parameter.
fn session_token(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .or_else(|| query.and_then(|q| query_param(q, "id_token")))
}

fn query_param(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header.jwt.sig"));

        assert_eq!(
            session_token(&headers, Some("id_token=query.jwt.sig")).as_deref(),
            Some("header.jwt.sig")
        );
    }

    #[test]
    fn test_id_token_query_fallback() {
        let headers = HeaderMap::new();
        assert_eq!(
            session_token(&headers, Some("shop=demo.myshopify.com&id_token=q.jwt.sig")).as_deref(),
            Some("q.jwt.sig")
        );
        assert_eq!(session_token(&headers, Some("shop=demo.myshopify.com")), None);
        assert_eq!(session_token(&headers, None), None);
    }

    #[test]
    fn test_non_bearer_authorization_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(session_token(&headers, None), None);
    }

    #[test]
    fn test_unauthorized_asks_app_bridge_to_retry() {
        let response = ShopAuthRejection::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(RETRY_INVALID_SESSION_HEADER).unwrap(),
            "1"
        );
    }

    #[test]
    fn test_redirect_to_install() {
        let shop = ShopDomain::parse("demo.myshopify.com").unwrap();
        let response = ShopAuthRejection::RedirectToInstall(shop).into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            "/auth?shop=demo.myshopify.com"
        );
    }
}
