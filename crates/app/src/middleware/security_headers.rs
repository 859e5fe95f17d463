//! Security headers for an app rendered inside the Shopify admin iframe.
//!
//! `X-Frame-Options` cannot express "framed by this one shop", so framing is
//! controlled solely through CSP `frame-ancestors`, scoped to the shop named in
//! the request's `shop` query parameter.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS},
    },
    middleware::Next,
    response::Response,
};
use clarity_pixel_core::ShopDomain;

/// Policy applied to every response; `frame-ancestors` is appended per request.
const BASE_CSP: &str = "default-src 'self'; \
     script-src 'self' https://cdn.shopify.com; \
     style-src 'self' 'unsafe-inline' https://cdn.shopify.com; \
     img-src 'self' data: https://cdn.shopify.com; \
     font-src 'self' https://cdn.shopify.com; \
     connect-src 'self' https://*.shopify.com https://*.myshopify.com; \
     frame-src https://*.shopify.com; \
     object-src 'none'; \
     base-uri 'self'; \
     form-action 'self' https://*.myshopify.com";

/// Add security headers to all responses.
///
/// Headers applied:
/// - `Content-Security-Policy` - [`BASE_CSP`] plus per-shop `frame-ancestors`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Cache-Control: no-store, max-age=0`
/// - `X-DNS-Prefetch-Control: off`
pub async fn embedded_app_headers_middleware(request: Request, next: Next) -> Response {
    let shop = request.uri().query().and_then(shop_from_query);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    let csp = format!("{BASE_CSP}; {}", frame_ancestors(shop.as_ref()));
    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if !headers.contains_key("cache-control") {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, max-age=0"),
        );
    }

    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

/// The `frame-ancestors` directive for a request from `shop`.
#[must_use]
pub fn frame_ancestors(shop: Option<&ShopDomain>) -> String {
    match shop {
        Some(shop) => format!("frame-ancestors https://{shop} https://admin.shopify.com"),
        None => "frame-ancestors 'none'".to_string(),
    }
}

fn shop_from_query(query: &str) -> Option<ShopDomain> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "shop")
        .and_then(|(_, value)| ShopDomain::parse(&value).ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Router, body::Body, http::Request as HttpRequest, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn csp_for(uri: &str) -> String {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(embedded_app_headers_middleware));

        let response = app
            .oneshot(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        response
            .headers()
            .get(CONTENT_SECURITY_POLICY)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_frame_ancestors_for_shop() {
        let csp = csp_for("/?shop=demo.myshopify.com&host=abc").await;
        assert!(csp.ends_with("frame-ancestors https://demo.myshopify.com https://admin.shopify.com"));
    }

    #[tokio::test]
    async fn test_frame_ancestors_without_valid_shop() {
        assert!(csp_for("/").await.ends_with("frame-ancestors 'none'"));
        assert!(
            csp_for("/?shop=evil.com%20https://attacker.example")
                .await
                .ends_with("frame-ancestors 'none'")
        );
    }
}
