//! Shopify Admin API GraphQL client with OAuth and token exchange.

use std::sync::Arc;

use clarity_pixel_core::ShopDomain;
use graphql_client::QueryBody;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use crate::config::ShopifyAppConfig;

use super::{AdminShopifyError, GraphQLError, GraphQLErrorLocation, ShopContext};

const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const ID_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:id_token";
const OFFLINE_TOKEN_TYPE: &str = "urn:shopify:params:oauth:token-type:offline-access-token";

/// Offline OAuth token for one shop.
#[derive(Debug, Clone)]
pub struct OAuthToken {
    /// Shop the token was issued for
    pub shop: ShopDomain,
    /// The access token for API calls
    pub access_token: SecretString,
    /// Granted scopes
    pub scope: String,
    /// Unix timestamp when token was obtained
    pub obtained_at: i64,
}

/// Shopify Admin API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    api_version: String,
    api_key: String,
    api_secret: SecretString,
    scopes: Vec<String>,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

/// OAuth token response from Shopify.
#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    scope: String,
}

#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
    subject_token: &'a str,
    subject_token_type: &'static str,
    requested_token_type: &'static str,
}

impl AdminClient {
    /// Create a new Admin API client.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyAppConfig) -> Result<Self, AdminShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(AdminClientInner {
                client,
                api_version: config.api_version.clone(),
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.clone(),
                scopes: config.scopes.clone(),
            }),
        })
    }

    /// Get the app's API key (client ID).
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    /// Get the app's API secret (for HMAC and session token verification).
    #[must_use]
    pub fn api_secret(&self) -> &str {
        self.inner.api_secret.expose_secret()
    }

    // =========================================================================
    // OAuth Flow
    // =========================================================================

    /// Generate the OAuth authorization URL for `shop`.
    #[must_use]
    pub fn authorization_url(&self, shop: &ShopDomain, redirect_uri: &str, state: &str) -> String {
        let scope = self.inner.scopes.join(",");
        format!(
            "https://{}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            shop,
            urlencoding::encode(&self.inner.api_key),
            urlencoding::encode(&scope),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an offline access token.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::OAuth` if Shopify rejects the code.
    /// Returns `AdminShopifyError::Http` if the HTTP request fails.
    #[instrument(skip(self, code), fields(shop = %shop))]
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<OAuthToken, AdminShopifyError> {
        let params = [
            ("client_id", self.inner.api_key.as_str()),
            ("client_secret", self.api_secret()),
            ("code", code),
        ];

        let response = self
            .inner
            .client
            .post(access_token_url(shop))
            .form(&params)
            .send()
            .await?;

        read_token_response(shop, response, "Code exchange").await
    }

    /// Exchange an App Bridge session token for an offline access token.
    ///
    /// Used when a shop opens the app but no token is stored yet (managed
    /// installs never hit the OAuth callback).
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError::OAuth` if Shopify rejects the session token.
    /// Returns `AdminShopifyError::Http` if the HTTP request fails.
    #[instrument(skip(self, session_token), fields(shop = %shop))]
    pub async fn exchange_session_token(
        &self,
        shop: &ShopDomain,
        session_token: &str,
    ) -> Result<OAuthToken, AdminShopifyError> {
        let body = TokenExchangeRequest {
            client_id: &self.inner.api_key,
            client_secret: self.api_secret(),
            grant_type: TOKEN_EXCHANGE_GRANT,
            subject_token: session_token,
            subject_token_type: ID_TOKEN_TYPE,
            requested_token_type: OFFLINE_TOKEN_TYPE,
        };

        let response = self
            .inner
            .client
            .post(access_token_url(shop))
            .json(&body)
            .send()
            .await?;

        read_token_response(shop, response, "Token exchange").await
    }

    // =========================================================================
    // GraphQL Execution
    // =========================================================================

    /// Execute a GraphQL query against the shop in `ctx`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(super) async fn execute<V, T>(
        &self,
        ctx: &ShopContext,
        body: &QueryBody<V>,
    ) -> Result<T, AdminShopifyError>
    where
        V: Serialize + Sync,
        T: DeserializeOwned,
    {
        let endpoint = format!(
            "https://{}/admin/api/{}/graphql.json",
            ctx.shop, self.inner.api_version
        );

        let response = self
            .inner
            .client
            .post(&endpoint)
            .header("X-Shopify-Access-Token", ctx.access_token.expose_secret())
            .json(body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok())
                .map_or(2, |secs| secs.ceil() as u64);
            return Err(AdminShopifyError::RateLimited(retry_after));
        }

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AdminShopifyError::Unauthorized(
                "Invalid or expired access token".to_string(),
            ));
        }

        let graphql_response: GraphQLResponse<T> = response.json().await?;
        into_data(graphql_response)
    }
}

async fn read_token_response(
    shop: &ShopDomain,
    response: reqwest::Response,
    action: &str,
) -> Result<OAuthToken, AdminShopifyError> {
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(AdminShopifyError::OAuth(format!(
            "{action} failed ({status}): {text}"
        )));
    }

    let token_response: OAuthTokenResponse = response.json().await?;

    Ok(OAuthToken {
        shop: shop.clone(),
        access_token: SecretString::from(token_response.access_token),
        scope: token_response.scope,
        obtained_at: chrono::Utc::now().timestamp(),
    })
}

fn access_token_url(shop: &ShopDomain) -> String {
    format!("https://{shop}/admin/oauth/access_token")
}

fn into_data<T>(response: GraphQLResponse<T>) -> Result<T, AdminShopifyError> {
    if let Some(errors) = response.errors
        && !errors.is_empty()
    {
        let converted_errors: Vec<GraphQLError> = errors
            .into_iter()
            .map(|e| GraphQLError {
                message: e.message,
                locations: e
                    .locations
                    .into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: l.line,
                        column: l.column,
                    })
                    .collect(),
                path: e.path,
            })
            .collect();
        return Err(AdminShopifyError::GraphQL(converted_errors));
    }

    response.data.ok_or_else(|| {
        AdminShopifyError::GraphQL(vec![GraphQLError {
            message: "No data in response".to_string(),
            locations: vec![],
            path: vec![],
        }])
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client() -> AdminClient {
        AdminClient::new(&ShopifyAppConfig {
            api_key: "key123".to_string(),
            api_secret: SecretString::from("hush"),
            api_version: "2026-01".to_string(),
            scopes: vec!["read_themes".to_string(), "write_pixels".to_string()],
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_authorization_url() {
        let shop = ShopDomain::parse("demo.myshopify.com").unwrap();
        let url = client().authorization_url(&shop, "https://app.test/auth/callback", "st8");

        assert!(url.starts_with("https://demo.myshopify.com/admin/oauth/authorize?"));
        assert!(url.contains("client_id=key123"));
        assert!(url.contains("scope=read_themes%2Cwrite_pixels"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.test%2Fauth%2Fcallback"));
        assert!(url.ends_with("state=st8"));
    }

    #[test]
    fn test_into_data_surfaces_graphql_errors() {
        let response: GraphQLResponse<serde_json::Value> = serde_json::from_str(
            r#"{"errors":[{"message":"Access denied","locations":[{"line":2,"column":3}]}]}"#,
        )
        .unwrap();

        let err = into_data(response).unwrap_err();
        match err {
            AdminShopifyError::GraphQL(errors) => {
                assert_eq!(errors[0].message, "Access denied");
                assert_eq!(errors[0].locations[0].line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_into_data_requires_data() {
        let response: GraphQLResponse<serde_json::Value> =
            serde_json::from_str(r#"{"data":null}"#).unwrap();
        assert!(into_data(response).is_err());

        let response: GraphQLResponse<serde_json::Value> =
            serde_json::from_str(r#"{"data":{"ok":true},"errors":[]}"#).unwrap();
        assert_eq!(into_data(response).unwrap(), serde_json::json!({"ok": true}));
    }

    #[test]
    fn test_token_exchange_request_shape() {
        let body = TokenExchangeRequest {
            client_id: "key123",
            client_secret: "hush",
            grant_type: TOKEN_EXCHANGE_GRANT,
            subject_token: "jwt",
            subject_token_type: ID_TOKEN_TYPE,
            requested_token_type: OFFLINE_TOKEN_TYPE,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["requested_token_type"],
            "urn:shopify:params:oauth:token-type:offline-access-token"
        );
        assert_eq!(json["subject_token"], "jwt");
    }
}
