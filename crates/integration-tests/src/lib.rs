//! Integration test support for the Clarity Pixel app.
//!
//! # Running Tests
//!
//! ```bash
//! # Everything that needs no database
//! cargo test -p clarity-pixel-integration-tests
//!
//! # Including PostgreSQL-backed tests
//! APP_DATABASE_URL=postgres://localhost/clarity_test \
//!     cargo test -p clarity-pixel-integration-tests -- --include-ignored
//! ```
//!
//! # Fixtures
//!
//! - [`FakeThemes`] - scripted [`ThemeSource`] with a call counter
//! - [`FailingStore`] - [`StoreRepository`] whose every call fails
//! - [`test_state`] - [`AppState`] over a lazy pool that never connects
//! - [`seeded_state`] - [`AppState`] over in-memory backends with an
//!   installed [`SHOP`]
//! - [`sign_session_token`] / [`sign_webhook`] - App Bridge and webhook signatures

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use clarity_pixel_app::config::{AppConfig, DEFAULT_EMBED_MARKER, ShopifyAppConfig};
use clarity_pixel_app::db::{
    InMemoryTokenRepository, RepositoryError, StoreRepository, TokenRepository,
};
use clarity_pixel_app::shopify::{
    AdminShopifyError, OAuthToken, ShopContext, ThemeRef, ThemeSource,
};
use clarity_pixel_app::state::{AppState, Repositories};
use clarity_pixel_core::{ShopDomain, StoreRecord};
use hmac::{Hmac, Mac};
use jsonwebtoken::{EncodingKey, Header, encode};
use secrecy::SecretString;
use sha2::Sha256;
use sqlx::postgres::PgPoolOptions;

pub const API_KEY: &str = "test-api-key";
pub const API_SECRET: &str = "test-api-secret-9f8e7d6c5b4a";
pub const SHOP: &str = "demo.myshopify.com";

/// Theme-level `config/settings_data.json` with the app embed block, as
/// Shopify writes it (banner comment included).
pub const SETTINGS_WITH_EMBED: &str = r#"/*
 * ------------------------------------------------------------
 * IMPORTANT: The contents of this file are auto-generated.
 * ------------------------------------------------------------
 */
{
  "current": {
    "sections": {},
    "blocks": {
      "1627465387451927616": {
        "type": "shopify://apps/clarity-pixel/blocks/clarity/8c5b62d2-48d1-4b7e-a01b-4b7a0e2d3f19",
        "disabled": false,
        "settings": {}
      }
    }
  },
  "presets": {}
}"#;

/// Same file with only an unrelated app embed.
pub const SETTINGS_WITHOUT_EMBED: &str = r#"{
  "current": {
    "blocks": {
      "9981": {
        "type": "shopify://apps/reviews-app/blocks/stars/11",
        "disabled": false,
        "settings": {}
      }
    }
  }
}"#;

#[must_use]
pub fn shop() -> ShopDomain {
    ShopDomain::parse(SHOP).unwrap_or_else(|e| panic!("fixture shop is valid: {e}"))
}

#[must_use]
pub fn shop_context(shop: &ShopDomain) -> ShopContext {
    ShopContext::new(
        shop.clone(),
        SecretString::from("shpat_integration"),
        Some("read_themes".to_string()),
    )
}

// =============================================================================
// Theme fixtures
// =============================================================================

/// What a [`FakeThemes`] answers.
#[derive(Debug, Clone)]
pub enum ThemeFixture {
    /// The shop has no published theme.
    NoMainTheme,
    /// Looking up the main theme fails.
    MainThemeFails,
    /// The main theme has no settings file.
    SettingsMissing,
    /// Reading the settings file fails.
    SettingsFails,
    /// The settings file holds this text.
    Settings(String),
}

/// Scripted [`ThemeSource`].
#[derive(Debug)]
pub struct FakeThemes {
    fixture: ThemeFixture,
    calls: AtomicUsize,
}

impl FakeThemes {
    #[must_use]
    pub const fn new(fixture: ThemeFixture) -> Self {
        Self {
            fixture,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn settings(raw: &str) -> Self {
        Self::new(ThemeFixture::Settings(raw.to_string()))
    }

    /// Number of `main_theme` lookups so far.
    #[must_use]
    pub fn main_theme_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn dawn() -> ThemeRef {
    ThemeRef {
        id: "gid://shopify/OnlineStoreTheme/140000000001".to_string(),
        name: "Dawn".to_string(),
    }
}

#[async_trait]
impl ThemeSource for FakeThemes {
    async fn main_theme(&self, _ctx: &ShopContext) -> Result<Option<ThemeRef>, AdminShopifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fixture {
            ThemeFixture::NoMainTheme => Ok(None),
            ThemeFixture::MainThemeFails => Err(AdminShopifyError::Unauthorized(
                "Invalid or expired access token".to_string(),
            )),
            _ => Ok(Some(dawn())),
        }
    }

    async fn settings_data(
        &self,
        _ctx: &ShopContext,
        _theme: &ThemeRef,
    ) -> Result<Option<String>, AdminShopifyError> {
        match &self.fixture {
            ThemeFixture::Settings(raw) => Ok(Some(raw.clone())),
            ThemeFixture::SettingsFails => Err(AdminShopifyError::RateLimited(2)),
            _ => Ok(None),
        }
    }
}

// =============================================================================
// Store fixtures
// =============================================================================

/// [`StoreRepository`] that fails every call like an unreachable database.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl StoreRepository for FailingStore {
    async fn find(&self, _shop: &ShopDomain) -> Result<Option<StoreRecord>, RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn upsert(&self, _record: &StoreRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn delete(&self, _shop: &ShopDomain) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
    }
}

// =============================================================================
// App state and signatures
// =============================================================================

#[must_use]
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: SecretString::from("postgres://localhost:1/clarity_test"),
        host: "127.0.0.1"
            .parse()
            .unwrap_or_else(|e| panic!("fixture host is valid: {e}")),
        port: 3000,
        base_url: "https://clarity.test".to_string(),
        shopify: ShopifyAppConfig {
            api_key: API_KEY.to_string(),
            api_secret: SecretString::from(API_SECRET),
            api_version: "2026-01".to_string(),
            scopes: vec!["read_themes".to_string()],
            request_timeout: Duration::from_secs(5),
        },
        embed_marker: DEFAULT_EMBED_MARKER.to_string(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// App state whose pool never connects; for requests rejected before any
/// database access.
///
/// # Panics
///
/// Panics if the fixture URL does not parse.
#[must_use]
pub fn test_state() -> AppState {
    AppState::new(test_config(), lazy_pool()).unwrap_or_else(|e| panic!("app state: {e}"))
}

fn lazy_pool() -> sqlx::PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://localhost:1/clarity_test")
        .unwrap_or_else(|e| panic!("lazy pool: {e}"))
}

/// App state over `store` and `themes`, with an offline token already
/// stored for [`SHOP`] so requests never reach token exchange.
///
/// # Panics
///
/// Panics if the fixture pool or HTTP client cannot be built.
pub async fn seeded_state(
    store: Arc<dyn StoreRepository>,
    themes: Arc<dyn ThemeSource>,
) -> AppState {
    let tokens = InMemoryTokenRepository::new();
    tokens
        .save(&OAuthToken {
            shop: shop(),
            access_token: SecretString::from("shpat_integration"),
            scope: "read_themes".to_string(),
            obtained_at: 1_700_000_000,
        })
        .await
        .unwrap_or_else(|e| panic!("seed token: {e}"));

    let repositories = Repositories {
        store,
        tokens: Arc::new(tokens),
        themes,
    };
    AppState::with_repositories(test_config(), lazy_pool(), repositories)
        .unwrap_or_else(|e| panic!("app state: {e}"))
}

/// An App Bridge session token for `shop`, valid from `now - 5` to `now + 60`.
///
/// # Panics
///
/// Panics if the claims cannot be encoded.
#[must_use]
pub fn sign_session_token(shop: &str, aud: &str, secret: &str, now: i64) -> String {
    let claims = serde_json::json!({
        "iss": format!("https://{shop}/admin"),
        "dest": format!("https://{shop}"),
        "aud": aud,
        "sub": "1",
        "exp": now + 60,
        "nbf": now - 5,
        "iat": now - 5,
        "jti": "it-1",
        "sid": "it-session",
    });

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap_or_else(|e| panic!("session token: {e}"))
}

/// `X-Shopify-Hmac-Sha256` value for `body`.
///
/// # Panics
///
/// Panics if HMAC initialization fails (it accepts any key length).
#[must_use]
pub fn sign_webhook(body: &[u8], secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|e| panic!("hmac key: {e}"));
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}
