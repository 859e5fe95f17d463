//! Session middleware configuration.
//!
//! Browser sessions only carry OAuth `state` between `/auth` and
//! `/auth/callback`; embedded requests authenticate with session tokens.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AppConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "clarity_pixel_session";

/// Session expiry time in seconds (an install handshake takes seconds).
const SESSION_EXPIRY_SECONDS: i64 = 10 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The store uses the default `tower_sessions.session` table, created by the
/// app migrations.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AppConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        // Lax: the OAuth callback is a top-level cross-site navigation
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/auth")
}
