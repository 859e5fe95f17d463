//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Embedded page (session token via `id_token` query parameter)
//! GET  /                       - Settings page
//!
//! # API (session token via `Authorization: Bearer`)
//! GET  /api/settings           - Current settings and embed status
//! POST /api/settings           - Save tracking ID and details
//! GET  /api/snippet            - Custom pixel code (text/plain)
//!
//! # Install
//! GET  /auth?shop=             - Start OAuth
//! GET  /auth/callback          - Finish OAuth, store offline token
//!
//! # Webhooks (HMAC-verified)
//! POST /webhooks               - app/uninstalled and privacy topics
//! ```

pub mod api;
pub mod app;
pub mod auth;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the application router (without health checks or static files).
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(app::router())
        .merge(api::router())
        .merge(auth::router())
        .merge(webhooks::router())
}
