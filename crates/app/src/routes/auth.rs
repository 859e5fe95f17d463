//! OAuth install flow.
//!
//! Used when a shop opens the app from outside the admin, or installs it
//! through a link rather than a managed install. Embedded requests never come
//! through here; they use session tokens (see [`crate::middleware::RequireShop`]).

use axum::{
    Router,
    extract::{Query, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use clarity_pixel_core::ShopDomain;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{error, info, instrument, warn};

use crate::error::AppError;
use crate::shopify::signature::verify_query_hmac;
use crate::state::AppState;

const OAUTH_STATE_KEY: &str = "shopify_oauth_state";

/// What `/auth` remembers for the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PendingInstall {
    state: String,
    shop: ShopDomain,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth", get(begin))
        .route("/auth/callback", get(callback))
}

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct BeginParams {
    pub shop: Option<String>,
}

/// Decoded callback query. Kept as pairs so the HMAC covers every parameter
/// Shopify sent.
#[derive(Debug, Default)]
struct CallbackParams {
    pairs: Vec<(String, String)>,
}

impl CallbackParams {
    fn parse(raw: Option<&str>) -> Self {
        Self {
            pairs: raw
                .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
                .unwrap_or_default(),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }

    fn verify(&self, api_secret: &str) -> bool {
        verify_query_hmac(
            self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            api_secret,
        )
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /auth?shop= - Start OAuth for `shop`.
#[instrument(skip(state, session))]
async fn begin(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<BeginParams>,
) -> Result<Response, AppError> {
    let shop = params
        .shop
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("missing shop parameter".to_string()))
        .and_then(|s| ShopDomain::parse(s).map_err(|e| AppError::BadRequest(e.to_string())))?;

    let pending = PendingInstall {
        state: uuid::Uuid::new_v4().to_string(),
        shop,
    };

    session
        .insert(OAUTH_STATE_KEY, &pending)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store OAuth state: {e}")))?;

    let auth_url = state.shopify().authorization_url(
        &pending.shop,
        &state.config().oauth_callback_url(),
        &pending.state,
    );

    info!(shop = %pending.shop, "Redirecting to Shopify OAuth");
    Ok(Redirect::to(&auth_url).into_response())
}

/// GET /auth/callback - Finish OAuth and store the offline token.
#[instrument(skip(state, session, raw_query))]
async fn callback(
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw_query): RawQuery,
) -> Result<Response, AppError> {
    let params = CallbackParams::parse(raw_query.as_deref());

    if let Some(error) = params.get("error") {
        let description = params.get("error_description").unwrap_or_default();
        warn!(error = %error, description = %description, "Shopify OAuth was declined");
        return Err(AppError::Unauthorized("installation was declined".to_string()));
    }

    if !params.verify(state.shopify().api_secret()) {
        error!("Invalid HMAC signature in OAuth callback");
        return Err(AppError::BadRequest("invalid signature".to_string()));
    }

    let (Some(shop), Some(code), Some(callback_state)) =
        (params.get("shop"), params.get("code"), params.get("state"))
    else {
        return Err(AppError::BadRequest(
            "missing shop, code, or state".to_string(),
        ));
    };
    let shop = ShopDomain::parse(shop).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let pending: Option<PendingInstall> = session
        .remove(OAUTH_STATE_KEY)
        .await
        .map_err(|e| AppError::Internal(format!("failed to read OAuth state: {e}")))?;
    if !pending.is_some_and(|p| p.state == callback_state && p.shop == shop) {
        error!(shop = %shop, "OAuth state mismatch");
        return Err(AppError::Unauthorized("invalid OAuth state".to_string()));
    }

    let token = state.shopify().exchange_code(&shop, code).await?;
    state.tokens().save(&token).await?;

    info!(shop = %shop, scope = %token.scope, "Installed for shop");

    let app_path = format!("apps/{}", state.shopify().api_key());
    Ok(Redirect::to(&shop.admin_url(&app_path)).into_response())
}
