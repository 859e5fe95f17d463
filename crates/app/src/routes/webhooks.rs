//! Shopify webhook receiver.
//!
//! Handles the uninstall webhook and the mandatory privacy topics. The app
//! holds no customer data, so the customer topics are acknowledged only.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use clarity_pixel_core::ShopDomain;
use tracing::{debug, info, instrument, warn};

use crate::error::AppError;
use crate::shopify::signature::verify_webhook_hmac;
use crate::state::AppState;

const TOPIC_HEADER: &str = "X-Shopify-Topic";
const SHOP_HEADER: &str = "X-Shopify-Shop-Domain";
const HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";

/// Webhook topics the app subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookTopic {
    AppUninstalled,
    ShopRedact,
    CustomersDataRequest,
    CustomersRedact,
}

impl WebhookTopic {
    #[must_use]
    pub fn parse(topic: &str) -> Option<Self> {
        match topic {
            "app/uninstalled" => Some(Self::AppUninstalled),
            "shop/redact" => Some(Self::ShopRedact),
            "customers/data_request" => Some(Self::CustomersDataRequest),
            "customers/redact" => Some(Self::CustomersRedact),
            _ => None,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks", post(receive))
}

/// POST /webhooks - Verify and dispatch on `X-Shopify-Topic`.
#[instrument(skip(state, headers, body))]
async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = header(&headers, HMAC_HEADER)
        .ok_or_else(|| AppError::Unauthorized("missing webhook signature".into()))?;

    if !verify_webhook_hmac(&body, signature, state.shopify().api_secret()) {
        warn!("Invalid webhook signature");
        return Err(AppError::Unauthorized("invalid webhook signature".into()));
    }

    let topic = header(&headers, TOPIC_HEADER)
        .ok_or_else(|| AppError::BadRequest("missing topic header".into()))?;
    let shop = header(&headers, SHOP_HEADER)
        .ok_or_else(|| AppError::BadRequest("missing shop header".into()))
        .and_then(|s| ShopDomain::parse(s).map_err(|e| AppError::BadRequest(e.to_string())))?;

    let Some(topic) = WebhookTopic::parse(topic) else {
        debug!(topic, shop = %shop, "Ignoring unsubscribed webhook topic");
        return Ok(StatusCode::OK);
    };

    match topic {
        WebhookTopic::AppUninstalled => {
            let removed = state.tokens().delete(&shop).await?;
            info!(shop = %shop, removed, "App uninstalled");
        }
        WebhookTopic::ShopRedact => {
            state.tokens().delete(&shop).await?;
            let removed = state.store().delete(&shop).await?;
            info!(shop = %shop, removed, "Shop data redacted");
        }
        WebhookTopic::CustomersDataRequest | WebhookTopic::CustomersRedact => {
            debug!(shop = %shop, ?topic, "No customer data held");
        }
    }

    Ok(StatusCode::OK)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
