//! Embedded settings page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, response::IntoResponse, routing::get};
use clarity_pixel_core::{SettingsForm, ShopDomain, snippet};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireShop;
use crate::services::SettingsView;
use crate::state::AppState;

/// Where merchants sign up for a Clarity project.
pub const CLARITY_DASHBOARD_URL: &str = "https://clarity.microsoft.com/";

// =============================================================================
// Templates
// =============================================================================

/// One checkbox in the event options card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOption {
    pub key: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct SettingsPageTemplate {
    pub api_key: String,
    pub shop: String,
    pub tracking_id: String,
    pub has_tracking_id: bool,
    pub embed_present: bool,
    pub app_installed: bool,
    pub events: Vec<EventOption>,
    pub snippet: String,
    /// Details blob the page posts back on save.
    pub details_json: String,
    pub theme_editor_url: String,
    pub customer_events_url: String,
    pub clarity_url: &'static str,
}

impl SettingsPageTemplate {
    /// Build the page from a loaded view.
    ///
    /// # Errors
    ///
    /// Returns an error if the details cannot be serialized for the page.
    pub fn from_view(
        api_key: &str,
        shop: &ShopDomain,
        view: SettingsView,
    ) -> Result<Self, serde_json::Error> {
        let form = SettingsForm::new(view.tracking_id.as_ref(), view.details);
        let events = form
            .events()
            .iter()
            .map(|(event, checked)| EventOption {
                key: event.key(),
                label: event.label(),
                checked,
            })
            .collect();

        Ok(Self {
            api_key: api_key.to_string(),
            shop: shop.to_string(),
            tracking_id: form.tracking_id_input().to_string(),
            has_tracking_id: view.tracking_id.is_some(),
            embed_present: view.embed_present,
            app_installed: form.details().app_installed(),
            events,
            snippet: snippet::generate(view.tracking_id.as_ref()),
            details_json: form.details().to_json()?.to_string(),
            theme_editor_url: shop.admin_url("themes/current/editor?context=apps"),
            customer_events_url: shop.admin_url("settings/customer_events"),
            clarity_url: CLARITY_DASHBOARD_URL,
        })
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Render the settings page for the authenticated shop.
#[instrument(skip(state, ctx), fields(shop = %ctx.shop))]
pub async fn index(
    State(state): State<AppState>,
    RequireShop(ctx): RequireShop,
) -> Result<impl IntoResponse, AppError> {
    let view = state.settings().load(&ctx).await?;

    SettingsPageTemplate::from_view(state.shopify().api_key(), &ctx.shop, view)
        .map_err(|e| AppError::Internal(format!("failed to render details: {e}")))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}
