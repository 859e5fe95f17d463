//! JSON endpoints called by the settings page.
//!
//! All endpoints require an App Bridge session token.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use clarity_pixel_core::{SettingsForm, StoreDetails, TrackingId, snippet};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::error::AppError;
use crate::middleware::RequireShop;
use crate::services::SettingsView;
use crate::state::AppState;

const SAVE_FAILED_MESSAGE: &str = "Failed to save settings. Please try again.";

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /api/settings`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSettingsRequest {
    /// Raw field text; blank clears the ID.
    #[serde(default)]
    pub clarity_id: Option<String>,
    #[serde(default)]
    pub details: StoreDetails,
}

/// Outcome of a save.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SaveSettingsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveSettingsResponse {
    const fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(Self {
                success: false,
                error: Some(error.into()),
            }),
        )
            .into_response()
    }
}

/// Query of `GET /api/snippet`.
#[derive(Debug, Default, Deserialize)]
pub struct SnippetQuery {
    /// Preview with this ID instead of the stored one.
    pub tracking_id: Option<String>,
    /// `events` for one subscription per selected event.
    pub mode: Option<String>,
}

// =============================================================================
// Routes
// =============================================================================

/// Current settings and embed status.
#[instrument(skip(state, ctx), fields(shop = %ctx.shop))]
pub async fn get_settings(
    State(state): State<AppState>,
    RequireShop(ctx): RequireShop,
) -> Result<Json<SettingsView>, AppError> {
    let view = state.settings().load(&ctx).await?;
    Ok(Json(view))
}

/// Validate and persist the submitted settings.
#[instrument(skip(state, ctx, payload), fields(shop = %ctx.shop))]
pub async fn save_settings(
    State(state): State<AppState>,
    RequireShop(ctx): RequireShop,
    payload: Result<Json<SaveSettingsRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return SaveSettingsResponse::failed(rejection.body_text()),
    };

    let mut form = SettingsForm::new(None, request.details);
    form.set_tracking_id(request.clarity_id.unwrap_or_default());
    let submission = match form.submission() {
        Ok(submission) => submission,
        Err(e) => return SaveSettingsResponse::failed(e.to_string()),
    };

    match state.settings().save(&ctx, submission).await {
        Ok(_) => Json(SaveSettingsResponse::ok()).into_response(),
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            warn!(error = %e, sentry_event_id = %event_id, "Settings save failed");
            SaveSettingsResponse::failed(SAVE_FAILED_MESSAGE)
        }
    }
}

/// Custom pixel code for the stored (or previewed) tracking ID.
#[instrument(skip(state, ctx, query), fields(shop = %ctx.shop))]
pub async fn get_snippet(
    State(state): State<AppState>,
    RequireShop(ctx): RequireShop,
    Query(query): Query<SnippetQuery>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.settings().record(&ctx).await?;

    let tracking_id = match query.tracking_id.as_deref() {
        Some(raw) => TrackingId::parse_optional(raw)
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => record.as_ref().and_then(|r| r.tracking_id.clone()),
    };

    let code = match query.mode.as_deref() {
        Some("events") => {
            let events = record.map(|r| r.details.events()).unwrap_or_default();
            snippet::generate_for_events(tracking_id.as_ref(), &events)
        }
        Some("checkout") | None => snippet::generate(tracking_id.as_ref()),
        Some(other) => {
            return Err(AppError::BadRequest(format!("unknown snippet mode: {other}")));
        }
    };

    Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], code))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(get_settings).post(save_settings))
        .route("/api/snippet", get(get_snippet))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[test]
    fn test_request_accepts_page_payload() {
        let request: SaveSettingsRequest = serde_json::from_str(
            r#"{"clarityId":"k2x9abc1de","details":{"appInstalled":true,"selectedEvents":{"search":false}}}"#,
        )
        .unwrap();

        assert_eq!(request.clarity_id.as_deref(), Some("k2x9abc1de"));
        assert_eq!(request.details.app_installed, Some(true));
        assert!(!request.details.events().search);
        assert!(request.details.events().purchase);
    }

    #[test]
    fn test_request_defaults() {
        let request: SaveSettingsRequest = serde_json::from_str("{}").unwrap();
        assert!(request.clarity_id.is_none());
        assert_eq!(request.details, StoreDetails::default());

        let request: SaveSettingsRequest =
            serde_json::from_str(r#"{"clarityId":null,"details":{}}"#).unwrap();
        assert!(request.clarity_id.is_none());
    }

    #[test]
    fn test_success_response_shape() {
        let json = serde_json::to_value(SaveSettingsResponse::ok()).unwrap();
        assert_eq!(json, serde_json::json!({"success": true}));
    }

    #[tokio::test]
    async fn test_failed_response_shape() {
        let response = SaveSettingsResponse::failed("bad id");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "bad id"}));
    }
}
