//! Load/save behaviour of the settings synchronizer against in-memory storage
//! and scripted themes.

#![allow(clippy::unwrap_used)]

use clarity_pixel_app::config::DEFAULT_EMBED_MARKER;
use clarity_pixel_app::db::{InMemoryStoreRepository, StoreRepository};
use clarity_pixel_app::services::{SettingsError, SettingsSynchronizer};
use clarity_pixel_core::{
    SettingsForm, SettingsSubmission, ShopDomain, StoreDetails, StoreRecord, TrackedEvent,
    TrackingId,
};
use clarity_pixel_integration_tests::{
    FailingStore, FakeThemes, SETTINGS_WITH_EMBED, SETTINGS_WITHOUT_EMBED, ThemeFixture, shop,
    shop_context,
};
use serde_json::json;

fn submission(tracking_id: Option<&str>, details: StoreDetails) -> SettingsSubmission {
    SettingsSubmission {
        tracking_id: tracking_id.map(|id| TrackingId::parse(id).unwrap()),
        details,
    }
}

fn details(value: serde_json::Value) -> StoreDetails {
    StoreDetails::from_json(value).unwrap()
}

// ============================================================================
// Round trip and upsert semantics
// ============================================================================

#[tokio::test]
async fn test_save_then_load_round_trip() {
    let store = InMemoryStoreRepository::new();
    let themes = FakeThemes::new(ThemeFixture::SettingsMissing);
    let sync = SettingsSynchronizer::new(&store, &themes, DEFAULT_EMBED_MARKER);
    let ctx = shop_context(&shop());

    let saved = details(json!({
        "shop": "demo.myshopify.com",
        "appInstalled": true,
        "selectedEvents": {"viewCategory": true, "viewItem": false, "search": true,
                           "addToCart": false, "beginCheckout": true, "purchase": true},
        "locale": "en-CA"
    }));

    sync.save(&ctx, submission(Some("abc123"), saved.clone()))
        .await
        .unwrap();
    let view = sync.load(&ctx).await.unwrap();

    assert_eq!(view.tracking_id.unwrap().as_str(), "abc123");
    assert_eq!(view.details, saved);
    assert_eq!(view.details.extra["locale"], "en-CA");
}

#[tokio::test]
async fn test_second_save_replaces_whole_details() {
    let store = InMemoryStoreRepository::new();
    let themes = FakeThemes::new(ThemeFixture::NoMainTheme);
    let sync = SettingsSynchronizer::new(&store, &themes, DEFAULT_EMBED_MARKER);
    let ctx = shop_context(&shop());

    sync.save(
        &ctx,
        submission(
            Some("first"),
            details(json!({"appInstalled": true, "note": "keep me?"})),
        ),
    )
    .await
    .unwrap();
    sync.save(
        &ctx,
        submission(
            Some("second"),
            details(json!({"selectedEvents": {"purchase": false}})),
        ),
    )
    .await
    .unwrap();

    let record = store.find(&shop()).await.unwrap().unwrap();
    assert_eq!(record.tracking_id.unwrap().as_str(), "second");
    assert_eq!(record.details.app_installed, None);
    assert!(!record.details.extra.contains_key("note"));
    assert!(!record.details.events().purchase);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_saving_blank_id_clears_it() {
    let store = InMemoryStoreRepository::new();
    let themes = FakeThemes::new(ThemeFixture::NoMainTheme);
    let sync = SettingsSynchronizer::new(&store, &themes, DEFAULT_EMBED_MARKER);
    let ctx = shop_context(&shop());

    sync.save(&ctx, submission(Some("abc123"), StoreDetails::default()))
        .await
        .unwrap();

    let mut form = SettingsForm::new(Some(&TrackingId::parse("abc123").unwrap()), StoreDetails::default());
    form.set_tracking_id("   ");
    sync.save(&ctx, form.submission().unwrap()).await.unwrap();

    assert!(sync.load(&ctx).await.unwrap().tracking_id.is_none());
}

#[tokio::test]
async fn test_shops_are_isolated() {
    let store = InMemoryStoreRepository::new();
    let themes = FakeThemes::new(ThemeFixture::NoMainTheme);
    let sync = SettingsSynchronizer::new(&store, &themes, DEFAULT_EMBED_MARKER);
    let other = ShopDomain::parse("other-shop.myshopify.com").unwrap();

    sync.save(&shop_context(&shop()), submission(Some("aaa"), StoreDetails::default()))
        .await
        .unwrap();
    sync.save(&shop_context(&other), submission(Some("bbb"), StoreDetails::default()))
        .await
        .unwrap();

    let mine = sync.load(&shop_context(&shop())).await.unwrap();
    let theirs = sync.load(&shop_context(&other)).await.unwrap();
    assert_eq!(mine.tracking_id.unwrap().as_str(), "aaa");
    assert_eq!(theirs.tracking_id.unwrap().as_str(), "bbb");
}

#[tokio::test]
async fn test_first_load_has_no_tracking_id() {
    let store = InMemoryStoreRepository::new();
    let themes = FakeThemes::new(ThemeFixture::NoMainTheme);
    let sync = SettingsSynchronizer::new(&store, &themes, DEFAULT_EMBED_MARKER);

    let view = sync.load(&shop_context(&shop())).await.unwrap();

    assert!(view.tracking_id.is_none());
    assert_eq!(view.details.shop, Some(shop()));
    assert_eq!(view.details.events(), clarity_pixel_core::EventSelection::all());
    assert!(store.is_empty().await);
}

// ============================================================================
// Event toggles
// ============================================================================

#[tokio::test]
async fn test_toggle_twice_with_intermediate_save() {
    let store = InMemoryStoreRepository::new();
    let themes = FakeThemes::new(ThemeFixture::NoMainTheme);
    let sync = SettingsSynchronizer::new(&store, &themes, DEFAULT_EMBED_MARKER);
    let ctx = shop_context(&shop());

    let original = sync.load(&ctx).await.unwrap();
    let mut form = SettingsForm::new(original.tracking_id.as_ref(), original.details.clone());

    assert!(!form.toggle_event(TrackedEvent::BeginCheckout));
    sync.save(&ctx, form.submission().unwrap()).await.unwrap();

    let intermediate = store.find(&shop()).await.unwrap().unwrap();
    assert!(!intermediate.details.events().begin_checkout);
    assert!(intermediate.details.events().purchase);

    assert!(form.toggle_event(TrackedEvent::BeginCheckout));
    assert_eq!(form.events(), original.details.events());
}

// ============================================================================
// Embed detection
// ============================================================================

#[tokio::test]
async fn test_embed_present_with_marker_block() {
    let store = InMemoryStoreRepository::new();
    let themes = FakeThemes::settings(SETTINGS_WITH_EMBED);
    let sync = SettingsSynchronizer::new(&store, &themes, DEFAULT_EMBED_MARKER);

    assert!(sync.load(&shop_context(&shop())).await.unwrap().embed_present);
}

#[tokio::test]
async fn test_embed_present_for_bare_marker_type() {
    let store = InMemoryStoreRepository::new();
    let themes = FakeThemes::settings(
        r#"{"current":{"blocks":{"b1":{"type":"clarity-pixel-block"}}}}"#,
    );
    let sync = SettingsSynchronizer::new(&store, &themes, DEFAULT_EMBED_MARKER);

    assert!(sync.load(&shop_context(&shop())).await.unwrap().embed_present);
}

#[tokio::test]
async fn test_embed_absent_with_unrelated_blocks() {
    let store = InMemoryStoreRepository::new();
    let themes = FakeThemes::settings(SETTINGS_WITHOUT_EMBED);
    let sync = SettingsSynchronizer::new(&store, &themes, DEFAULT_EMBED_MARKER);

    assert!(!sync.load(&shop_context(&shop())).await.unwrap().embed_present);
}

#[tokio::test]
async fn test_no_main_theme_is_not_an_error() {
    let store = InMemoryStoreRepository::new();
    let themes = FakeThemes::new(ThemeFixture::NoMainTheme);
    let sync = SettingsSynchronizer::new(&store, &themes, DEFAULT_EMBED_MARKER);

    let view = sync.load(&shop_context(&shop())).await.unwrap();
    assert!(!view.embed_present);
    assert_eq!(themes.main_theme_calls(), 1);
}

#[tokio::test]
async fn test_theme_failures_degrade_to_absent() {
    for fixture in [
        ThemeFixture::MainThemeFails,
        ThemeFixture::SettingsFails,
        ThemeFixture::SettingsMissing,
        ThemeFixture::Settings("{ not json".to_string()),
        ThemeFixture::Settings(String::new()),
    ] {
        let store = InMemoryStoreRepository::new();
        store
            .insert(StoreRecord::new(
                shop(),
                Some(TrackingId::parse("abc123").unwrap()),
                StoreDetails::default(),
            ))
            .await;
        let themes = FakeThemes::new(fixture.clone());
        let sync = SettingsSynchronizer::new(&store, &themes, DEFAULT_EMBED_MARKER);

        let view = sync.load(&shop_context(&shop())).await.unwrap();
        assert!(!view.embed_present, "{fixture:?}");
        assert_eq!(view.tracking_id.unwrap().as_str(), "abc123", "{fixture:?}");
    }
}

#[tokio::test]
async fn test_custom_marker() {
    let store = InMemoryStoreRepository::new();
    let themes = FakeThemes::settings(SETTINGS_WITHOUT_EMBED);
    let sync = SettingsSynchronizer::new(&store, &themes, "reviews-app");

    assert!(sync.load(&shop_context(&shop())).await.unwrap().embed_present);
}

// ============================================================================
// Persistence failures
// ============================================================================

#[tokio::test]
async fn test_read_failure_is_fatal() {
    let themes = FakeThemes::settings(SETTINGS_WITH_EMBED);
    let sync = SettingsSynchronizer::new(&FailingStore, &themes, DEFAULT_EMBED_MARKER);

    let err = sync.load(&shop_context(&shop())).await.unwrap_err();
    assert!(matches!(err, SettingsError::PersistenceRead(_)));
}

#[tokio::test]
async fn test_write_failure_is_reported() {
    let themes = FakeThemes::new(ThemeFixture::NoMainTheme);
    let sync = SettingsSynchronizer::new(&FailingStore, &themes, DEFAULT_EMBED_MARKER);

    let err = sync
        .save(&shop_context(&shop()), submission(Some("abc123"), StoreDetails::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, SettingsError::PersistenceWrite(_)));
    assert!(err.to_string().starts_with("failed to save store settings"));
}
