//! App embed detection in a theme's `config/settings_data.json`.
//!
//! Themes store app embeds as blocks under `current.blocks`, keyed by an
//! opaque id, each with a `type` like
//! `shopify://apps/clarity-pixel/blocks/clarity/0f3c...`. The embed counts as
//! present when any block type contains the configured marker. The block's
//! `disabled` flag is not consulted.

use serde_json::Value;
use thiserror::Error;

/// The theme asset could not be parsed.
#[derive(Debug, Error)]
#[error("theme settings are not valid JSON: {0}")]
pub struct AssetParseError(#[from] serde_json::Error);

/// Whether `raw` settings data contains a block whose type includes `marker`.
///
/// A missing asset (`None`) or one without `current.blocks` has no embed.
///
/// # Errors
///
/// Returns `AssetParseError` if `raw` is present but not JSON.
pub fn contains_embed(raw: Option<&str>, marker: &str) -> Result<bool, AssetParseError> {
    let Some(raw) = raw else {
        return Ok(false);
    };

    let body = strip_leading_comment(raw);
    if body.trim().is_empty() {
        return Ok(false);
    }

    let settings: Value = serde_json::from_str(body)?;
    Ok(block_types(&settings).any(|block_type| block_type.contains(marker)))
}

/// Every block `type` under `current.blocks`.
fn block_types(settings: &Value) -> impl Iterator<Item = &str> {
    settings
        .get("current")
        .and_then(|current| current.get("blocks"))
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|blocks| blocks.values())
        .filter_map(|block| block.get("type").and_then(Value::as_str))
}

/// Shopify prepends a `/* ... */` banner to generated settings files.
fn strip_leading_comment(raw: &str) -> &str {
    let trimmed = raw.trim_start();
    trimmed
        .strip_prefix("/*")
        .and_then(|rest| rest.split_once("*/").map(|(_, after)| after))
        .unwrap_or(trimmed)
}
