//! HMAC signatures on Shopify OAuth redirects and webhooks.

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify the `hmac` parameter of an OAuth redirect.
///
/// `params` are the decoded query pairs. The message is every pair except
/// `hmac` and `signature`, sorted by key and joined as `k=v&k=v`, signed with
/// the API secret and hex-encoded.
#[must_use]
pub fn verify_query_hmac<'a, I>(params: I, api_secret: &str) -> bool
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut provided = None;
    let mut pairs: Vec<(&str, &str)> = Vec::new();

    for (key, value) in params {
        match key {
            "hmac" => provided = Some(value),
            "signature" => {}
            _ => pairs.push((key, value)),
        }
    }

    let Some(provided) = provided else {
        return false;
    };
    let Ok(expected) = hex::decode(provided) else {
        return false;
    };

    pairs.sort_unstable();
    let message = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let Ok(mut mac) = HmacSha256::new_from_slice(api_secret.as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Verify an `X-Shopify-Hmac-Sha256` webhook header against the raw body.
#[must_use]
pub fn verify_webhook_hmac(body: &[u8], header: &str, api_secret: &str) -> bool {
    let Ok(expected) = STANDARD.decode(header.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(api_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
