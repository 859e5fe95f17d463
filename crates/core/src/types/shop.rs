//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not end with `.myshopify.com`.
    #[error("shop domain must end with {suffix}")]
    InvalidSuffix {
        /// Required suffix.
        suffix: &'static str,
    },
    /// The shop name contains characters outside `[a-z0-9-]`.
    #[error("shop name may only contain lowercase letters, digits and hyphens")]
    InvalidCharacters,
}

/// A Shopify shop domain such as `my-store.myshopify.com`.
///
/// The shop domain is the tenant identifier for everything this app stores.
/// Parsing lowercases and trims the input, so `My-Store.myshopify.com ` and
/// `my-store.myshopify.com` name the same tenant.
///
/// ## Examples
///
/// ```
/// use clarity_pixel_core::ShopDomain;
///
/// let shop = ShopDomain::parse("my-store.myshopify.com").unwrap();
/// assert_eq!(shop.shop_name(), "my-store");
///
/// assert!(ShopDomain::parse("").is_err());
/// assert!(ShopDomain::parse("example.com").is_err());
/// assert!(ShopDomain::parse("bad_name.myshopify.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Domain suffix every shop shares.
    pub const SUFFIX: &'static str = ".myshopify.com";

    /// Maximum length of a shop domain (DNS name limit).
    pub const MAX_LENGTH: usize = 253;

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, lacks the
    /// `.myshopify.com` suffix, or the shop name has invalid characters.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let normalized = s.trim().to_ascii_lowercase();

        if normalized.is_empty() {
            return Err(ShopDomainError::Empty);
        }

        if normalized.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let name = normalized
            .strip_suffix(Self::SUFFIX)
            .ok_or(ShopDomainError::InvalidSuffix {
                suffix: Self::SUFFIX,
            })?;

        let valid_name = !name.is_empty()
            && !name.starts_with('-')
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid_name {
            return Err(ShopDomainError::InvalidCharacters);
        }

        Ok(Self(normalized))
    }

    /// Returns the shop domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ShopDomain` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the shop handle (the part before `.myshopify.com`).
    #[must_use]
    pub fn shop_name(&self) -> &str {
        self.0.strip_suffix(Self::SUFFIX).unwrap_or(&self.0)
    }

    /// Returns an absolute URL into this shop's admin.
    ///
    /// `path` is appended after `/admin/`, e.g. `settings/customer_events`.
    #[must_use]
    pub fn admin_url(&self, path: &str) -> String {
        format!("https://{}/admin/{}", self.0, path.trim_start_matches('/'))
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ShopDomain {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ShopDomain {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ShopDomain {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_domains() {
        assert!(ShopDomain::parse("store.myshopify.com").is_ok());
        assert!(ShopDomain::parse("my-store-2.myshopify.com").is_ok());
        assert!(ShopDomain::parse("123.myshopify.com").is_ok());
    }

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let shop = ShopDomain::parse("  My-Store.MyShopify.com ").unwrap();
        assert_eq!(shop.as_str(), "my-store.myshopify.com");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ShopDomain::parse("   "), Err(ShopDomainError::Empty));
    }

    #[test]
    fn test_parse_wrong_suffix() {
        assert!(matches!(
            ShopDomain::parse("store.example.com"),
            Err(ShopDomainError::InvalidSuffix { .. })
        ));
    }

    #[test]
    fn test_parse_invalid_characters() {
        assert_eq!(
            ShopDomain::parse("my_store.myshopify.com"),
            Err(ShopDomainError::InvalidCharacters)
        );
        assert_eq!(
            ShopDomain::parse(".myshopify.com"),
            Err(ShopDomainError::InvalidCharacters)
        );
        assert_eq!(
            ShopDomain::parse("-store.myshopify.com"),
            Err(ShopDomainError::InvalidCharacters)
        );
        assert_eq!(
            ShopDomain::parse("evil.com/x.myshopify.com"),
            Err(ShopDomainError::InvalidCharacters)
        );
    }

    #[test]
    fn test_shop_name() {
        let shop = ShopDomain::parse("my-store.myshopify.com").unwrap();
        assert_eq!(shop.shop_name(), "my-store");
    }

    #[test]
    fn test_admin_url() {
        let shop = ShopDomain::parse("my-store.myshopify.com").unwrap();
        assert_eq!(
            shop.admin_url("settings/customer_events"),
            "https://my-store.myshopify.com/admin/settings/customer_events"
        );
        assert_eq!(
            shop.admin_url("/themes/current/editor?context=apps"),
            "https://my-store.myshopify.com/admin/themes/current/editor?context=apps"
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ShopDomain = serde_json::from_str("\"store.myshopify.com\"").unwrap();
        assert_eq!(ok.as_str(), "store.myshopify.com");

        let err = serde_json::from_str::<ShopDomain>("\"store.example.com\"");
        assert!(err.is_err());
    }
}
