//! Microsoft Clarity tracking (project) ID.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`TrackingId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingIdError {
    /// The input string is empty.
    #[error("Clarity ID cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("Clarity ID must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character that may not appear in generated code.
    #[error("Clarity ID contains an invalid character: {0:?}")]
    InvalidCharacter(char),
}

/// A Clarity project ID, e.g. `k2x9abc1de`.
///
/// The ID ends up inside generated JavaScript, so the accepted alphabet is
/// deliberately narrow: ASCII letters, digits, `-` and `_`.
///
/// ## Examples
///
/// ```
/// use clarity_pixel_core::TrackingId;
///
/// assert!(TrackingId::parse("k2x9abc1de").is_ok());
/// assert!(TrackingId::parse("abc\"+alert(1)+\"").is_err());
///
/// // Blank input means "not configured".
/// assert_eq!(TrackingId::parse_optional("  ").unwrap(), None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingId(String);

impl TrackingId {
    /// Maximum length of a tracking ID.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a `TrackingId` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains characters outside `[A-Za-z0-9_-]`.
    pub fn parse(s: &str) -> Result<Self, TrackingIdError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(TrackingIdError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(TrackingIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(TrackingIdError::InvalidCharacter(bad));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Parse user input where blank means "no tracking ID".
    ///
    /// # Errors
    ///
    /// Returns an error if the input is non-blank and fails [`Self::parse`].
    pub fn parse_optional(s: &str) -> Result<Option<Self>, TrackingIdError> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        Self::parse(s).map(Some)
    }

    /// Returns the tracking ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `TrackingId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TrackingId {
    type Err = TrackingIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TrackingId {
    type Error = TrackingIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TrackingId> for String {
    fn from(id: TrackingId) -> Self {
        id.0
    }
}

impl AsRef<str> for TrackingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
