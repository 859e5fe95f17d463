//! Theme lookups used for app embed detection.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use graphql_client::QueryBody;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{AdminClient, AdminShopifyError, ShopContext};

/// Theme asset holding the app embed configuration.
pub const SETTINGS_DATA_FILENAME: &str = "config/settings_data.json";

const MAIN_THEME_QUERY: &str = r"
query MainTheme {
  themes(first: 1, roles: [MAIN]) {
    nodes {
      id
      name
    }
  }
}
";

const THEME_FILES_QUERY: &str = r"
query ThemeFiles($themeId: ID!, $filenames: [String!]!) {
  theme(id: $themeId) {
    files(filenames: $filenames, first: 1) {
      nodes {
        filename
        body {
          __typename
          ... on OnlineStoreThemeFileBodyText {
            content
          }
          ... on OnlineStoreThemeFileBodyBase64 {
            contentBase64
          }
        }
      }
    }
  }
}
";

/// The published theme of a shop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThemeRef {
    /// Theme GID (e.g., `gid://shopify/OnlineStoreTheme/123`)
    pub id: String,
    /// Merchant-facing theme name
    pub name: String,
}

/// Read access to a shop's themes.
#[async_trait]
pub trait ThemeSource: Send + Sync {
    /// The shop's published (main) theme, if it has one.
    async fn main_theme(&self, ctx: &ShopContext) -> Result<Option<ThemeRef>, AdminShopifyError>;

    /// Raw text of `config/settings_data.json` in `theme`, if present.
    async fn settings_data(
        &self,
        ctx: &ShopContext,
        theme: &ThemeRef,
    ) -> Result<Option<String>, AdminShopifyError>;
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct MainThemeData {
    themes: Nodes<ThemeRef>,
}

#[derive(Debug, Deserialize)]
struct ThemeFilesData {
    theme: Option<ThemeWithFiles>,
}

#[derive(Debug, Deserialize)]
struct ThemeWithFiles {
    files: Option<Nodes<ThemeFile>>,
}

#[derive(Debug, Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ThemeFile {
    filename: String,
    body: ThemeFileBody,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum ThemeFileBody {
    #[serde(rename = "OnlineStoreThemeFileBodyText")]
    Text { content: String },
    #[serde(rename = "OnlineStoreThemeFileBodyBase64")]
    Base64 {
        #[serde(rename = "contentBase64")]
        content_base64: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThemeFilesVariables<'a> {
    theme_id: &'a str,
    filenames: [&'static str; 1],
}

impl ThemeFileBody {
    fn into_text(self) -> Result<Option<String>, AdminShopifyError> {
        match self {
            Self::Text { content } => Ok(Some(content)),
            Self::Base64 { content_base64 } => {
                let bytes = STANDARD.decode(content_base64).map_err(|e| {
                    AdminShopifyError::Unexpected(format!("invalid base64 file body: {e}"))
                })?;
                String::from_utf8(bytes).map(Some).map_err(|e| {
                    AdminShopifyError::Unexpected(format!("file body is not UTF-8: {e}"))
                })
            }
            Self::Other => Ok(None),
        }
    }
}

fn extract_settings_data(data: ThemeFilesData) -> Result<Option<String>, AdminShopifyError> {
    let file = data
        .theme
        .and_then(|theme| theme.files)
        .and_then(|files| {
            files
                .nodes
                .into_iter()
                .find(|file| file.filename == SETTINGS_DATA_FILENAME)
        });

    match file {
        Some(file) => file.body.into_text(),
        None => Ok(None),
    }
}

#[async_trait]
impl ThemeSource for AdminClient {
    #[instrument(skip(self, ctx), fields(shop = %ctx.shop))]
    async fn main_theme(&self, ctx: &ShopContext) -> Result<Option<ThemeRef>, AdminShopifyError> {
        let body = QueryBody {
            variables: serde_json::json!({}),
            query: MAIN_THEME_QUERY,
            operation_name: "MainTheme",
        };

        let data: MainThemeData = self.execute(ctx, &body).await?;
        Ok(data.themes.nodes.into_iter().next())
    }

    #[instrument(skip(self, ctx), fields(shop = %ctx.shop, theme_id = %theme.id))]
    async fn settings_data(
        &self,
        ctx: &ShopContext,
        theme: &ThemeRef,
    ) -> Result<Option<String>, AdminShopifyError> {
        let body = QueryBody {
            variables: ThemeFilesVariables {
                theme_id: &theme.id,
                filenames: [SETTINGS_DATA_FILENAME],
            },
            query: THEME_FILES_QUERY,
            operation_name: "ThemeFiles",
        };

        let data: ThemeFilesData = self.execute(ctx, &body).await?;
        extract_settings_data(data)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_main_theme_response() {
        let data: MainThemeData = serde_json::from_str(
            r#"{"themes":{"nodes":[{"id":"gid://shopify/OnlineStoreTheme/1","name":"Dawn"}]}}"#,
        )
        .unwrap();

        let theme = data.themes.nodes.into_iter().next().unwrap();
        assert_eq!(theme.id, "gid://shopify/OnlineStoreTheme/1");
        assert_eq!(theme.name, "Dawn");
    }

    #[test]
    fn test_text_body() {
        let data: ThemeFilesData = serde_json::from_value(serde_json::json!({
            "theme": {"files": {"nodes": [{
                "filename": "config/settings_data.json",
                "body": {"__typename": "OnlineStoreThemeFileBodyText", "content": "{\"current\":{}}"}
            }]}}
        }))
        .unwrap();

        assert_eq!(
            extract_settings_data(data).unwrap().as_deref(),
            Some("{\"current\":{}}")
        );
    }

    #[test]
    fn test_base64_body() {
        let encoded = STANDARD.encode("{\"current\":{}}");
        let data: ThemeFilesData = serde_json::from_value(serde_json::json!({
            "theme": {"files": {"nodes": [{
                "filename": "config/settings_data.json",
                "body": {"__typename": "OnlineStoreThemeFileBodyBase64", "contentBase64": encoded}
            }]}}
        }))
        .unwrap();

        assert_eq!(
            extract_settings_data(data).unwrap().as_deref(),
            Some("{\"current\":{}}")
        );
    }

    #[test]
    fn test_missing_theme_or_file() {
        let data: ThemeFilesData = serde_json::from_str(r#"{"theme":null}"#).unwrap();
        assert_eq!(extract_settings_data(data).unwrap(), None);

        let data: ThemeFilesData =
            serde_json::from_str(r#"{"theme":{"files":{"nodes":[]}}}"#).unwrap();
        assert_eq!(extract_settings_data(data).unwrap(), None);
    }

    #[test]
    fn test_url_body_is_ignored() {
        let data: ThemeFilesData = serde_json::from_value(serde_json::json!({
            "theme": {"files": {"nodes": [{
                "filename": "config/settings_data.json",
                "body": {"__typename": "OnlineStoreThemeFileBodyUrl"}
            }]}}
        }))
        .unwrap();

        assert_eq!(extract_settings_data(data).unwrap(), None);
    }
}
