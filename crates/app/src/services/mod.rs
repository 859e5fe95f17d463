//! Business logic between the HTTP layer and its collaborators.

pub mod embed;
pub mod settings_sync;

pub use embed::AssetParseError;
pub use settings_sync::{SettingsError, SettingsSynchronizer, SettingsView};
