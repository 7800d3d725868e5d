//! Application configuration. Store location, uploads root, reconciliation policy.

use crate::domain::{CreatorSelection, ReconcileOptions};
use serde::Deserialize;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_UPLOADS_DIR: &str = "./uploads";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Directory holding store.db. Read from USER_CLEANUP_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Uploads root (originals, rescaled/, profilepics/, deleted/).
    /// Read from USER_CLEANUP_UPLOADS_DIR.
    #[serde(default)]
    pub uploads_dir: Option<String>,

    /// Delete conversations left memberless (default true).
    /// Read from USER_CLEANUP_REMOVE_EMPTY_CONVERSATIONS.
    #[serde(default)]
    pub remove_empty_conversations: Option<bool>,

    /// "first" or "random" (default). Read from USER_CLEANUP_NEW_CREATOR_SELECTION.
    #[serde(default)]
    pub new_creator_selection: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        Self::load_from(std::env::var("USER_CLEANUP_CONFIG").ok().as_deref())
    }

    /// Environment plus an optional config file. A malformed value is an error, never a
    /// silent fallback to the defaults.
    pub fn load_from(file: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("USER_CLEANUP").try_parsing(true));
        if let Some(path) = file {
            c = c.add_source(config::File::with_name(path));
        }
        c.build()?.try_deserialize()
    }

    pub fn data_dir_or_default(&self) -> &str {
        self.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR)
    }

    pub fn uploads_dir_or_default(&self) -> &str {
        self.uploads_dir.as_deref().unwrap_or(DEFAULT_UPLOADS_DIR)
    }

    /// Unrecognised selection values fall back to random.
    pub fn reconcile_options(&self) -> ReconcileOptions {
        let defaults = ReconcileOptions::default();
        ReconcileOptions {
            remove_empty_conversations: self
                .remove_empty_conversations
                .unwrap_or(defaults.remove_empty_conversations),
            new_creator_selection: self
                .new_creator_selection
                .as_deref()
                .map(CreatorSelection::from)
                .unwrap_or(defaults.new_creator_selection),
        }
    }
}
