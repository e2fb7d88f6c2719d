//! Site configuration module.
//!
//! Loads and validates `config.json` at the site root. The file is a flat JSON
//! object of site-wide template variables:
//!
//! ```json
//! {
//!   "website_name": "my blog",
//!   "website_author": "",
//!   "website_description": "",
//!   "website_keywords": "",
//!   "home_max_posts": 10
//! }
//! ```
//!
//! All keys are optional. Unknown keys are not rejected: they are kept in
//! [`SiteConfig::extra`] and handed to templates as globals, so a custom
//! template can read e.g. `{{ twitter_handle }}`.
//!
//! The config is never merged into shared mutable state. A build assembles one
//! [`SiteGlobals`] value and passes it to every render call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub website_name: String,
    pub website_author: String,
    pub website_description: String,
    pub website_keywords: String,
    /// Number of posts listed on the home page and on each tag page.
    pub home_max_posts: usize,
    /// Any other keys, passed through to templates untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_home_max_posts() -> usize {
    10
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            website_name: String::new(),
            website_author: String::new(),
            website_description: String::new(),
            website_keywords: String::new(),
            home_max_posts: default_home_max_posts(),
            extra: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Stock config for a freshly initialized site called `name`.
    pub fn for_site(name: &str) -> Self {
        Self {
            website_name: name.to_string(),
            ..Self::default()
        }
    }

    /// Load and validate `config.json`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: SiteConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.home_max_posts == 0 {
            return Err(ConfigError::Validation(
                "home_max_posts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Immutable values visible to every template during one build.
#[derive(Debug, Clone, Serialize)]
pub struct SiteGlobals {
    #[serde(flatten)]
    pub config: SiteConfig,
    pub current_year: i32,
}

impl SiteGlobals {
    pub fn new(config: SiteConfig, current_year: i32) -> Self {
        Self {
            config,
            current_year,
        }
    }
}
