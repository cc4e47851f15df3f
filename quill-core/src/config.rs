//! Tables of `quill.toml`. Every table and key is optional.

use serde::{Deserialize, Serialize};

use crate::block::DEFAULT_AD_SLOT;
use crate::preview::DEFAULT_THEME;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    /// Ad network slot written into new ad blocks.
    pub ad_slot: String,
    pub default_language: String,
    pub default_image_width: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            ad_slot: DEFAULT_AD_SLOT.to_string(),
            default_language: "javascript".to_string(),
            default_image_width: 100,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PreviewConfig {
    pub title: String,
    pub syntax_theme: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            title: "Content Preview".to_string(),
            syntax_theme: DEFAULT_THEME.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Base URL of the remote execution service.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub api_host: Option<String>,
    /// Interpreter used for local JavaScript runs.
    pub node_binary: String,
    pub local_timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://judge0-ce.p.rapidapi.com".to_string(),
            api_key: None,
            api_host: Some("judge0-ce.p.rapidapi.com".to_string()),
            node_binary: "node".to_string(),
            local_timeout_ms: 5000,
        }
    }
}
