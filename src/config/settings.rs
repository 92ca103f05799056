// Configuration structs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::providers::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Text-generation provider
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// JSON file replacing the built-in crisis keyword list
    #[serde(default)]
    pub crisis_keywords_path: Option<PathBuf>,
}

/// Settings for the text-generation provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider name (currently only "gemini")
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Configuration for the HTTP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bearer token → user id
    #[serde(default)]
    pub auth_tokens: HashMap<String, String>,

    /// Allow cross-origin requests from any origin
    #[serde(default)]
    pub cors_enabled: bool,
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            auth_tokens: HashMap::new(),
            cors_enabled: false,
        }
    }
}

/// Document store backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Lost on restart; for development and tests
    Memory,
    /// One JSON file per document under `data_dir`
    File { data_dir: PathBuf },
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join("mindmitra"))
            .unwrap_or_else(|| PathBuf::from("data"));
        StorageConfig::File { data_dir }
    }
}
