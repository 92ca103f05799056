// Configuration module
// Public interface for configuration loading

mod loader;
mod settings;

pub use loader::{apply_env_overrides, load_config, parse_config, API_KEY_ENV, BIND_ENV, CONFIG_ENV};
pub use settings::{Config, ProviderSettings, ServerConfig, StorageConfig};
