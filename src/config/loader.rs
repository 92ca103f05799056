// Configuration loader
// Loads settings from a TOML file, then applies environment overrides

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::settings::Config;

pub const CONFIG_ENV: &str = "MINDMITRA_CONFIG";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const BIND_ENV: &str = "MINDMITRA_BIND";

/// Load configuration
///
/// The file is `path` if given, else `$MINDMITRA_CONFIG`, else
/// `~/.mindmitra/config.toml` when it exists. Without any file the
/// defaults are used. `GEMINI_API_KEY` and `MINDMITRA_BIND` override the
/// file.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let explicit = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    let mut config = match explicit {
        Some(path) => read_config_file(&path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => read_config_file(&path)?,
            _ => Config::default(),
        },
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate(&config)?;

    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mindmitra/config.toml"))
}

fn read_config_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = parse_config(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Parse TOML configuration text
pub fn parse_config(contents: &str) -> Result<Config> {
    Ok(toml::from_str(contents)?)
}

/// Overlay non-empty environment values onto `config`
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(api_key) = non_empty(API_KEY_ENV) {
        config.provider.api_key = api_key;
    }
    if let Some(bind) = non_empty(BIND_ENV) {
        config.server.bind_address = bind;
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.provider.api_key.trim().is_empty() {
        bail!(
            "No API key configured for the text-generation provider.\n\n\
            Set it in ~/.mindmitra/config.toml:\n\n\
            [provider]\n\
            api_key = \"...\"\n\n\
            or export {}=\"...\"",
            API_KEY_ENV
        );
    }
    if config.server.auth_tokens.is_empty() {
        tracing::warn!("No auth tokens configured; every request will be unauthenticated");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use std::collections::HashMap;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            crisis_keywords_path = "/etc/mindmitra/keywords.json"

            [provider]
            api_key = "file-key"
            model = "gemini-1.5-flash"
            timeout_secs = 10

            [server]
            bind_address = "0.0.0.0:9000"
            cors_enabled = true

            [server.auth_tokens]
            "token-1" = "user-1"

            [storage]
            backend = "file"
            data_dir = "/var/lib/mindmitra"
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.provider, "gemini");
        assert_eq!(config.provider.api_key, "file-key");
        assert_eq!(config.provider.model, "gemini-1.5-flash");
        assert_eq!(config.provider.timeout_secs, 10);
        assert_eq!(config.server.bind_address, "0.0.0.0:9000");
        assert!(config.server.cors_enabled);
        assert_eq!(config.server.auth_tokens.get("token-1").map(String::as_str), Some("user-1"));
        assert_eq!(
            config.storage,
            StorageConfig::File {
                data_dir: PathBuf::from("/var/lib/mindmitra")
            }
        );
        assert!(config.crisis_keywords_path.is_some());
    }

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = parse_config("[storage]\nbackend = \"memory\"\n").unwrap();

        assert_eq!(config.provider.model, "gemini-pro");
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.storage, StorageConfig::Memory);
        assert!(config.provider.api_key.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = parse_config("[provider]\napi_key = \"file-key\"\n").unwrap();
        let env = HashMap::from([
            (API_KEY_ENV, "env-key".to_string()),
            (BIND_ENV, "  ".to_string()),
        ]);

        apply_env_overrides(&mut config, |name| env.get(name).cloned());

        assert_eq!(config.provider.api_key, "env-key");
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let config = Config::default();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let result = load_config(Some(Path::new("/nonexistent/mindmitra.toml")));
        assert!(result.is_err());
    }
}
