use std::path::Path;

use indexmap::IndexMap;

use crate::Config;

/// Environment variable overriding `openrouter_base_url`.
const UPSTREAM_URL_VAR: &str = "OPENROUTER_BASE_URL";

pub(crate) fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();

    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;

        log::info!(
            "Loaded configuration from {} with {} model mappings",
            path.display(),
            config.model_mappings.len()
        );

        config
    } else {
        log::info!(
            "Configuration file {} not found, using default model mappings",
            path.display()
        );

        Config {
            model_mappings: default_model_mappings(),
            ..Config::default()
        }
    };

    if let Ok(base_url) = std::env::var(UPSTREAM_URL_VAR)
        && !base_url.is_empty()
    {
        config.openrouter_base_url = base_url;
    }

    Ok(config)
}

fn default_model_mappings() -> IndexMap<String, String> {
    IndexMap::from([
        ("haiku".to_string(), "anthropic/claude-3.5-haiku".to_string()),
        ("sonnet".to_string(), "anthropic/claude-sonnet-4".to_string()),
        ("opus".to_string(), "anthropic/claude-opus-4".to_string()),
    ])
}
