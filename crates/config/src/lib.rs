//! Janus configuration structures to map the janus.toml configuration.

#![deny(missing_docs)]

mod loader;
mod logging;
mod server;

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

pub use logging::DataLoggingConfig;
pub use server::ServerConfig;

/// Default upstream prefix when no configuration is provided.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Main configuration structure for the janus proxy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the OpenAI-dialect upstream. Requests are sent to
    /// `<openrouter_base_url>/chat/completions`.
    pub openrouter_base_url: String,

    /// HTTP server configuration settings.
    pub server: ServerConfig,

    /// Ordered substring rewrite rules for requested model names.
    ///
    /// The first rule (in configuration-file order) whose key appears as a
    /// substring of the requested model wins. Model names that already
    /// contain a `/` are never rewritten.
    pub model_mappings: IndexMap<String, String>,

    /// Per-exchange audit logging settings.
    pub data_logging: DataLoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openrouter_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            server: ServerConfig::default(),
            model_mappings: IndexMap::new(),
            data_logging: DataLoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    ///
    /// A missing file is not an error: the built-in defaults (including the
    /// default model mappings) are used instead. The `OPENROUTER_BASE_URL`
    /// environment variable overrides the upstream base URL in either case.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }
}
