use std::path::PathBuf;

use serde::Deserialize;

/// Per-exchange audit logging configuration.
///
/// When enabled, every exchange is captured as a single JSON document
/// holding up to four payload snapshots (both request dialects, both
/// response dialects) plus the verbatim translated byte stream for
/// streaming exchanges. Each snapshot is gated by its own flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataLoggingConfig {
    /// Master switch. Off by default.
    pub enabled: bool,

    /// Directory the session documents are written to.
    pub directory: PathBuf,

    /// Capture the incoming Anthropic-dialect request.
    pub log_anthropic_request: bool,

    /// Capture the outgoing OpenAI-dialect request.
    pub log_openai_request: bool,

    /// Capture the buffered OpenAI-dialect response.
    pub log_openai_response: bool,

    /// Capture the Anthropic-dialect response, or for streaming exchanges
    /// the verbatim translated event stream.
    pub log_anthropic_response: bool,
}

impl Default for DataLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from("logs"),
            log_anthropic_request: true,
            log_openai_request: true,
            log_openai_response: true,
            log_anthropic_response: true,
        }
    }
}
