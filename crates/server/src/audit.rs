//! Per-exchange audit logging.
//!
//! When enabled, every exchange is bound to a generated request id and up
//! to four payload snapshots are collected while the exchange runs. The
//! session is flushed to disk as one JSON document at exchange end and
//! removed from the registry exactly once. Concurrent exchanges hold
//! distinct keys, so per-entry mutation is naturally serialized.

use dashmap::DashMap;
use jiff::{Timestamp, Zoned};
use serde::Serialize;
use serde_json::Value;

use config::DataLoggingConfig;

/// Registry of in-flight exchange snapshots.
pub(crate) struct AuditLog {
    config: DataLoggingConfig,
    sessions: DashMap<String, SessionLog>,
}

/// Everything captured about a single exchange.
#[derive(Debug, Clone, Serialize)]
struct SessionLog {
    request_id: String,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    anthropic_request: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    openai_request: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    openai_response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    anthropic_response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_data: Option<String>,
    is_streaming: bool,
}

/// A fresh `req_<unix-nanos>` exchange identifier.
pub(crate) fn request_id() -> String {
    format!("req_{}", Timestamp::now().as_nanosecond())
}

impl AuditLog {
    pub(crate) fn new(config: DataLoggingConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
        }
    }

    /// Register a new exchange. No-op when logging is disabled.
    pub(crate) fn start_session(&self, request_id: &str) {
        if !self.config.enabled {
            return;
        }

        self.sessions.insert(
            request_id.to_string(),
            SessionLog {
                request_id: request_id.to_string(),
                timestamp: Zoned::now().strftime("%Y-%m-%d %H:%M:%S").to_string(),
                anthropic_request: None,
                openai_request: None,
                openai_response: None,
                anthropic_response: None,
                stream_data: None,
                is_streaming: false,
            },
        );
    }

    pub(crate) fn record_anthropic_request<T: Serialize>(&self, request_id: &str, payload: &T) {
        if self.config.enabled && self.config.log_anthropic_request {
            self.record(request_id, payload, |session, value| session.anthropic_request = value);
        }
    }

    pub(crate) fn record_openai_request<T: Serialize>(&self, request_id: &str, payload: &T) {
        if self.config.enabled && self.config.log_openai_request {
            self.record(request_id, payload, |session, value| session.openai_request = value);
        }
    }

    pub(crate) fn record_openai_response<T: Serialize>(&self, request_id: &str, payload: &T) {
        if self.config.enabled && self.config.log_openai_response {
            self.record(request_id, payload, |session, value| session.openai_response = value);
        }
    }

    pub(crate) fn record_anthropic_response<T: Serialize>(&self, request_id: &str, payload: &T) {
        if self.config.enabled && self.config.log_anthropic_response {
            self.record(request_id, payload, |session, value| session.anthropic_response = value);
        }
    }

    /// Attach the verbatim translated byte stream of a streamed exchange.
    pub(crate) fn record_stream_data(&self, request_id: &str, data: String) {
        if !self.captures_stream() {
            return;
        }

        if let Some(mut session) = self.sessions.get_mut(request_id) {
            session.stream_data = Some(data);
            session.is_streaming = true;
        }
    }

    /// Whether streamed output bytes should be captured at all.
    pub(crate) fn captures_stream(&self) -> bool {
        self.config.enabled && self.config.log_anthropic_response
    }

    /// Flush the session document to disk and drop the registry entry.
    ///
    /// Write failures are logged, never propagated: audit logging must not
    /// fail an exchange that already completed.
    pub(crate) async fn end_session(&self, request_id: &str) {
        if !self.config.enabled {
            return;
        }

        let Some((_, session)) = self.sessions.remove(request_id) else {
            return;
        };

        if let Err(error) = self.flush(&session).await {
            log::error!("Failed to write audit log for {request_id}: {error}");
        }
    }

    fn record<T: Serialize>(&self, request_id: &str, payload: &T, assign: impl FnOnce(&mut SessionLog, Option<Value>)) {
        if let Some(mut session) = self.sessions.get_mut(request_id) {
            assign(&mut session, serde_json::to_value(payload).ok());
        }
    }

    async fn flush(&self, session: &SessionLog) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.config.directory).await?;

        let filename = format!(
            "{}_{}.json",
            Zoned::now().strftime("%Y%m%d_%H%M%S"),
            session.request_id
        );
        let path = self.config.directory.join(filename);

        let document = serde_json::to_vec_pretty(session).map_err(std::io::Error::other)?;
        tokio::fs::write(path, document).await
    }
}
