use std::{sync::OnceLock, time::Duration};

use reqwest::Client;

/// Common HTTP client so upstream connections are re-used across
/// exchanges. No overall request timeout: streamed completions are
/// long-lived, so only connection establishment is bounded.
pub(crate) fn http_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();

    CLIENT
        .get_or_init(|| {
            Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .pool_idle_timeout(Some(Duration::from_secs(5)))
                .tcp_nodelay(true)
                .tcp_keepalive(Some(Duration::from_secs(60)))
                .build()
                .expect("default HTTP client options are valid")
        })
        .clone()
}
