use std::sync::Arc;

use config::Config;
use translate::ModelMapper;

use crate::{audit::AuditLog, http_client::http_client};

/// Shared, immutable per-process state handed to every exchange.
pub struct ProxyState {
    pub(crate) config: Config,
    pub(crate) mapper: ModelMapper,
    pub(crate) client: reqwest::Client,
    pub(crate) audit: Arc<AuditLog>,
}

impl ProxyState {
    /// Build the proxy state from the loaded configuration.
    pub fn new(config: Config) -> Self {
        let mapper = ModelMapper::new(config.model_mappings.clone());
        let audit = Arc::new(AuditLog::new(config.data_logging.clone()));

        Self {
            config,
            mapper,
            client: http_client(),
            audit,
        }
    }
}
