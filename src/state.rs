use chrono::{DateTime, FixedOffset, Utc};

use crate::backend::client::BackendClient;
use crate::backend::inflight::InflightRegistry;
use crate::config::BackendConfig;
use crate::error::AppError;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub backend: BackendClient,
    pub inflight: InflightRegistry,
    pub metrics: Metrics,
    pub utc_offset: FixedOffset,
}

impl AppState {
    pub fn new(backend_config: BackendConfig, utc_offset: FixedOffset) -> Result<Self, AppError> {
        let metrics = Metrics::new();
        let backend = BackendClient::new(backend_config, metrics.clone())?;

        Ok(Self {
            backend,
            inflight: InflightRegistry::new(),
            metrics,
            utc_offset,
        })
    }

    /// Current time on the dashboard's calendar.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.utc_offset)
    }
}
