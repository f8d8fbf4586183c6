//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::collaborators::UserStore;
use crate::config::Config;
use crate::error::ServerError;
use crate::metrics::RunMetrics;
use crate::pipeline::Pipeline;
use crate::providers::{GeminiClient, OpenMeteoSource, SupabaseStore};
use crate::store::MemoryStore;

/// Capacity of each run's event channel.
pub const EVENT_BUFFER: usize = 16;

/// Shared application state.
pub struct AppState {
    /// Pipeline shared by all runs.
    pub pipeline: Arc<Pipeline>,

    /// Store for alert history queries.
    pub store: Arc<dyn UserStore>,

    /// Run counters, also held by the pipeline.
    pub metrics: Arc<RunMetrics>,

    /// SSE keep-alive interval.
    pub keep_alive: Duration,
}

impl AppState {
    /// Create a new AppState wrapped in Arc.
    ///
    /// `store` must be the same store the pipeline logs alerts to.
    pub fn new(pipeline: Pipeline, store: Arc<dyn UserStore>, keep_alive: Duration) -> Arc<Self> {
        let metrics = pipeline.metrics().clone();
        Arc::new(Self {
            pipeline: Arc::new(pipeline),
            store,
            metrics,
            keep_alive,
        })
    }

    /// Wire the production collaborators from configuration.
    pub fn from_config(config: &Config) -> Result<Arc<Self>, ServerError> {
        if config.gemini.api_key.trim().is_empty() {
            return Err(ServerError::Config("Gemini API key is required".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout())
            .build()?;

        let store: Arc<dyn UserStore> = match &config.supabase {
            Some(supabase) => {
                info!(url = %supabase.url, "Using Supabase user store");
                Arc::new(SupabaseStore::new(http.clone(), supabase))
            }
            None => {
                info!("Supabase not configured, using in-memory user store");
                Arc::new(MemoryStore::new())
            }
        };

        let gemini = Arc::new(GeminiClient::new(http.clone(), &config.gemini));
        let pipeline = Pipeline::new(
            Arc::new(OpenMeteoSource::new(http)),
            gemini.clone(),
            gemini,
            store.clone(),
        )
        .with_deadline(config.run_deadline());

        Ok(Self::new(pipeline, store, config.keep_alive()))
    }
}
