pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod providers;
pub mod scoring;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use crate::api::rate_limit::RateLimiter;
use crate::config::AppConfig;
use crate::providers::{FootballDataClient, OddsApiClient};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub rate_limiter: Arc<RateLimiter>,
    pub odds_client: Option<OddsApiClient>,
    pub results_client: Option<FootballDataClient>,
}

impl AppState {
    /// Build state from config: provider clients exist only when their API
    /// key is configured.
    pub fn new(
        db: sqlx::PgPool,
        config: AppConfig,
        metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> anyhow::Result<Self> {
        let odds_client = OddsApiClient::from_config(&config)?;
        let results_client = FootballDataClient::from_config(&config)?;
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        ));

        Ok(Self {
            db,
            config,
            metrics_handle,
            rate_limiter,
            odds_client,
            results_client,
        })
    }
}
