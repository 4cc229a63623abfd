use std::time::Instant;

use chrono::{DateTime, Utc};
use metrics::histogram;
use serde::Serialize;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::errors::JobError;
use crate::providers::OddsApiClient;
use crate::services::{odds_lock, odds_mapping, odds_refresh};

#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    pub step: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepResult {
    fn from_result<T: Serialize>(step: &'static str, result: Result<T, JobError>) -> Self {
        match result {
            Ok(summary) => Self {
                step,
                ok: true,
                summary: serde_json::to_value(summary).ok(),
                error: None,
            },
            Err(e) => {
                tracing::warn!(step, error = %e, "Odds cycle step failed");
                Self {
                    step,
                    ok: false,
                    summary: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub success: bool,
    pub results: Vec<StepResult>,
}

/// Map events, refresh current odds, then lock. Each step runs even when an
/// earlier one failed; `success` is true only when all three succeeded.
pub async fn run_odds_cycle(
    pool: &PgPool,
    client: Option<&OddsApiClient>,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> CycleSummary {
    let started = Instant::now();

    let map = odds_mapping::run_mapping_pass(pool, client).await;
    let refresh = odds_refresh::run_refresh_pass(pool, client, config, now).await;
    let lock = odds_lock::run_lock_pass(pool, client, config, now).await;

    let results = vec![
        StepResult::from_result("map-odds", map),
        StepResult::from_result("refresh-odds", refresh),
        StepResult::from_result("lock-odds", lock),
    ];
    let success = results.iter().all(|r| r.ok);

    histogram!("job_duration_seconds", "job" => "odds_cycle")
        .record(started.elapsed().as_secs_f64());

    CycleSummary { success, results }
}
