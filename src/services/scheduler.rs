use chrono::Utc;
use sqlx::PgPool;
use tokio::time::{interval, Duration};

use crate::config::AppConfig;
use crate::providers::{FootballDataClient, OddsApiClient};
use crate::services::{odds_cycle, result_sync, settlement};

/// Periodically run the odds cycle (map, refresh, lock).
pub async fn run_odds_poller(pool: PgPool, client: Option<OddsApiClient>, config: AppConfig) {
    let mut ticker = interval(Duration::from_secs(config.odds_job_interval_secs.max(1)));

    loop {
        ticker.tick().await;

        tracing::debug!("Odds poller: running odds cycle");
        let summary = odds_cycle::run_odds_cycle(&pool, client.as_ref(), &config, Utc::now()).await;

        if summary.success {
            tracing::info!(steps = summary.results.len(), "Odds cycle complete");
        } else {
            let failed: Vec<&str> = summary
                .results
                .iter()
                .filter(|r| !r.ok)
                .map(|r| r.step)
                .collect();
            tracing::warn!(failed_steps = ?failed, "Odds cycle finished with failures");
        }
    }
}

/// Periodically sync results and settle the current gameweek.
pub async fn run_results_poller(
    pool: PgPool,
    client: Option<FootballDataClient>,
    config: AppConfig,
) {
    let mut ticker = interval(Duration::from_secs(config.result_sync_interval_secs.max(1)));

    loop {
        ticker.tick().await;

        let (from, to) = result_sync::default_window(Utc::now());
        match result_sync::sync_results(&pool, client.as_ref(), &config, from, to).await {
            Ok(summary) => tracing::info!(updated = summary.updated, "Results synced"),
            Err(e) => {
                // Settlement still runs on whatever results are already stored.
                tracing::error!(error = %e, "Result sync failed");
            }
        }

        match settlement::settle_gameweek(&pool, &config.season, None).await {
            Ok(summary) => tracing::info!(
                gameweek = ?summary.gameweek,
                settled = summary.predictions_settled,
                note = %summary.note,
                "Settlement pass complete"
            ),
            Err(e) => tracing::warn!(error = %e, "Settlement pass skipped"),
        }
    }
}
