use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::fixture_repo;
use crate::errors::JobError;
use crate::providers::{OddsApiClient, OddsEvent};

#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshSummary {
    pub fixtures_considered: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub note: String,
}

/// Update the current-odds snapshot of mapped, unlocked fixtures kicking off
/// within the refresh horizon. Locked fixtures are never touched.
pub async fn run_refresh_pass(
    pool: &PgPool,
    client: Option<&OddsApiClient>,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<RefreshSummary, JobError> {
    let client =
        client.ok_or_else(|| JobError::Config("ODDS_API_KEY is not configured".into()))?;

    let to = now + Duration::hours(config.odds_refresh_horizon_hours);
    let fixtures = fixture_repo::get_refresh_candidates(pool, now, to).await?;

    let mut summary = RefreshSummary {
        fixtures_considered: fixtures.len(),
        ..Default::default()
    };

    if fixtures.is_empty() {
        summary.note = format!(
            "No unlocked, mapped fixtures in the next {}h.",
            config.odds_refresh_horizon_hours
        );
        return Ok(summary);
    }

    let events = client
        .get_odds(Some((now, to)))
        .await
        .map_err(|e| JobError::Upstream(e.to_string()))?;
    let by_id: HashMap<&str, &OddsEvent> = events.iter().map(|e| (e.id.as_str(), e)).collect();

    for fixture in &fixtures {
        let quote = fixture
            .odds_api_event_id
            .as_deref()
            .and_then(|id| by_id.get(id))
            .and_then(|e| e.preferred_quote(&config.preferred_bookmakers));

        let Some(quote) = quote else {
            summary.skipped += 1;
            continue;
        };

        match fixture_repo::update_current_odds(pool, fixture.id, &quote.odds, Some(&quote.bookmaker))
            .await
        {
            Ok(true) => summary.updated += 1,
            // Locked between our read and the write.
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                tracing::error!(error = %e, fixture_id = %fixture.id, "Failed to update current odds");
                summary.failed += 1;
            }
        }
    }

    summary.note = format!(
        "Refreshed current odds for {} of {} fixture(s).",
        summary.updated, summary.fixtures_considered
    );
    tracing::info!(
        updated = summary.updated,
        skipped = summary.skipped,
        failed = summary.failed,
        "Current odds refresh complete"
    );

    Ok(summary)
}
