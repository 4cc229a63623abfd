use chrono::{DateTime, Duration, NaiveTime, Utc};
use metrics::counter;
use serde::Serialize;
use sqlx::PgPool;

use crate::db::fixture_repo;
use crate::errors::JobError;
use crate::models::Fixture;
use crate::providers::team_names::fixture_matches;
use crate::providers::{OddsApiClient, OddsEvent};

/// Provider kickoff times may drift from ours by a few hours.
const KICKOFF_TOLERANCE_HOURS: i64 = 8;
const MAX_UNMATCHED_REPORTED: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct UnmatchedFixture {
    pub kickoff: DateTime<Utc>,
    pub home: String,
    pub away: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MappingSummary {
    pub odds_api_events_fetched: usize,
    pub db_fixtures_in_window: i64,
    pub db_fixtures_checked: usize,
    pub mapped_and_saved: usize,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub unmatched: Vec<UnmatchedFixture>,
    pub note: String,
}

/// Whole UTC days spanning every event's commence time.
pub fn event_window(events: &[OddsEvent]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let min = events.iter().filter_map(|e| e.commence_time).min()?;
    let max = events.iter().filter_map(|e| e.commence_time).max()?;

    let from = min.date_naive().and_time(NaiveTime::MIN).and_utc();
    let to = max.date_naive().and_time(NaiveTime::MIN).and_utc() + Duration::days(1)
        - Duration::milliseconds(1);
    Some((from, to))
}

/// Event for a fixture: same teams with kickoff within the tolerance,
/// else same teams at any time.
pub fn find_event<'a>(fixture: &Fixture, events: &'a [OddsEvent]) -> Option<&'a OddsEvent> {
    let teams_match = |e: &OddsEvent| {
        fixture_matches(
            &fixture.home_team,
            &fixture.away_team,
            e.home_team.as_deref().unwrap_or_default(),
            e.away_team.as_deref().unwrap_or_default(),
        )
    };
    let near_kickoff = |e: &OddsEvent| {
        e.commence_time
            .map(|t| (t - fixture.kickoff_time).num_seconds().abs() <= KICKOFF_TOLERANCE_HOURS * 3600)
            .unwrap_or(false)
    };

    events
        .iter()
        .find(|e| near_kickoff(e) && teams_match(e))
        .or_else(|| events.iter().find(|e| teams_match(e)))
}

/// Link unmapped fixtures to provider events so later passes can look
/// their prices up. An event is never assigned to two fixtures, and a
/// fixture's reference is only ever set once.
pub async fn run_mapping_pass(
    pool: &PgPool,
    client: Option<&OddsApiClient>,
) -> Result<MappingSummary, JobError> {
    let client =
        client.ok_or_else(|| JobError::Config("ODDS_API_KEY is not configured".into()))?;

    let events = client
        .get_odds(None)
        .await
        .map_err(|e| JobError::Upstream(e.to_string()))?;

    let mut summary = MappingSummary {
        odds_api_events_fetched: events.len(),
        ..Default::default()
    };

    let Some((from, to)) = event_window(&events) else {
        summary.note = "No odds events returned.".into();
        return Ok(summary);
    };
    summary.from = Some(from);
    summary.to = Some(to);

    let fixtures = fixture_repo::get_unmapped_in_window(pool, from, to).await?;
    summary.db_fixtures_in_window = fixture_repo::count_in_window(pool, from, to).await?;
    summary.db_fixtures_checked = fixtures.len();

    for fixture in &fixtures {
        let Some(event) = find_event(fixture, &events) else {
            if summary.unmatched.len() < MAX_UNMATCHED_REPORTED {
                summary.unmatched.push(UnmatchedFixture {
                    kickoff: fixture.kickoff_time,
                    home: fixture.home_team.clone(),
                    away: fixture.away_team.clone(),
                    reason: "no_match_found",
                });
            }
            continue;
        };

        match fixture_repo::is_event_mapped(pool, &event.id).await {
            Ok(false) => {}
            Ok(true) => {
                tracing::debug!(fixture_id = %fixture.id, event_id = %event.id, "Event already mapped elsewhere");
                continue;
            }
            Err(e) => {
                tracing::error!(error = %e, event_id = %event.id, "Failed to check event mapping");
                continue;
            }
        }

        match fixture_repo::set_event_reference(pool, fixture.id, &event.id).await {
            Ok(true) => {
                summary.mapped_and_saved += 1;
                counter!("odds_events_mapped_total").increment(1);
                tracing::info!(fixture_id = %fixture.id, event_id = %event.id, "Fixture mapped to odds event");
            }
            Ok(false) => {}
            Err(e) => {
                // Unique index rejects a concurrent mapping of the same event.
                tracing::warn!(error = %e, fixture_id = %fixture.id, event_id = %event.id, "Failed to save event mapping");
            }
        }
    }

    summary.note = if summary.mapped_and_saved > 0 {
        "Mapping succeeded. Next: run lock-odds.".into()
    } else if summary.db_fixtures_in_window == 0 {
        "No fixtures in this date window; import fixtures for this range first.".into()
    } else if summary.db_fixtures_checked == 0 {
        "All fixtures in window are already mapped. Nothing to do.".into()
    } else {
        "No team/time match found for unmapped fixtures. Check unmatched.".into()
    };

    Ok(summary)
}
