use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use metrics::counter;
use serde::Serialize;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::fixture_repo;
use crate::errors::JobError;
use crate::models::Fixture;
use crate::providers::team_names::team_matches;
use crate::providers::{FdMatch, FootballDataClient};

#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub api_matches: usize,
    pub db_fixtures_in_range: usize,
    pub updated: usize,
    pub failed: usize,
    pub note: String,
}

/// Default sync window: three days ago through tomorrow.
pub fn default_window(now: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
    let today = now.date_naive();
    (today - Duration::days(3), today + Duration::days(1))
}

fn same_kickoff_hour(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive() && a.hour() == b.hour()
}

/// Our fixture for a provider match: same kickoff hour and both teams match.
pub fn find_fixture<'a>(m: &FdMatch, fixtures: &'a [Fixture]) -> Option<&'a Fixture> {
    let kickoff = m.utc_date?;
    let home = m.home_team.name.as_deref().unwrap_or_default();
    let away = m.away_team.name.as_deref().unwrap_or_default();

    fixtures.iter().find(|f| {
        same_kickoff_hour(f.kickoff_time, kickoff)
            && team_matches(&f.home_team, home)
            && team_matches(&f.away_team, away)
    })
}

/// Copy finished status and full-time scores from the result provider.
/// Does not settle predictions.
pub async fn sync_results(
    pool: &PgPool,
    client: Option<&FootballDataClient>,
    config: &AppConfig,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<SyncSummary, JobError> {
    let client = client
        .ok_or_else(|| JobError::Config("FOOTBALL_DATA_API_KEY is not configured".into()))?;

    if date_from > date_to {
        return Err(JobError::Invariant(format!(
            "dateFrom {date_from} is after dateTo {date_to}"
        )));
    }

    let matches = client
        .get_matches(date_from, date_to)
        .await
        .map_err(|e| JobError::Upstream(e.to_string()))?;

    let from = date_from.and_time(NaiveTime::MIN).and_utc();
    let to = date_to.and_time(NaiveTime::MIN).and_utc() + Duration::days(1) - Duration::seconds(1);
    let fixtures = fixture_repo::get_fixtures_in_range(pool, &config.season, from, to).await?;

    let mut summary = SyncSummary {
        date_from,
        date_to,
        api_matches: matches.len(),
        db_fixtures_in_range: fixtures.len(),
        updated: 0,
        failed: 0,
        note: String::new(),
    };

    for m in &matches {
        let Some(fixture) = find_fixture(m, &fixtures) else {
            continue;
        };

        let finished = m.is_finished();
        let score = m.full_time_score().filter(|s| s.is_valid());

        match fixture_repo::apply_feed_result(pool, fixture.id, finished, score).await {
            Ok(true) => {
                summary.updated += 1;
                counter!("fixtures_results_synced_total").increment(1);
                tracing::debug!(
                    fixture_id = %fixture.id,
                    finished,
                    score = ?score,
                    "Fixture result synced"
                );
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = %e, fixture_id = %fixture.id, "Failed to apply result");
                summary.failed += 1;
            }
        }
    }

    summary.note = format!(
        "Updated {} of {} fixture(s) in range from {} provider match(es).",
        summary.updated, summary.db_fixtures_in_range, summary.api_matches
    );
    tracing::info!(
        updated = summary.updated,
        api_matches = summary.api_matches,
        "Result sync complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixture::test_support::blank_fixture;
    use crate::providers::types::{FdGoals, FdScore, FdTeam};
    use chrono::TimeZone;

    fn fd_match(home: &str, away: &str, at: DateTime<Utc>) -> FdMatch {
        FdMatch {
            id: None,
            utc_date: Some(at),
            status: Some("FINISHED".into()),
            home_team: FdTeam { name: Some(home.into()) },
            away_team: FdTeam { name: Some(away.into()) },
            score: FdScore {
                full_time: FdGoals { home: Some(2), away: Some(1) },
            },
        }
    }

    #[test]
    fn test_default_window() {
        let now = Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap();
        let (from, to) = default_window(now);
        assert_eq!(from, NaiveDate::from_ymd_opt(2026, 2, 7).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2026, 2, 11).unwrap());
    }

    #[test]
    fn test_matches_same_hour_and_teams() {
        let kickoff = Utc.with_ymd_and_hms(2026, 2, 7, 15, 0, 0).unwrap();
        let mut fixture = blank_fixture();
        fixture.kickoff_time = kickoff;
        let fixtures = vec![fixture];

        let m = fd_match("Arsenal FC", "Chelsea FC", kickoff + Duration::minutes(30));
        assert!(find_fixture(&m, &fixtures).is_some());

        let other_hour = fd_match("Arsenal FC", "Chelsea FC", kickoff + Duration::hours(2));
        assert!(find_fixture(&other_hour, &fixtures).is_none());

        let other_teams = fd_match("Everton FC", "Chelsea FC", kickoff);
        assert!(find_fixture(&other_teams, &fixtures).is_none());
    }
}
