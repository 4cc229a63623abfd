use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::{fixture_repo, prediction_repo};
use crate::errors::JobError;
use crate::models::{Fixture, ThreeWayOdds};
use crate::providers::{OddsApiClient, OddsEvent};

#[derive(Debug, Clone, Serialize)]
pub struct LockWindow {
    pub lock_from: DateTime<Utc>,
    pub lock_to: DateTime<Utc>,
}

impl LockWindow {
    /// `[now + safety margin, now + horizon]`. The margin keeps a fixture that
    /// is about to kick off out of the pass.
    pub fn starting_at(now: DateTime<Utc>, config: &AppConfig) -> Self {
        Self {
            lock_from: now + Duration::seconds(config.odds_lock_safety_margin_secs),
            lock_to: now + Duration::hours(config.odds_lock_horizon_hours),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LockSummary {
    pub fixtures_considered: usize,
    pub odds_locked: usize,
    pub predictions_snapshotted: u64,
    /// No complete price from the provider or a stored snapshot; retried next pass.
    pub skipped: usize,
    /// Another run locked the fixture first.
    pub already_locked: usize,
    pub failed: usize,
    pub bookmaker_preference: Vec<String>,
    pub window: LockWindow,
    pub note: String,
}

impl LockSummary {
    fn finish_note(&mut self) {
        self.note = if self.failed > 0 {
            format!(
                "Locked odds for {} of {} fixture(s); {} write(s) failed and will be retried.",
                self.odds_locked, self.fixtures_considered, self.failed
            )
        } else if self.odds_locked > 0 {
            format!("Locked odds for {} fixture(s).", self.odds_locked)
        } else if self.skipped > 0 {
            "No complete prices found; skipped fixtures are retried next pass.".into()
        } else {
            "Nothing locked.".into()
        };
    }
}

/// The price a fixture would be locked at, and the bookmaker it came from.
/// `None` bookmaker means the stored current snapshot was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockPrice {
    pub odds: ThreeWayOdds,
    pub bookmaker: Option<String>,
}

/// Prefer the live provider event; otherwise fall back to the fixture's
/// stored current snapshot when all three legs are known.
pub fn resolve_lock_price(
    fixture: &Fixture,
    event: Option<&OddsEvent>,
    preferred: &[String],
) -> Option<LockPrice> {
    event
        .and_then(|e| e.preferred_quote(preferred))
        .filter(|q| q.odds.all_positive())
        .map(|q| LockPrice {
            odds: q.odds,
            bookmaker: Some(q.bookmaker),
        })
        .or_else(|| {
            fixture
                .current_odds()
                .filter(ThreeWayOdds::all_positive)
                .map(|odds| LockPrice {
                    odds,
                    bookmaker: None,
                })
        })
}

/// One lock pass: freeze the three-way price of every mapped, unlocked
/// fixture kicking off inside the lock window, then copy the frozen price
/// onto that fixture's predictions that have none yet.
///
/// Missing credentials or a failed provider fetch abort the pass before any
/// write. Fixtures without a usable price are skipped and retried next pass.
pub async fn run_lock_pass(
    pool: &PgPool,
    client: Option<&OddsApiClient>,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<LockSummary, JobError> {
    let client =
        client.ok_or_else(|| JobError::Config("ODDS_API_KEY is not configured".into()))?;
    let started = Instant::now();

    let window = LockWindow::starting_at(now, config);
    let mut summary = LockSummary {
        fixtures_considered: 0,
        odds_locked: 0,
        predictions_snapshotted: 0,
        skipped: 0,
        already_locked: 0,
        failed: 0,
        bookmaker_preference: config.preferred_bookmakers.clone(),
        window,
        note: String::new(),
    };

    let fixtures =
        fixture_repo::get_lock_candidates(pool, summary.window.lock_from, summary.window.lock_to)
            .await?;
    summary.fixtures_considered = fixtures.len();

    if fixtures.is_empty() {
        summary.note = format!(
            "No fixtures kicking off in the next {}h.",
            config.odds_lock_horizon_hours
        );
        histogram!("job_duration_seconds", "job" => "odds_lock")
            .record(started.elapsed().as_secs_f64());
        return Ok(summary);
    }

    let events = client
        .get_odds(None)
        .await
        .map_err(|e| JobError::Upstream(e.to_string()))?;
    let by_id: HashMap<&str, &OddsEvent> = events.iter().map(|e| (e.id.as_str(), e)).collect();

    for fixture in &fixtures {
        let event = fixture
            .odds_api_event_id
            .as_deref()
            .and_then(|id| by_id.get(id).copied());

        let Some(price) = resolve_lock_price(fixture, event, &config.preferred_bookmakers) else {
            tracing::info!(fixture_id = %fixture.id, "No complete price available, skipping lock");
            counter!("odds_lock_skipped_total").increment(1);
            summary.skipped += 1;
            continue;
        };

        let locked_at = Utc::now();
        match fixture_repo::lock_odds(
            pool,
            fixture.id,
            &price.odds,
            price.bookmaker.as_deref(),
            locked_at,
        )
        .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(fixture_id = %fixture.id, "Fixture already locked by another run");
                summary.already_locked += 1;
                continue;
            }
            Err(e) => {
                tracing::error!(error = %e, fixture_id = %fixture.id, "Failed to lock odds");
                summary.failed += 1;
                continue;
            }
        }

        summary.odds_locked += 1;
        counter!("odds_fixtures_locked_total").increment(1);
        tracing::info!(
            fixture_id = %fixture.id,
            home = %price.odds.home,
            draw = %price.odds.draw,
            away = %price.odds.away,
            bookmaker = price.bookmaker.as_deref().unwrap_or("stored snapshot"),
            "Odds locked"
        );

        match prediction_repo::snapshot_locked_odds(pool, fixture.id, &price.odds).await {
            Ok(n) => {
                summary.predictions_snapshotted += n;
                counter!("odds_predictions_snapshotted_total").increment(n);
            }
            Err(e) => {
                // The fixture is locked; settlement falls back to its prices.
                tracing::error!(error = %e, fixture_id = %fixture.id, "Failed to snapshot locked odds");
                summary.failed += 1;
            }
        }
    }

    summary.finish_note();

    histogram!("job_duration_seconds", "job" => "odds_lock")
        .record(started.elapsed().as_secs_f64());

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixture::test_support::blank_fixture;
    use crate::providers::types::{Bookmaker, OddsMarket, OddsOutcome};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn event(home: f64, draw: Option<f64>, away: f64) -> OddsEvent {
        let mut outcomes = vec![
            OddsOutcome { name: "Arsenal".into(), price: home },
            OddsOutcome { name: "Chelsea".into(), price: away },
        ];
        if let Some(d) = draw {
            outcomes.push(OddsOutcome { name: "Draw".into(), price: d });
        }
        OddsEvent {
            id: "evt1".into(),
            sport_key: None,
            commence_time: None,
            home_team: Some("Arsenal".into()),
            away_team: Some("Chelsea".into()),
            bookmakers: vec![Bookmaker {
                key: "skybet".into(),
                title: Some("Sky Bet".into()),
                markets: vec![OddsMarket { key: "h2h".into(), outcomes }],
            }],
        }
    }

    fn prefs() -> Vec<String> {
        vec!["bet365".into(), "skybet".into()]
    }

    #[test]
    fn test_lock_window() {
        let now = Utc.with_ymd_and_hms(2026, 2, 5, 20, 0, 0).unwrap();
        let config = AppConfig::for_database("postgres://unused");
        let window = LockWindow::starting_at(now, &config);
        assert_eq!(window.lock_from, now + Duration::seconds(60));
        assert_eq!(window.lock_to, now + Duration::hours(24));
    }

    #[test]
    fn test_live_event_price_preferred() {
        let mut fixture = blank_fixture();
        fixture.odds_home_current = Some(Decimal::new(19, 1));
        fixture.odds_draw_current = Some(Decimal::new(33, 1));
        fixture.odds_away_current = Some(Decimal::new(40, 1));

        let price = resolve_lock_price(&fixture, Some(&event(2.1, Some(3.4), 3.75)), &prefs()).unwrap();
        assert_eq!(price.odds.home, Decimal::new(21, 1));
        assert_eq!(price.bookmaker.as_deref(), Some("Sky Bet"));
    }

    #[test]
    fn test_falls_back_to_current_snapshot() {
        let mut fixture = blank_fixture();
        fixture.odds_home_current = Some(Decimal::new(19, 1));
        fixture.odds_draw_current = Some(Decimal::new(33, 1));
        fixture.odds_away_current = Some(Decimal::new(40, 1));

        // Event missing entirely.
        let price = resolve_lock_price(&fixture, None, &prefs()).unwrap();
        assert_eq!(price.odds.draw, Decimal::new(33, 1));
        assert_eq!(price.bookmaker, None);

        // Event present but its market lacks a draw price.
        let price = resolve_lock_price(&fixture, Some(&event(2.1, None, 3.75)), &prefs()).unwrap();
        assert_eq!(price.odds.home, Decimal::new(19, 1));
        assert_eq!(price.bookmaker, None);
    }

    #[test]
    fn test_no_price_anywhere() {
        let mut fixture = blank_fixture();
        fixture.odds_home_current = Some(Decimal::new(19, 1));
        fixture.odds_draw_current = None;
        fixture.odds_away_current = Some(Decimal::new(40, 1));

        assert!(resolve_lock_price(&fixture, None, &prefs()).is_none());
        assert!(resolve_lock_price(&fixture, Some(&event(2.1, None, 3.75)), &prefs()).is_none());
    }

    #[test]
    fn test_non_positive_snapshot_rejected() {
        let mut fixture = blank_fixture();
        fixture.odds_home_current = Some(Decimal::ZERO);
        fixture.odds_draw_current = Some(Decimal::new(33, 1));
        fixture.odds_away_current = Some(Decimal::new(40, 1));

        assert!(resolve_lock_price(&fixture, None, &prefs()).is_none());
    }

    fn summary() -> LockSummary {
        let now = Utc.with_ymd_and_hms(2026, 2, 5, 20, 0, 0).unwrap();
        LockSummary {
            fixtures_considered: 2,
            odds_locked: 0,
            predictions_snapshotted: 0,
            skipped: 0,
            already_locked: 0,
            failed: 0,
            bookmaker_preference: prefs(),
            window: LockWindow::starting_at(now, &AppConfig::for_database("postgres://unused")),
            note: String::new(),
        }
    }

    #[test]
    fn test_note_reports_failed_writes() {
        let mut s = summary();
        s.failed = 2;
        s.finish_note();
        assert_ne!(s.note, "Nothing locked.");
        assert_eq!(s.note, "Locked odds for 0 of 2 fixture(s); 2 write(s) failed and will be retried.");

        let mut s = summary();
        s.odds_locked = 1;
        s.skipped = 1;
        s.failed = 1;
        s.finish_note();
        assert!(s.note.contains("1 write(s) failed"));
    }

    #[test]
    fn test_note_without_failures() {
        let mut s = summary();
        s.finish_note();
        assert_eq!(s.note, "Nothing locked.");

        s.skipped = 2;
        s.finish_note();
        assert!(s.note.starts_with("No complete prices found"));

        s.odds_locked = 1;
        s.finish_note();
        assert_eq!(s.note, "Locked odds for 1 fixture(s).");
    }
}
