use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Pick, Scoreline, ThreeWayOdds};

/// Lifecycle of a fixture. Transitions only from `Scheduled` to `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
    Scheduled,
    Finished,
}

impl FixtureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixtureStatus::Scheduled => "scheduled",
            FixtureStatus::Finished => "finished",
        }
    }
}

/// Database row for the fixtures table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Fixture {
    pub id: Uuid,
    pub season: String,
    pub gameweek: Option<i32>,
    pub home_team: String,
    pub away_team: String,
    pub kickoff_time: DateTime<Utc>,
    pub status: String,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
    pub odds_api_event_id: Option<String>,
    pub odds_home_current: Option<Decimal>,
    pub odds_draw_current: Option<Decimal>,
    pub odds_away_current: Option<Decimal>,
    pub odds_current_bookmaker: Option<String>,
    pub odds_current_updated_at: Option<DateTime<Utc>>,
    pub odds_home: Option<Decimal>,
    pub odds_draw: Option<Decimal>,
    pub odds_away: Option<Decimal>,
    pub odds_bookmaker: Option<String>,
    pub odds_locked_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Fixture {
    pub fn is_finished(&self) -> bool {
        self.status == FixtureStatus::Finished.as_str()
    }

    pub fn is_locked(&self) -> bool {
        self.odds_locked_at.is_some()
    }

    pub fn final_score(&self) -> Option<Scoreline> {
        Some(Scoreline::new(self.home_goals?, self.away_goals?))
    }

    /// Current (pre-lock) snapshot, only when all three legs are known.
    pub fn current_odds(&self) -> Option<ThreeWayOdds> {
        ThreeWayOdds::from_legs(
            self.odds_home_current,
            self.odds_draw_current,
            self.odds_away_current,
        )
    }

    pub fn locked_odds(&self) -> Option<ThreeWayOdds> {
        ThreeWayOdds::from_legs(self.odds_home, self.odds_draw, self.odds_away)
    }

    fn current_leg(&self, pick: Pick) -> Option<Decimal> {
        match pick {
            Pick::Home => self.odds_home_current,
            Pick::Draw => self.odds_draw_current,
            Pick::Away => self.odds_away_current,
        }
    }

    fn locked_leg(&self, pick: Pick) -> Option<Decimal> {
        match pick {
            Pick::Home => self.odds_home,
            Pick::Draw => self.odds_draw,
            Pick::Away => self.odds_away,
        }
    }

    /// Odds used at settlement when a prediction never captured a price:
    /// the last current snapshot for the pick, else the locked price.
    /// Non-positive prices are treated as absent.
    pub fn settlement_fallback_odds(&self, pick: Pick) -> Option<Decimal> {
        self.current_leg(pick)
            .or_else(|| self.locked_leg(pick))
            .filter(|o| *o > Decimal::ZERO)
    }

    /// Odds captured onto a prediction at submission time: the locked price
    /// when the fixture is already locked, else the current snapshot.
    pub fn submission_odds(&self, pick: Pick) -> Option<Decimal> {
        self.locked_leg(pick)
            .or_else(|| self.current_leg(pick))
            .filter(|o| *o > Decimal::ZERO)
    }

    /// Best price to show before kickoff, same precedence as submission.
    pub fn display_odds(&self) -> Option<ThreeWayOdds> {
        self.locked_odds().or_else(|| self.current_odds())
    }
}
