use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Scoreline, ThreeWayOdds};

// ---------------------------------------------------------------------------
// Odds API (v4 sports odds)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OddsOutcome {
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OddsMarket {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<OddsOutcome>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Bookmaker {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub markets: Vec<OddsMarket>,
}

impl Bookmaker {
    /// Human label stored with a snapshot: title, else key.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OddsEvent {
    pub id: String,
    #[serde(default)]
    pub sport_key: Option<String>,
    #[serde(default)]
    pub commence_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

/// A complete three-way price and the bookmaker it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub odds: ThreeWayOdds,
    pub bookmaker: String,
}

impl OddsEvent {
    /// First bookmaker in `preferred` order (keys compared case-insensitively),
    /// else the first bookmaker listed.
    pub fn preferred_bookmaker(&self, preferred: &[String]) -> Option<&Bookmaker> {
        preferred
            .iter()
            .find_map(|pref| {
                self.bookmakers
                    .iter()
                    .find(|b| b.key.eq_ignore_ascii_case(pref))
            })
            .or_else(|| self.bookmakers.first())
    }

    /// Home/draw/away prices from the bookmaker's h2h market. Outcomes are
    /// named after the event's own team names; `None` unless all three legs
    /// are present with positive prices.
    pub fn h2h_odds(&self, bookmaker: &Bookmaker) -> Option<ThreeWayOdds> {
        let market = bookmaker.markets.iter().find(|m| m.key == "h2h")?;
        let home_team = self.home_team.as_deref()?;
        let away_team = self.away_team.as_deref()?;

        let price_of = |pred: &dyn Fn(&OddsOutcome) -> bool| {
            market
                .outcomes
                .iter()
                .find(|o| pred(o))
                .and_then(|o| price_decimal(o.price))
        };

        ThreeWayOdds::from_legs(
            price_of(&|o| o.name == home_team),
            price_of(&|o| o.name.eq_ignore_ascii_case("draw")),
            price_of(&|o| o.name == away_team),
        )
    }

    /// Quote from the preferred bookmaker. Other bookmakers are not tried
    /// when the chosen one has an incomplete market.
    pub fn preferred_quote(&self, preferred: &[String]) -> Option<Quote> {
        let bookmaker = self.preferred_bookmaker(preferred)?;
        let odds = self.h2h_odds(bookmaker)?;
        Some(Quote {
            odds,
            bookmaker: bookmaker.label().to_string(),
        })
    }
}

/// Decimal price from the provider's float, trimmed to three places.
pub fn price_decimal(price: f64) -> Option<Decimal> {
    Decimal::from_f64(price)
        .map(|d| d.round_dp(3))
        .filter(|d| *d > Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Football-Data (v4 competition matches)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FdTeam {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FdGoals {
    #[serde(default)]
    pub home: Option<i32>,
    #[serde(default)]
    pub away: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FdScore {
    #[serde(default, rename = "fullTime")]
    pub full_time: FdGoals,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FdMatch {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, rename = "utcDate")]
    pub utc_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "homeTeam")]
    pub home_team: FdTeam,
    #[serde(rename = "awayTeam")]
    pub away_team: FdTeam,
    #[serde(default)]
    pub score: FdScore,
}

impl FdMatch {
    pub fn is_finished(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("FINISHED"))
            .unwrap_or(false)
    }

    pub fn full_time_score(&self) -> Option<Scoreline> {
        let goals = &self.score.full_time;
        Some(Scoreline::new(goals.home?, goals.away?))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FdMatchesResponse {
    #[serde(default)]
    pub matches: Vec<FdMatch>,
}
