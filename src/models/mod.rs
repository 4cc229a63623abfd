pub mod fixture;
pub mod leaderboard;
pub mod prediction;

pub use fixture::{Fixture, FixtureStatus};
pub use leaderboard::{LeaderboardEntry, LeaderboardPage, LeaderboardRow, UserAggregate};
pub use prediction::{Prediction, PredictionRequest};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Pick
// ---------------------------------------------------------------------------

/// Outcome class of a match or a forecast: home win, draw or away win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pick {
    #[serde(rename = "H")]
    Home,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "A")]
    Away,
}

impl Pick {
    pub const ALL: [Pick; 3] = [Pick::Home, Pick::Draw, Pick::Away];

    /// Parse a pick from any of the accepted spellings: letters (`H`/`D`/`A`),
    /// words (`home`, `draw`, `away_win`, ...) or 1X2 notation, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        match normalized.as_str() {
            "h" | "home" | "homewin" | "1" => Some(Pick::Home),
            "d" | "draw" | "x" | "tie" => Some(Pick::Draw),
            "a" | "away" | "awaywin" | "2" => Some(Pick::Away),
            _ => None,
        }
    }

    /// Storage form used in the `predictions.pick` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pick::Home => "H",
            Pick::Draw => "D",
            Pick::Away => "A",
        }
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Scoreline
// ---------------------------------------------------------------------------

/// Goals for each side, either a forecast or a final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreline {
    pub home: i32,
    pub away: i32,
}

impl Scoreline {
    pub fn new(home: i32, away: i32) -> Self {
        Self { home, away }
    }

    /// The single place a scoreline is turned into an outcome class. Submission
    /// validation, settlement scoring and the points preview all go through here.
    pub fn outcome(&self) -> Pick {
        if self.home > self.away {
            Pick::Home
        } else if self.away > self.home {
            Pick::Away
        } else {
            Pick::Draw
        }
    }

    pub fn is_valid(&self) -> bool {
        self.home >= 0 && self.away >= 0
    }
}

impl fmt::Display for Scoreline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

// ---------------------------------------------------------------------------
// ThreeWayOdds
// ---------------------------------------------------------------------------

/// Decimal prices for the home/draw/away market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreeWayOdds {
    pub home: Decimal,
    pub draw: Decimal,
    pub away: Decimal,
}

impl ThreeWayOdds {
    /// Build from three optional legs; `None` unless all three are present.
    pub fn from_legs(
        home: Option<Decimal>,
        draw: Option<Decimal>,
        away: Option<Decimal>,
    ) -> Option<Self> {
        Some(Self {
            home: home?,
            draw: draw?,
            away: away?,
        })
    }

    pub fn all_positive(&self) -> bool {
        [self.home, self.draw, self.away]
            .iter()
            .all(|o| *o > Decimal::ZERO)
    }

    pub fn for_pick(&self, pick: Pick) -> Decimal {
        match pick {
            Pick::Home => self.home,
            Pick::Draw => self.draw,
            Pick::Away => self.away,
        }
    }
}
