use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Pick, Scoreline};

/// Database row for the predictions table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Prediction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fixture_id: Uuid,
    pub league_id: Option<Uuid>,
    pub pick: String,
    pub stake: i32,
    pub locked_odds: Option<Decimal>,
    pub pred_home_goals: i32,
    pub pred_away_goals: i32,
    pub points_awarded: Option<i32>,
    pub bonus_exact_score_points: Option<i32>,
    pub settled_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

impl Prediction {
    /// Stored pick as a `Pick`. `None` when the column holds anything other
    /// than a recognised pick, which settlement logs and leaves unsettled.
    pub fn pick(&self) -> Option<Pick> {
        Pick::parse(&self.pick)
    }

    pub fn forecast(&self) -> Scoreline {
        Scoreline::new(self.pred_home_goals, self.pred_away_goals)
    }

    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }
}

/// Submission payload. The user id comes from the upstream authentication
/// layer; this service trusts the protected route it arrives on.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub user_id: Uuid,
    pub fixture_id: Uuid,
    #[serde(default)]
    pub league_id: Option<Uuid>,
    #[serde(default)]
    pub pick: Option<String>,
    pub pred_home_goals: i32,
    pub pred_away_goals: i32,
}
