use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Points of one settled prediction, as loaded for aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeaderboardRow {
    pub user_id: Uuid,
    pub points_awarded: Option<i32>,
    pub bonus_exact_score_points: Option<i32>,
}

/// Per-user totals. Derived on every query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAggregate {
    pub user_id: Uuid,
    pub total_points: i64,
    pub accuracy: i64,
    pub correct_scores: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: Uuid,
    pub display_name: String,
    pub total_points: i64,
    pub accuracy: i64,
    pub correct_scores: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardPage {
    pub title: String,
    pub entries: Vec<LeaderboardEntry>,
    pub total_count: usize,
    pub league_id: Option<Uuid>,
    pub gameweek: Option<i32>,
    pub limit: usize,
    pub offset: usize,
}
