use std::cmp::Ordering;
use std::collections::HashMap;

use metrics::counter;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{leaderboard_repo, league_repo, profile_repo};
use crate::models::{LeaderboardEntry, LeaderboardPage, LeaderboardRow, UserAggregate};

pub const DEFAULT_DISPLAY_NAME: &str = "Player";
pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct LeaderboardQuery {
    pub league_id: Option<Uuid>,
    pub gameweek: Option<i32>,
    pub search: String,
    pub limit: usize,
    pub offset: usize,
}

/// Sum settled points per user and sort into board order.
///
/// Accuracy counts predictions that earned result points; correct scores
/// counts predictions that earned an exact-score bonus. Missing points are 0.
pub fn aggregate_points_by_user(rows: &[LeaderboardRow]) -> Vec<UserAggregate> {
    let mut by_user: HashMap<Uuid, UserAggregate> = HashMap::new();

    for row in rows {
        let points = row.points_awarded.unwrap_or(0);
        let bonus = row.bonus_exact_score_points.unwrap_or(0);

        let agg = by_user.entry(row.user_id).or_insert_with(|| UserAggregate {
            user_id: row.user_id,
            total_points: 0,
            accuracy: 0,
            correct_scores: 0,
        });
        agg.total_points += i64::from(points) + i64::from(bonus);
        if points > 0 {
            agg.accuracy += 1;
        }
        if bonus > 0 {
            agg.correct_scores += 1;
        }
    }

    let mut sorted: Vec<UserAggregate> = by_user.into_values().collect();
    sorted.sort_by(board_order);
    sorted
}

/// Total points, then accuracy, then correct scores, all descending; user id
/// ascending last so no two users compare equal.
pub fn board_order(a: &UserAggregate, b: &UserAggregate) -> Ordering {
    b.total_points
        .cmp(&a.total_points)
        .then_with(|| b.accuracy.cmp(&a.accuracy))
        .then_with(|| b.correct_scores.cmp(&a.correct_scores))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

/// Rank the full sorted board, then narrow by a case-insensitive name search,
/// then page. Ranks come from the unfiltered board. Returns the page and the
/// number of rows that matched the search.
pub fn build_leaderboard_page(
    sorted: &[UserAggregate],
    names: &HashMap<Uuid, String>,
    search: &str,
    offset: usize,
    limit: usize,
) -> (Vec<LeaderboardEntry>, usize) {
    let needle = search.trim().to_lowercase();

    let matching: Vec<LeaderboardEntry> = sorted
        .iter()
        .enumerate()
        .map(|(i, agg)| LeaderboardEntry {
            rank: i + 1,
            user_id: agg.user_id,
            display_name: names
                .get(&agg.user_id)
                .cloned()
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            total_points: agg.total_points,
            accuracy: agg.accuracy,
            correct_scores: agg.correct_scores,
        })
        .filter(|e| needle.is_empty() || e.display_name.to_lowercase().contains(&needle))
        .collect();

    let total_count = matching.len();
    let entries = matching.into_iter().skip(offset).take(limit).collect();
    (entries, total_count)
}

/// Limit defaults to [`DEFAULT_PAGE_SIZE`] when missing, unparsable or below 1
/// and is clamped to `max_page_size`. Offset defaults to 0 and is never negative.
pub fn parse_pagination(
    limit: Option<&str>,
    offset: Option<&str>,
    max_page_size: usize,
) -> (usize, usize) {
    let max_page_size = max_page_size.max(1);
    let default_limit = DEFAULT_PAGE_SIZE.min(max_page_size);

    let limit = limit
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX).min(max_page_size))
        .unwrap_or(default_limit);

    let offset = offset
        .and_then(|s| s.trim().parse::<i64>().ok())
        .map(|n| usize::try_from(n.max(0)).unwrap_or(usize::MAX))
        .unwrap_or(0);

    (limit, offset)
}

/// Gameweek filter from user input. Empty, zero, negative or fractional
/// input means no filter; integral decimals such as `"12.0"` are accepted.
pub fn parse_gameweek(input: &str) -> Option<i32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let n: f64 = trimmed.parse().ok()?;
    if !n.is_finite() || n.fract() != 0.0 || n < 1.0 || n > f64::from(i32::MAX) {
        return None;
    }
    Some(n as i32)
}

pub fn leaderboard_title(
    league_name: Option<&str>,
    league_id: Option<Uuid>,
    gameweek: Option<i32>,
) -> String {
    let base = match (league_id, league_name.map(str::trim)) {
        (None, _) if gameweek.is_some() => "Leaderboard".to_string(),
        (None, _) => "Global leaderboard".to_string(),
        (Some(_), Some(name)) if !name.is_empty() => format!("{name} leaderboard"),
        (Some(_), _) => "League leaderboard".to_string(),
    };
    match gameweek {
        Some(gw) => format!("{base} (GW {gw})"),
        None => base,
    }
}

/// Build one leaderboard page from settled predictions. Read-only.
pub async fn get_leaderboard(
    pool: &PgPool,
    season: &str,
    query: &LeaderboardQuery,
) -> anyhow::Result<LeaderboardPage> {
    counter!("leaderboard_requests_total").increment(1);

    let rows =
        leaderboard_repo::get_settled_rows(pool, query.league_id, query.gameweek, season).await?;
    let sorted = aggregate_points_by_user(&rows);

    let user_ids: Vec<Uuid> = sorted.iter().map(|a| a.user_id).collect();
    let names = match profile_repo::get_display_names(pool, &user_ids).await {
        Ok(names) => names,
        Err(e) => {
            tracing::warn!(error = %e, "Display name lookup failed, using defaults");
            HashMap::new()
        }
    };

    let league_name = match query.league_id {
        Some(id) => league_repo::get_league_name(pool, id).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, league_id = %id, "League name lookup failed");
            None
        }),
        None => None,
    };

    let (entries, total_count) =
        build_leaderboard_page(&sorted, &names, &query.search, query.offset, query.limit);

    Ok(LeaderboardPage {
        title: leaderboard_title(league_name.as_deref(), query.league_id, query.gameweek),
        entries,
        total_count,
        league_id: query.league_id,
        gameweek: query.gameweek,
        limit: query.limit,
        offset: query.offset,
    })
}
