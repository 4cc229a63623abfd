use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Pick, Scoreline};

/// Stake every prediction carries in the current product.
pub const DEFAULT_STAKE: i32 = 10;

/// Price assumed when neither the prediction nor the fixture has usable odds,
/// so a correct result is never scored as zero.
pub const DEFAULT_ODDS: Decimal = Decimal::TWO;

/// Exact-score bonus multiplier applied to the result points: 1.5.
const EXACT_SCORE_MULTIPLIER: Decimal = Decimal::from_parts(15, 0, 0, false, 1);

/// The parts of a prediction the scoring rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wager {
    pub pick: Pick,
    pub stake: i32,
    pub locked_odds: Option<Decimal>,
    pub forecast: Scoreline,
}

/// Scoring output for a single prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredPrediction {
    pub points_awarded: i32,
    pub bonus_exact_score_points: i32,
    pub correct_result: bool,
    pub exact_score: bool,
    pub effective_odds: Decimal,
}

impl ScoredPrediction {
    pub fn total(&self) -> i32 {
        self.points_awarded + self.bonus_exact_score_points
    }
}

/// Score one prediction against the final result.
///
/// - Correct result: `round(stake × odds − stake)`.
/// - Exact score (only with a correct result): `round(1.5 × result points)`.
///
/// Odds precedence: the prediction's locked odds, then `fallback_odds`,
/// then [`DEFAULT_ODDS`]. Non-positive prices count as missing.
pub fn score_prediction(
    wager: &Wager,
    result: Scoreline,
    fallback_odds: Option<Decimal>,
) -> ScoredPrediction {
    let correct_result = wager.pick == result.outcome();
    let exact_score = wager.forecast == result;
    let odds = effective_odds(wager.locked_odds, fallback_odds);

    let points_awarded = if correct_result {
        result_points(wager.stake, odds)
    } else {
        0
    };

    let bonus_exact_score_points = if correct_result && exact_score {
        round_half_up(EXACT_SCORE_MULTIPLIER * Decimal::from(points_awarded))
    } else {
        0
    };

    ScoredPrediction {
        points_awarded,
        bonus_exact_score_points,
        correct_result,
        exact_score,
        effective_odds: odds,
    }
}

/// First positive price of `locked`, `fallback`, else [`DEFAULT_ODDS`].
pub fn effective_odds(locked: Option<Decimal>, fallback: Option<Decimal>) -> Decimal {
    locked
        .filter(|o| *o > Decimal::ZERO)
        .or_else(|| fallback.filter(|o| *o > Decimal::ZERO))
        .unwrap_or(DEFAULT_ODDS)
}

fn result_points(stake: i32, odds: Decimal) -> i32 {
    let stake = Decimal::from(stake);
    round_half_up(stake * odds - stake)
}

/// Round to the nearest integer with halves going up (towards +∞).
fn round_half_up(value: Decimal) -> i32 {
    let rounded = (value + Decimal::new(5, 1)).floor();
    rounded.to_i32().unwrap_or(if rounded.is_sign_negative() {
        i32::MIN
    } else {
        i32::MAX
    })
}

// ---------------------------------------------------------------------------
// Pre-kickoff preview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotentialPoints {
    pub result_points: i32,
    pub exact_score_bonus: i32,
}

/// What a pick would earn at `odds`: result points for a correct result and
/// the extra bonus for an exact score. Runs the settlement formula on a
/// hypothetical exact, correct forecast; nothing is persisted.
pub fn potential_points(odds: Decimal, stake: i32) -> PotentialPoints {
    let scoreline = Scoreline::new(1, 0);
    let wager = Wager {
        pick: scoreline.outcome(),
        stake,
        locked_odds: Some(odds),
        forecast: scoreline,
    };
    let scored = score_prediction(&wager, scoreline, None);

    PotentialPoints {
        result_points: scored.points_awarded,
        exact_score_bonus: scored.bonus_exact_score_points,
    }
}
