pub mod points;

pub use points::{
    effective_odds, potential_points, score_prediction, PotentialPoints, ScoredPrediction, Wager,
    DEFAULT_ODDS, DEFAULT_STAKE,
};
