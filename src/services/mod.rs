pub mod leaderboard;
pub mod odds_cycle;
pub mod odds_lock;
pub mod odds_mapping;
pub mod odds_refresh;
pub mod result_sync;
pub mod scheduler;
pub mod settlement;
pub mod submission;
