use std::env;
use std::str::FromStr;

pub const DEFAULT_ODDS_API_BASE: &str = "https://api.the-odds-api.com";
pub const DEFAULT_FOOTBALL_DATA_BASE: &str = "https://api.football-data.org";
const DEFAULT_SEASON: &str = "2025/26";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Bearer token for admin and cron routes (unset = auth disabled, dev mode)
    pub admin_token: Option<String>,

    // Odds provider
    pub odds_api_key: Option<String>,
    pub odds_api_base_url: String,
    pub odds_api_sport: String,
    pub odds_api_region: String,
    pub preferred_bookmakers: Vec<String>,

    // Result provider
    pub football_data_api_key: Option<String>,
    pub football_data_base_url: String,
    pub football_data_competition: String,

    // Game rules
    pub season: String,
    pub stake: i32,

    // Odds windows
    pub odds_lock_horizon_hours: i64,
    pub odds_lock_safety_margin_secs: i64,
    pub odds_refresh_horizon_hours: i64,

    pub http_timeout_secs: u64,

    // Background jobs
    pub jobs_enabled: bool,
    pub odds_job_interval_secs: u64,
    pub result_sync_interval_secs: u64,

    // Read side
    pub leaderboard_max_page_size: usize,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,

    pub log_format: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let preferred_bookmakers = parse_list(
            &env::var("ODDS_PREFERRED_BOOKMAKERS").unwrap_or_else(|_| "bet365,skybet".into()),
        );

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            admin_token: non_empty_var("ADMIN_TOKEN"),

            odds_api_key: non_empty_var("ODDS_API_KEY"),
            odds_api_base_url: env::var("ODDS_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ODDS_API_BASE.into()),
            odds_api_sport: env::var("ODDS_API_SPORT").unwrap_or_else(|_| "soccer_epl".into()),
            odds_api_region: env::var("ODDS_API_REGION").unwrap_or_else(|_| "uk".into()),
            preferred_bookmakers,

            football_data_api_key: non_empty_var("FOOTBALL_DATA_API_KEY"),
            football_data_base_url: env::var("FOOTBALL_DATA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_FOOTBALL_DATA_BASE.into()),
            football_data_competition: env::var("FOOTBALL_DATA_COMPETITION")
                .unwrap_or_else(|_| "PL".into()),

            season: env::var("SEASON").unwrap_or_else(|_| DEFAULT_SEASON.into()),
            stake: parse_or("PREDICTION_STAKE", 10),

            odds_lock_horizon_hours: parse_or("ODDS_LOCK_HORIZON_HOURS", 24),
            odds_lock_safety_margin_secs: parse_or("ODDS_LOCK_SAFETY_MARGIN_SECS", 60),
            odds_refresh_horizon_hours: parse_or("ODDS_REFRESH_HORIZON_HOURS", 72),

            http_timeout_secs: parse_or("HTTP_TIMEOUT_SECS", 10),

            jobs_enabled: parse_or("JOBS_ENABLED", false),
            odds_job_interval_secs: parse_or("ODDS_JOB_INTERVAL_SECS", 900),
            result_sync_interval_secs: parse_or("RESULT_SYNC_INTERVAL_SECS", 1800),

            leaderboard_max_page_size: parse_or("LEADERBOARD_MAX_PAGE_SIZE", 50),
            rate_limit_max_requests: parse_or("RATE_LIMIT_MAX_REQUESTS", 30),
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW_SECS", 60),

            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".into()),
        })
    }

    /// Settings suitable for tests and local tooling: no credentials, jobs off.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".into(),
            port: 0,
            admin_token: None,
            odds_api_key: None,
            odds_api_base_url: DEFAULT_ODDS_API_BASE.into(),
            odds_api_sport: "soccer_epl".into(),
            odds_api_region: "uk".into(),
            preferred_bookmakers: vec!["bet365".into(), "skybet".into()],
            football_data_api_key: None,
            football_data_base_url: DEFAULT_FOOTBALL_DATA_BASE.into(),
            football_data_competition: "PL".into(),
            season: DEFAULT_SEASON.into(),
            stake: 10,
            odds_lock_horizon_hours: 24,
            odds_lock_safety_margin_secs: 60,
            odds_refresh_horizon_hours: 72,
            http_timeout_secs: 10,
            jobs_enabled: false,
            odds_job_interval_secs: 900,
            result_sync_interval_secs: 1800,
            leaderboard_max_page_size: 50,
            rate_limit_max_requests: 30,
            rate_limit_window_secs: 60,
            log_format: "pretty".into(),
        }
    }

    /// Returns true if the odds provider can be called.
    pub fn has_odds_api(&self) -> bool {
        self.odds_api_key.is_some()
    }

    /// Returns true if the result provider can be called.
    pub fn has_football_data(&self) -> bool {
        self.football_data_api_key.is_some()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
