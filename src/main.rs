use std::time::{Duration, Instant};

use matchday::api::router::create_router;
use matchday::config::AppConfig;
use matchday::services::scheduler::{run_odds_poller, run_results_poller};
use matchday::{db, metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing(&config.log_format);
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let db = db::init_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database connected");

    let metrics_handle = metrics::init_metrics();
    let state = AppState::new(db, config, metrics_handle)?;

    if !state.config.has_odds_api() {
        tracing::warn!("ODDS_API_KEY is not set; odds jobs will report a configuration error");
    }
    if !state.config.has_football_data() {
        tracing::warn!("FOOTBALL_DATA_API_KEY is not set; result sync is unavailable");
    }

    // --- Scheduled jobs ---
    if state.config.jobs_enabled {
        let (pool, client, config) = (
            state.db.clone(),
            state.odds_client.clone(),
            state.config.clone(),
        );
        tokio::spawn(async move {
            run_odds_poller(pool, client, config).await;
        });

        let (pool, client, config) = (
            state.db.clone(),
            state.results_client.clone(),
            state.config.clone(),
        );
        tokio::spawn(async move {
            run_results_poller(pool, client, config).await;
        });

        tracing::info!(
            odds_interval_secs = state.config.odds_job_interval_secs,
            results_interval_secs = state.config.result_sync_interval_secs,
            "Scheduled jobs spawned"
        );
    } else {
        tracing::info!("Scheduled jobs disabled (JOBS_ENABLED=false)");
    }

    // --- Rate limiter housekeeping ---
    let limiter = state.rate_limiter.clone();
    let window = Duration::from_secs(state.config.rate_limit_window_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(window);
        loop {
            ticker.tick().await;
            limiter.prune(Instant::now());
        }
    });

    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing(format: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
