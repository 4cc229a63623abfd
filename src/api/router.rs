use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_admin;
use super::handlers;
use super::rate_limit::rate_limit;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render))
        .route(
            "/api/fixtures/:id/potential-points",
            get(handlers::fixtures::potential_points_for_fixture),
        );

    // Public leaderboard reads, rate limited per client
    let leaderboard = Router::new()
        .route("/api/leaderboard", get(handlers::leaderboard::get))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    // Protected routes: require the admin token when ADMIN_TOKEN is set
    let protected = Router::new()
        // Submission (user identity is established upstream)
        .route("/api/predictions", post(handlers::predictions::submit))
        // Odds
        .route("/api/admin/map-odds", post(handlers::admin::map_odds))
        .route("/api/admin/refresh-odds", post(handlers::admin::refresh_odds))
        .route("/api/admin/lock-odds", post(handlers::admin::lock_odds))
        .route("/api/admin/odds-cycle", post(handlers::admin::run_odds_cycle))
        // Results and settlement
        .route("/api/admin/sync-results", post(handlers::admin::sync_results))
        .route("/api/admin/update-score", post(handlers::admin::update_score))
        .route("/api/admin/settle-fixture", post(handlers::admin::settle_fixture))
        .route("/api/admin/score-gameweek", post(handlers::admin::score_gameweek))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(leaderboard)
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
