use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = sqlx::query("SELECT 1").execute(&state.db).await.is_ok();

    let providers = json!({
        "odds": state.odds_client.is_some(),
        "results": state.results_client.is_some(),
    });

    if db_ok {
        (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "season": state.config.season,
                "jobs_enabled": state.config.jobs_enabled,
                "providers": providers,
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy", "db": "disconnected" })),
        )
    }
}
