use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::AppState;

#[derive(Deserialize)]
struct SecretParam {
    secret: Option<String>,
}

/// Admin/cron token authentication middleware.
///
/// If `ADMIN_TOKEN` is set, every request must carry it either as
/// `Authorization: Bearer <token>` or as a `?secret=<token>` query parameter
/// (for external cron services that cannot set headers).
/// If `ADMIN_TOKEN` is unset, authentication is disabled (dev mode).
pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return next.run(req).await;
    };

    let bearer = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let query_secret = Query::<SecretParam>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(p)| p.secret);

    if bearer == Some(expected) || query_secret.as_deref() == Some(expected) {
        next.run(req).await
    } else {
        tracing::warn!(path = %req.uri().path(), "Rejected admin request");
        AppError::Unauthorized.into_response()
    }
}
