use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics::counter;
use parking_lot::Mutex;

use crate::errors::AppError;
use crate::AppState;

/// Sliding-window limiter for public reads: at most `max_requests` per
/// `window` per client key. The limiter is owned by the application state,
/// so each router (and each test) gets its own.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request at `now`. `Err(retry_after)` when the client is over
    /// the limit; rejected requests are not recorded.
    pub fn check(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut hits = self.hits.lock();
        let recent = hits.entry(key.to_string()).or_default();

        while let Some(&oldest) = recent.front() {
            if now.duration_since(oldest) >= self.window {
                recent.pop_front();
            } else {
                break;
            }
        }

        if recent.len() >= self.max_requests {
            let retry_after = recent
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            return Err(retry_after);
        }

        recent.push_back(now);
        Ok(())
    }

    /// Drop keys with no requests inside the window.
    pub fn prune(&self, now: Instant) {
        let window = self.window;
        self.hits.lock().retain(|_, recent| {
            recent
                .back()
                .map(|last| now.duration_since(*last) < window)
                .unwrap_or(false)
        });
    }
}

/// First `x-forwarded-for` entry, else `x-real-ip`, else `"unknown"`.
pub fn client_key(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header("x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next().map(str::trim).filter(|s| !s.is_empty()) {
            return first.to_string();
        }
    }
    header("x-real-ip")
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".into())
}

pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let key = client_key(req.headers());

    match state.rate_limiter.check(&key, Instant::now()) {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            counter!("rate_limited_requests_total").increment(1);
            tracing::warn!(client = %key, retry_after_secs = retry_after.as_secs(), "Rate limit exceeded");
            AppError::TooManyRequests {
                retry_after_secs: retry_after.as_secs().max(1),
            }
            .into_response()
        }
    }
}
