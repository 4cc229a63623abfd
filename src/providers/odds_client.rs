use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use thiserror::Error;

use super::types::OddsEvent;
use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum OddsClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("odds provider returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Client for the v4 sports odds endpoint (h2h market, decimal prices).
#[derive(Debug, Clone)]
pub struct OddsApiClient {
    http: Client,
    base_url: String,
    api_key: String,
    sport: String,
    region: String,
}

impl OddsApiClient {
    pub fn new(
        api_key: impl Into<String>,
        sport: impl Into<String>,
        region: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OddsClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: crate::config::DEFAULT_ODDS_API_BASE.into(),
            api_key: api_key.into(),
            sport: sport.into(),
            region: region.into(),
        })
    }

    /// Build from config. `Ok(None)` when no API key is configured.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, OddsClientError> {
        let Some(key) = config.odds_api_key.as_deref() else {
            return Ok(None);
        };
        let client = Self::new(
            key,
            &config.odds_api_sport,
            &config.odds_api_region,
            Duration::from_secs(config.http_timeout_secs),
        )?
        .with_base_url(&config.odds_api_base_url);
        Ok(Some(client))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch upcoming events with bookmaker prices. `window` narrows the
    /// events by commence time.
    pub async fn get_odds(
        &self,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<OddsEvent>, OddsClientError> {
        let url = format!("{}/v4/sports/{}/odds", self.base_url, self.sport);

        let mut query: Vec<(&str, String)> = vec![
            ("regions", self.region.clone()),
            ("markets", "h2h".into()),
            ("oddsFormat", "decimal".into()),
            ("dateFormat", "iso".into()),
            ("apiKey", self.api_key.clone()),
        ];
        if let Some((from, to)) = window {
            query.push(("commenceTimeFrom", provider_timestamp(from)));
            query.push(("commenceTimeTo", provider_timestamp(to)));
        }

        let resp = self.http.get(&url).query(&query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OddsClientError::Status {
                status: status.as_u16(),
                body: truncate(&body, 300),
            });
        }

        let events: Vec<OddsEvent> = resp.json().await?;
        tracing::debug!(events = events.len(), sport = %self.sport, "Fetched odds events");
        Ok(events)
    }
}

/// The provider rejects fractional seconds.
fn provider_timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
