use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use thiserror::Error;

use super::odds_client::truncate;
use super::types::{FdMatch, FdMatchesResponse};
use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum ResultsClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("results provider returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Client for the football-data.org v4 competition matches endpoint.
#[derive(Debug, Clone)]
pub struct FootballDataClient {
    http: Client,
    base_url: String,
    api_key: String,
    competition: String,
}

impl FootballDataClient {
    pub fn new(
        api_key: impl Into<String>,
        competition: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ResultsClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: crate::config::DEFAULT_FOOTBALL_DATA_BASE.into(),
            api_key: api_key.into(),
            competition: competition.into(),
        })
    }

    /// Build from config. `Ok(None)` when no API key is configured.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, ResultsClientError> {
        let Some(key) = config.football_data_api_key.as_deref() else {
            return Ok(None);
        };
        let client = Self::new(
            key,
            &config.football_data_competition,
            Duration::from_secs(config.http_timeout_secs),
        )?
        .with_base_url(&config.football_data_base_url);
        Ok(Some(client))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Matches of the competition with a date inside `[from, to]`.
    pub async fn get_matches(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<FdMatch>, ResultsClientError> {
        let url = format!(
            "{}/v4/competitions/{}/matches",
            self.base_url, self.competition
        );
        let resp = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.api_key)
            .query(&[
                ("dateFrom", from.format("%Y-%m-%d").to_string()),
                ("dateTo", to.format("%Y-%m-%d").to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ResultsClientError::Status {
                status: status.as_u16(),
                body: truncate(&body, 300),
            });
        }

        let payload: FdMatchesResponse = resp.json().await?;
        Ok(payload.matches)
    }
}
