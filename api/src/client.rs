use crate::espn::{
    AthleteStatsResponse, DepthChartResponse, EspnArticle, InjuryRecord, NewsResponse,
    RosterResponse, ScoreboardResponse, StandingsResponse, SummaryResponse,
};
use chrono::NaiveDate;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const ESPN_SITE_V2: &str = "https://site.api.espn.com/apis/site/v2/sports/basketball/nba";
const ESPN_WEB_V2: &str = "https://site.web.api.espn.com/apis/v2/sports/basketball/nba";
const ESPN_WEB_SITE_V2: &str = "https://site.web.api.espn.com/apis/site/v2/sports/basketball/nba";
const ESPN_CORE_V2: &str = "https://sports.core.api.espn.com/v2/sports/basketball/leagues/nba";
const ESPN_COMMON_V3: &str = "https://site.api.espn.com/apis/common/v3/sports/basketball/nba";
const INJURY_HOST: &str = "nba-injury-reports.p.rapidapi.com";

/// Base URLs for every upstream the client talks to. Tests point all of them
/// at a mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub site: String,
    pub standings: String,
    pub web_news: String,
    pub core: String,
    pub common: String,
    pub injuries: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            site: ESPN_SITE_V2.into(),
            standings: ESPN_WEB_V2.into(),
            web_news: ESPN_WEB_SITE_V2.into(),
            core: ESPN_CORE_V2.into(),
            common: ESPN_COMMON_V3.into(),
            injuries: format!("https://{INJURY_HOST}"),
        }
    }
}

impl Endpoints {
    /// Route every endpoint to one base URL.
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            site: base.clone(),
            standings: base.clone(),
            web_news: base.clone(),
            core: base.clone(),
            common: base.clone(),
            injuries: base,
        }
    }
}

/// Which standings payload to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandingsSource {
    /// `?season=YYYY`, where YYYY is the year the season ends.
    Season(i32),
    /// No season parameter: whatever ESPN considers current.
    Current,
}

impl fmt::Display for StandingsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StandingsSource::Season(year) => write!(f, "season {year}"),
            StandingsSource::Current => write!(f, "current season"),
        }
    }
}

/// NBA API client backed by ESPN's public endpoints.
#[derive(Debug, Clone)]
pub struct NbaApi {
    client: Client,
    timeout: Duration,
    endpoints: Endpoints,
    max_retries: u32,
    backoff_base: Duration,
}

impl Default for NbaApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("sqorz/0.1 (terminal scoreboard)")
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_secs(10),
            endpoints: Endpoints::default(),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    RateLimited { url: String, attempts: u32 },
    NotFound(String),
    Other(String),
}

impl ApiError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::RateLimited { url, attempts } => {
                write!(f, "Rate limited by {url} after {attempts} attempts")
            }
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl NbaApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self { endpoints, ..Self::default() }
    }

    /// Shorten the 429 backoff (tests use milliseconds).
    pub fn with_backoff(mut self, base: Duration, max_retries: u32) -> Self {
        self.backoff_base = base;
        self.max_retries = max_retries;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Scoreboard for one calendar day. HTTP 429 is retried with exponential
    /// backoff before giving up with [`ApiError::RateLimited`].
    pub async fn fetch_scoreboard(&self, date: NaiveDate) -> ApiResult<ScoreboardResponse> {
        let url = format!("{}/scoreboard?dates={}", self.endpoints.site, date.format("%Y%m%d"));
        let mut attempts = 0;
        loop {
            match self.get::<ScoreboardResponse>(&url, self.timeout).await {
                Err(ApiError::RateLimited { .. }) if attempts < self.max_retries => {
                    let wait = self.backoff_base * 2u32.pow(attempts);
                    attempts += 1;
                    warn!("scoreboard rate limited, retry {attempts} in {wait:?}");
                    tokio::time::sleep(wait).await;
                }
                Err(ApiError::RateLimited { url, .. }) => {
                    return Err(ApiError::RateLimited { url, attempts: attempts + 1 });
                }
                other => return other,
            }
        }
    }

    pub async fn fetch_standings(&self, source: StandingsSource) -> ApiResult<StandingsResponse> {
        let url = match source {
            StandingsSource::Season(year) => {
                format!("{}/standings?season={year}", self.endpoints.standings)
            }
            StandingsSource::Current => format!("{}/standings", self.endpoints.standings),
        };
        self.get(&url, self.timeout).await
    }

    pub async fn fetch_summary(&self, event_id: &str) -> ApiResult<SummaryResponse> {
        let url = format!("{}/summary?event={event_id}", self.endpoints.site);
        self.get(&url, self.timeout).await
    }

    pub async fn fetch_depth_chart(&self, team_id: &str) -> ApiResult<DepthChartResponse> {
        let url = format!("{}/teams/{team_id}/depthcharts", self.endpoints.site);
        self.get(&url, self.timeout).await
    }

    pub async fn fetch_roster(&self, team_id: &str) -> ApiResult<RosterResponse> {
        let url = format!("{}/teams/{team_id}/roster", self.endpoints.site);
        self.get(&url, self.timeout).await
    }

    /// Regular-season statistics for one athlete. The core API is tried
    /// first, then the common v3 API; each gets its own short timeout.
    pub async fn fetch_athlete_statistics(
        &self,
        athlete_id: &str,
        season: i32,
    ) -> ApiResult<AthleteStatsResponse> {
        let timeout = Duration::from_secs(10);
        let urls = [
            format!(
                "{}/seasons/{season}/types/2/athletes/{athlete_id}/statistics/0",
                self.endpoints.core
            ),
            format!(
                "{}/athletes/{athlete_id}/statistics?season={season}&seasontype=2",
                self.endpoints.common
            ),
        ];

        let mut last_error = None;
        for url in &urls {
            match self.get::<AthleteStatsResponse>(url, timeout).await {
                Ok(stats) => return Ok(stats),
                Err(e) => {
                    debug!("athlete stats unavailable: {e}");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ApiError::NotFound(format!("athlete {athlete_id}"))))
    }

    /// Team news from ESPN. Three endpoint shapes exist; the first one that
    /// answers with articles wins.
    pub async fn fetch_team_news(&self, team_id: &str) -> ApiResult<Vec<EspnArticle>> {
        let urls = [
            format!("{}/teams/{team_id}/news", self.endpoints.site),
            format!("{}/news?team={team_id}", self.endpoints.site),
            format!("{}/news?team={team_id}", self.endpoints.web_news),
        ];

        let mut last_error = None;
        for url in &urls {
            match self.get::<NewsResponse>(url, self.timeout).await {
                Ok(news) => {
                    let articles = news.into_articles();
                    if !articles.is_empty() {
                        return Ok(articles);
                    }
                }
                Err(e) => {
                    debug!("team news endpoint failed: {e}");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }

    /// League-wide injury report for one date. Needs a RapidAPI key.
    pub async fn fetch_injuries(&self, date: NaiveDate, api_key: &str) -> ApiResult<Vec<InjuryRecord>> {
        let url = format!("{}/injuries/{}", self.endpoints.injuries, date.format("%Y-%m-%d"));
        let request = self
            .client
            .get(&url)
            .header("X-RapidAPI-Host", INJURY_HOST)
            .header("X-RapidAPI-Key", api_key)
            .timeout(self.timeout);
        self.send_json(request, &url).await
    }

    /// Raw text body (RSS feeds), with a caller-supplied timeout.
    pub async fn fetch_text(&self, url: &str, timeout: Duration) -> ApiResult<String> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;
        let response = check_status(response, url)?;
        response
            .text()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, timeout: Duration) -> ApiResult<T> {
        let request = self.client.get(url).timeout(timeout);
        self.send_json(request, url).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> ApiResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;
        check_status(response, url)?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }
}

fn check_status(response: reqwest::Response, url: &str) -> ApiResult<reqwest::Response> {
    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        return Err(ApiError::RateLimited { url: url.to_owned(), attempts: 1 });
    }
    if response.status() == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(url.to_owned()));
    }
    response
        .error_for_status()
        .map_err(|e| ApiError::Api(e, url.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_endpoint_strips_trailing_slash() {
        let endpoints = Endpoints::single("http://127.0.0.1:1234/");
        assert_eq!(endpoints.site, "http://127.0.0.1:1234");
        assert_eq!(endpoints.injuries, "http://127.0.0.1:1234");
    }

    #[test]
    fn standings_source_labels() {
        assert_eq!(StandingsSource::Season(2026).to_string(), "season 2026");
        assert_eq!(StandingsSource::Current.to_string(), "current season");
    }

    #[test]
    fn rate_limit_error_is_flagged() {
        let err = ApiError::RateLimited { url: "x".into(), attempts: 4 };
        assert!(err.is_rate_limited());
        assert!(err.to_string().contains("4 attempts"));
        assert!(!ApiError::Other("boom".into()).is_rate_limited());
    }
}
