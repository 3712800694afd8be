//! League standings: the conference table and the win/loss streaks shown on
//! upcoming games.

use crate::client::{ApiError, ApiResult, NbaApi, StandingsSource};
use crate::espn::{StandingsEntry, StandingsResponse};
use crate::season_stats::default_sources;
use crate::teams;
use chrono::Utc;
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

static RE_STREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([WL])(\d+)").expect("valid streak regex"));

const STANDINGS_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingRow {
    pub team_id: String,
    pub code: String,
    pub name: String,
    pub logo: String,
    pub record: String,
    pub wins: u32,
    pub losses: u32,
    pub win_pct: String,
    pub games_behind: String,
    pub vs_conference: String,
    pub home: String,
    pub road: String,
    pub last_ten: String,
    pub streak: String,
    pub conference: String,
    pub division: String,
    pub rank: u32,
}

/// "W3" → "W 3". Anything else is returned as-is.
pub fn format_streak(raw: &str) -> String {
    RE_STREAK.replace(raw, "$1 $2").into_owned()
}

fn display(entry: &StandingsEntry, name: &str) -> String {
    entry
        .stat(name)
        .and_then(|s| s.display_value.clone())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| crate::PLACEHOLDER.to_string())
}

fn count(entry: &StandingsEntry, name: &str) -> Option<u32> {
    entry.stat(name).and_then(|s| s.value).map(|v| v.max(0.0) as u32)
}

/// Flatten the conference tables into rows, tag each with its division and
/// order by wins.
pub fn parse_standings(response: &StandingsResponse) -> Vec<StandingRow> {
    let mut rows: Vec<StandingRow> = Vec::new();

    for conference in response.children.iter().flatten() {
        let conference_name = conference.name.clone().unwrap_or_default();

        for entry in conference.entries() {
            let Some(team) = entry.team.as_ref() else {
                continue;
            };
            let abbrev = team.abbreviation.as_deref().unwrap_or_default();
            let code = teams::normalize(abbrev).to_string();
            let name = teams::find(&code)
                .map(|t| t.full_name())
                .or_else(|| team.display_name.clone())
                .unwrap_or_else(|| code.clone());
            let fallback_rank = rows.len() as u32 + 1;

            rows.push(StandingRow {
                team_id: team.id.clone().unwrap_or_default(),
                code,
                name,
                logo: team
                    .logos
                    .iter()
                    .flatten()
                    .find_map(|l| l.href.clone())
                    .unwrap_or_default(),
                record: display(entry, "overall"),
                wins: count(entry, "wins").unwrap_or(0),
                losses: count(entry, "losses").unwrap_or(0),
                win_pct: display(entry, "winPercent"),
                games_behind: display(entry, "gamesBehind"),
                vs_conference: display(entry, "vsConf"),
                home: display(entry, "Home"),
                road: display(entry, "Road"),
                last_ten: display(entry, "last10"),
                streak: display(entry, "streak"),
                conference: conference_name.clone(),
                division: String::new(),
                rank: count(entry, "rank").filter(|r| *r > 0).unwrap_or(fallback_rank),
            });
        }

        for division in conference.children.iter().flatten() {
            let division_name = division.name.clone().unwrap_or_default();
            for entry in division.entries() {
                let Some(id) = entry.team.as_ref().and_then(|t| t.id.as_deref()) else {
                    continue;
                };
                if let Some(row) = rows.iter_mut().find(|r| r.team_id == id) {
                    row.division = division_name.clone();
                }
            }
        }
    }

    rows.sort_by(|a, b| b.wins.cmp(&a.wins));
    rows
}

/// Rows whose conference name contains `filter` ("east", "West", ...).
pub fn conference_rows<'a>(rows: &'a [StandingRow], filter: &str) -> Vec<&'a StandingRow> {
    let filter = filter.to_lowercase();
    rows.iter()
        .filter(|r| r.conference.to_lowercase().contains(&filter))
        .collect()
}

/// Current streak for an ESPN team id, formatted for display.
pub fn find_streak(response: &StandingsResponse, team_id: &str) -> Option<String> {
    fn search<'a>(
        groups: impl Iterator<Item = &'a crate::espn::StandingsGroup>,
        team_id: &str,
    ) -> Option<&'a StandingsEntry> {
        for group in groups {
            if let Some(entry) = group
                .entries()
                .find(|e| e.team.as_ref().and_then(|t| t.id.as_deref()) == Some(team_id))
            {
                return Some(entry);
            }
            if let Some(entry) = search(group.children.iter().flatten(), team_id) {
                return Some(entry);
            }
        }
        None
    }

    let entry = search(response.children.iter().flatten(), team_id)?;
    let stat = entry.stats.iter().flatten().find(|s| {
        s.name.as_deref() == Some("streak") || s.stat_type.as_deref() == Some("streak")
    })?;
    let raw = stat.display_value.as_deref().filter(|v| !v.is_empty())?;
    Some(format_streak(raw))
}

/// Shared standings payload with a short time-to-live. The lock is held
/// across the fetch, so concurrent callers wait for one request instead of
/// issuing their own.
#[derive(Debug)]
pub struct StandingsCache {
    api: NbaApi,
    sources: Vec<StandingsSource>,
    ttl: Duration,
    latest: Mutex<Option<(Instant, Arc<StandingsResponse>)>>,
}

impl StandingsCache {
    pub fn new(api: NbaApi) -> Self {
        Self::with_sources(api, default_sources(Utc::now()))
    }

    pub fn with_sources(api: NbaApi, sources: Vec<StandingsSource>) -> Self {
        Self { api, sources, ttl: STANDINGS_TTL, latest: Mutex::new(None) }
    }

    pub async fn get(&self) -> ApiResult<Arc<StandingsResponse>> {
        let mut latest = self.latest.lock().await;
        if let Some((fetched_at, response)) = latest.as_ref()
            && fetched_at.elapsed() < self.ttl
        {
            return Ok(response.clone());
        }

        let mut last_error = None;
        for source in &self.sources {
            match self.api.fetch_standings(*source).await {
                Ok(response) if response.children.as_ref().is_some_and(|c| !c.is_empty()) => {
                    debug!("standings loaded from {source}");
                    let response = Arc::new(response);
                    *latest = Some((Instant::now(), response.clone()));
                    return Ok(response);
                }
                Ok(_) => last_error = Some(ApiError::NotFound(format!("empty standings for {source}"))),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| ApiError::NotFound("standings".into())))
    }

    pub async fn table(&self) -> ApiResult<Vec<StandingRow>> {
        Ok(parse_standings(&*self.get().await?))
    }
}

#[derive(Debug)]
pub struct StreakFetcher {
    standings: Arc<StandingsCache>,
}

impl StreakFetcher {
    pub fn new(standings: Arc<StandingsCache>) -> Self {
        Self { standings }
    }

    /// `None` when the team id is unknown or standings can't be loaded.
    pub async fn streak(&self, team_id: &str) -> Option<String> {
        if team_id.is_empty() {
            return None;
        }
        match self.standings.get().await {
            Ok(response) => find_streak(&response, team_id),
            Err(e) => {
                warn!("streak lookup for team {team_id} failed: {e}");
                None
            }
        }
    }
}
