//! Team box-score extraction from ESPN game summaries, plus the per-event
//! summary cache.

use crate::client::{ApiResult, NbaApi};
use crate::espn::{EspnStat, SummaryResponse};
use crate::teams;
use crate::StatRecord;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Stat name → display value for one team's box score.
pub struct StatDict<'a>(HashMap<&'a str, &'a str>);

impl<'a> StatDict<'a> {
    pub fn new(stats: &'a [EspnStat]) -> Self {
        let map = stats
            .iter()
            .filter_map(|s| Some((s.name.as_deref()?, s.display_value.as_deref()?)))
            .collect();
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.0.get(name).copied()
    }

    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or(default).to_string()
    }

    /// Split a "made-attempted" pair such as "12-35".
    pub fn made_attempted(&self, name: &str) -> (String, String) {
        let raw = self.get(name).unwrap_or_default();
        let mut parts = raw.splitn(2, '-');
        let made = parts.next().filter(|p| !p.is_empty()).unwrap_or("0");
        let attempted = parts.next().filter(|p| !p.is_empty()).unwrap_or("0");
        (made.to_string(), attempted.to_string())
    }
}

/// Why a lookup produced no numbers, so callers can tell expected gaps from
/// data problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamStatsLookup {
    Found(StatRecord),
    /// Pre-game or postponed: there is no box score yet.
    NotStarted,
    /// The team is in the box score but without a statistics list.
    NoStatistics,
    TeamMissing,
}

/// Whether the summary describes a game that has not produced stats.
pub fn not_started(summary: &SummaryResponse) -> bool {
    let Some(status) = summary.status() else {
        return false;
    };
    let detail = status.short_detail().unwrap_or_default();
    status.state() == Some("pre")
        || status.state() == Some("postponed")
        || detail == "Postponed"
        || detail == "PPD"
}

pub fn lookup_team_stats(summary: &SummaryResponse, code: &str) -> TeamStatsLookup {
    if not_started(summary) {
        return TeamStatsLookup::NotStarted;
    }

    let code = teams::normalize(code);
    let team = summary
        .boxscore
        .iter()
        .flat_map(|b| b.teams.iter().flatten())
        .find(|t| {
            t.team
                .as_ref()
                .and_then(|team| team.abbreviation.as_deref())
                .map(teams::normalize)
                == Some(code)
        });

    let Some(team) = team else {
        return TeamStatsLookup::TeamMissing;
    };
    let Some(statistics) = team.statistics.as_deref() else {
        return TeamStatsLookup::NoStatistics;
    };

    let dict = StatDict::new(statistics);
    let (three_pm, three_pa) =
        dict.made_attempted("threePointFieldGoalsMade-threePointFieldGoalsAttempted");
    let (ft_m, ft_a) = dict.made_attempted("freeThrowsMade-freeThrowsAttempted");
    let count = |name: &str| Some(dict.get_or(name, "0"));

    TeamStatsLookup::Found(StatRecord {
        fg_pct: Some(dict.get_or("fieldGoalPct", "-")),
        three_pm: Some(three_pm),
        three_pa: Some(three_pa),
        ft_m: Some(ft_m),
        ft_a: Some(ft_a),
        turnovers: count("turnovers"),
        rebounds: count("totalRebounds"),
        assists: count("assists"),
        steals: count("steals"),
        blocks: count("blocks"),
        fast_break_points: count("fastBreakPoints"),
        points_in_paint: count("pointsInPaint"),
        bench_points: count("benchPoints"),
        biggest_lead: count("biggestLead"),
    })
}

/// Box score totals for one team. Games that have not started yield an empty
/// record quietly; a missing team is logged.
pub fn extract_team_stats(summary: &SummaryResponse, code: &str) -> StatRecord {
    match lookup_team_stats(summary, code) {
        TeamStatsLookup::Found(record) => record,
        TeamStatsLookup::NotStarted => StatRecord::default(),
        TeamStatsLookup::NoStatistics => {
            warn!("box score for {code} has no statistics");
            StatRecord::default()
        }
        TeamStatsLookup::TeamMissing => {
            warn!("team {code} not found in box score");
            StatRecord::default()
        }
    }
}

type SummaryCell = Arc<OnceCell<Arc<SummaryResponse>>>;

/// Session cache of game summaries keyed by event id. Concurrent requests
/// for the same event share a single fetch; failures are not cached.
#[derive(Debug)]
pub struct BoxScoreCache {
    api: NbaApi,
    cells: Mutex<HashMap<String, SummaryCell>>,
}

impl BoxScoreCache {
    pub fn new(api: NbaApi) -> Self {
        Self { api, cells: Mutex::new(HashMap::new()) }
    }

    pub async fn get(&self, event_id: &str) -> ApiResult<Arc<SummaryResponse>> {
        let cell = self.cell(event_id);
        let summary = cell
            .get_or_try_init(|| async {
                debug!("fetching summary for event {event_id}");
                self.api.fetch_summary(event_id).await.map(Arc::new)
            })
            .await?;
        Ok(summary.clone())
    }

    /// Drop a cached summary so the next `get` refetches (live games).
    pub fn invalidate(&self, event_id: &str) {
        if let Ok(mut cells) = self.cells.lock() {
            cells.remove(event_id);
        }
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.cells
            .lock()
            .map(|cells| cells.get(event_id).is_some_and(|c| c.initialized()))
            .unwrap_or(false)
    }

    fn cell(&self, event_id: &str) -> SummaryCell {
        match self.cells.lock() {
            Ok(mut cells) => cells.entry(event_id.to_string()).or_default().clone(),
            Err(_) => Arc::new(OnceCell::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(state: &str, detail: &str) -> SummaryResponse {
        serde_json::from_value(json!({
            "header": { "competitions": [{ "status": { "type": {
                "state": state, "shortDetail": detail
            }}}]},
            "boxscore": { "teams": [
                { "team": { "abbreviation": "GS" }, "statistics": [
                    { "name": "fieldGoalPct", "displayValue": "48.9" },
                    { "name": "threePointFieldGoalsMade-threePointFieldGoalsAttempted", "displayValue": "15-38" },
                    { "name": "freeThrowsMade-freeThrowsAttempted", "displayValue": "20-24" },
                    { "name": "totalRebounds", "displayValue": "44" },
                    { "name": "assists", "displayValue": "29" },
                    { "name": "benchPoints", "displayValue": "31" }
                ]},
                { "team": { "abbreviation": "LAL" } }
            ]}
        }))
        .unwrap()
    }

    #[test]
    fn extracts_named_stats_with_defaults() {
        let record = extract_team_stats(&summary("post", "Final"), "GSW");
        assert_eq!(record.fg_pct.as_deref(), Some("48.9"));
        assert_eq!(record.three_pm.as_deref(), Some("15"));
        assert_eq!(record.three_pa.as_deref(), Some("38"));
        assert_eq!(record.ft_m.as_deref(), Some("20"));
        assert_eq!(record.ft_a.as_deref(), Some("24"));
        assert_eq!(record.rebounds.as_deref(), Some("44"));
        assert_eq!(record.bench_points.as_deref(), Some("31"));
        assert_eq!(record.steals.as_deref(), Some("0"));
        assert_eq!(record.biggest_lead.as_deref(), Some("0"));
    }

    #[test]
    fn pre_game_summary_is_not_started() {
        assert_eq!(lookup_team_stats(&summary("pre", "7:30 PM"), "GSW"), TeamStatsLookup::NotStarted);
        assert!(extract_team_stats(&summary("pre", "7:30 PM"), "GSW").is_empty());
    }

    #[test]
    fn postponed_summary_is_not_started() {
        assert_eq!(lookup_team_stats(&summary("post", "Postponed"), "GSW"), TeamStatsLookup::NotStarted);
        assert_eq!(lookup_team_stats(&summary("post", "PPD"), "GSW"), TeamStatsLookup::NotStarted);
        assert_eq!(lookup_team_stats(&summary("postponed", ""), "GSW"), TeamStatsLookup::NotStarted);
    }

    #[test]
    fn missing_team_and_missing_statistics_are_distinguished() {
        let s = summary("in", "Q3 5:12");
        assert_eq!(lookup_team_stats(&s, "BOS"), TeamStatsLookup::TeamMissing);
        assert_eq!(lookup_team_stats(&s, "LAL"), TeamStatsLookup::NoStatistics);
        assert!(extract_team_stats(&s, "BOS").is_empty());
    }

    #[test]
    fn made_attempted_defaults_to_zero() {
        let stats = vec![EspnStat {
            name: Some("freeThrowsMade-freeThrowsAttempted".into()),
            display_value: Some("".into()),
            ..Default::default()
        }];
        let dict = StatDict::new(&stats);
        assert_eq!(
            dict.made_attempted("freeThrowsMade-freeThrowsAttempted"),
            ("0".to_string(), "0".to_string())
        );
        assert_eq!(dict.made_attempted("missing"), ("0".to_string(), "0".to_string()));
    }
}
