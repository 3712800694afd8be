//! League-wide scoring averages and the offensive/defensive ranks derived
//! from them.

use crate::client::{ApiError, NbaApi, StandingsSource};
use crate::espn::{StandingsGroup, StandingsResponse};
use crate::teams;
use crate::TeamSeasonStat;
use chrono::{DateTime, Datelike, Utc};
use log::{debug, error, warn};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

pub type SeasonStats = HashMap<String, TeamSeasonStat>;

/// One team's raw averages before ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsLine {
    pub code: String,
    pub points_for: f64,
    pub points_against: f64,
}

/// ESPN names an NBA season after the year it ends; October tips off the next one.
pub fn season_year(now: DateTime<Utc>) -> i32 {
    if now.month() >= 10 { now.year() + 1 } else { now.year() }
}

/// Standings requests to try in order: this season, last season, then no
/// season parameter at all.
pub fn default_sources(now: DateTime<Utc>) -> Vec<StandingsSource> {
    let year = season_year(now);
    vec![
        StandingsSource::Season(year),
        StandingsSource::Season(year - 1),
        StandingsSource::Current,
    ]
}

/// Pull points-for/against out of every conference and division table.
/// Teams missing either average (or reporting zero) are skipped.
pub fn collect_points(response: &StandingsResponse) -> Vec<PointsLine> {
    fn walk(group: &StandingsGroup, seen: &mut HashSet<String>, out: &mut Vec<PointsLine>) {
        for entry in group.entries() {
            let Some(abbrev) = entry.team.as_ref().and_then(|t| t.abbreviation.as_deref()) else {
                continue;
            };
            let code = teams::normalize(abbrev).to_string();
            let value = |name: &str| entry.stat(name).and_then(|s| s.value).unwrap_or(0.0);
            let points_for = value("avgPointsFor");
            let points_against = value("avgPointsAgainst");
            if points_for > 0.0 && points_against > 0.0 && seen.insert(code.clone()) {
                out.push(PointsLine { code, points_for, points_against });
            }
        }
        for child in group.children.iter().flatten() {
            walk(child, seen, out);
        }
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for group in response.children.iter().flatten() {
        walk(group, &mut seen, &mut out);
    }
    out
}

/// Rank teams: offense descending by points for, defense ascending by points
/// against. Ties keep input order.
pub fn compute_rankings(lines: &[PointsLine]) -> SeasonStats {
    let mut by_offense: Vec<&PointsLine> = lines.iter().collect();
    by_offense.sort_by(|a, b| b.points_for.total_cmp(&a.points_for));
    let mut by_defense: Vec<&PointsLine> = lines.iter().collect();
    by_defense.sort_by(|a, b| a.points_against.total_cmp(&b.points_against));

    let rank_of = |sorted: &[&PointsLine], code: &str| {
        sorted.iter().position(|l| l.code == code).map(|i| i as u32 + 1).unwrap_or(0)
    };

    lines
        .iter()
        .map(|line| {
            let stat = TeamSeasonStat {
                code: line.code.clone(),
                points_for: round1(line.points_for),
                points_against: round1(line.points_against),
                offensive_rank: rank_of(&by_offense, &line.code),
                defensive_rank: rank_of(&by_defense, &line.code),
            };
            (line.code.clone(), stat)
        })
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Owned holder for the season stats table. Readers take cheap snapshots;
/// `refresh` swaps in a new table atomically.
#[derive(Debug)]
pub struct SeasonStatsRepository {
    api: NbaApi,
    sources: Vec<StandingsSource>,
    table: RwLock<Arc<SeasonStats>>,
}

impl SeasonStatsRepository {
    pub fn new(api: NbaApi) -> Self {
        Self::with_sources(api, default_sources(Utc::now()))
    }

    pub fn with_sources(api: NbaApi, sources: Vec<StandingsSource>) -> Self {
        Self { api, sources, table: RwLock::new(Arc::new(SeasonStats::new())) }
    }

    /// Walk the source list until one yields standings. Never fails: when
    /// every source is exhausted the previous table (empty at first) stays in
    /// place. Returns the number of ranked teams.
    pub async fn refresh(&self) -> usize {
        let mut failures: Vec<(StandingsSource, ApiError)> = Vec::new();

        for source in &self.sources {
            match self.api.fetch_standings(*source).await {
                Ok(response) => {
                    let lines = collect_points(&response);
                    if lines.is_empty() {
                        debug!("standings for {source} carried no scoring averages");
                        failures.push((*source, ApiError::NotFound(format!("no averages for {source}"))));
                        continue;
                    }
                    let stats = compute_rankings(&lines);
                    let count = stats.len();
                    debug!("ranked {count} teams from {source}");
                    self.store(stats);
                    return count;
                }
                Err(e) => {
                    warn!("standings request for {source} failed: {e}");
                    failures.push((*source, e));
                }
            }
        }

        // Keep the last good table through an outage.
        let kept = self.snapshot().len();
        error!(
            "season stats unavailable after {} attempts, keeping {kept} ranked teams; last error: {}",
            failures.len(),
            failures.last().map(|(_, e)| e.to_string()).unwrap_or_default()
        );
        kept
    }

    pub fn get(&self, code: &str) -> Option<TeamSeasonStat> {
        self.snapshot().get(teams::normalize(code)).cloned()
    }

    pub fn snapshot(&self) -> Arc<SeasonStats> {
        match self.table.read() {
            Ok(table) => table.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        self.store(SeasonStats::new());
    }

    fn store(&self, stats: SeasonStats) {
        let stats = Arc::new(stats);
        match self.table.write() {
            Ok(mut table) => *table = stats,
            Err(poisoned) => *poisoned.into_inner() = stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn line(code: &str, pf: f64, pa: f64) -> PointsLine {
        PointsLine { code: code.into(), points_for: pf, points_against: pa }
    }

    #[test]
    fn season_year_rolls_over_in_october() {
        let sep = Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0).unwrap();
        let oct = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
        let feb = Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).unwrap();
        assert_eq!(season_year(sep), 2025);
        assert_eq!(season_year(oct), 2026);
        assert_eq!(season_year(feb), 2026);
    }

    #[test]
    fn sources_try_current_then_previous_then_unqualified() {
        let dt = Utc.with_ymd_and_hms(2025, 12, 29, 0, 0, 0).unwrap();
        assert_eq!(
            default_sources(dt),
            vec![
                StandingsSource::Season(2026),
                StandingsSource::Season(2025),
                StandingsSource::Current
            ]
        );
    }

    #[test]
    fn ranks_are_a_permutation() {
        let lines = vec![
            line("LAL", 115.3, 112.0),
            line("PHX", 118.9, 116.4),
            line("BOS", 120.1, 108.7),
            line("DET", 109.0, 119.2),
        ];
        let stats = compute_rankings(&lines);
        let mut off: Vec<u32> = stats.values().map(|s| s.offensive_rank).collect();
        let mut def: Vec<u32> = stats.values().map(|s| s.defensive_rank).collect();
        off.sort_unstable();
        def.sort_unstable();
        assert_eq!(off, vec![1, 2, 3, 4]);
        assert_eq!(def, vec![1, 2, 3, 4]);

        assert_eq!(stats["BOS"].offensive_rank, 1);
        assert_eq!(stats["BOS"].defensive_rank, 1);
        assert_eq!(stats["DET"].offensive_rank, 4);
        assert_eq!(stats["DET"].defensive_rank, 4);
    }

    #[test]
    fn ties_keep_input_order() {
        let stats = compute_rankings(&[line("MIA", 110.0, 110.0), line("ORL", 110.0, 110.0)]);
        assert_eq!(stats["MIA"].offensive_rank, 1);
        assert_eq!(stats["ORL"].offensive_rank, 2);
        assert_eq!(stats["MIA"].defensive_rank, 1);
        assert_eq!(stats["ORL"].defensive_rank, 2);
    }

    #[test]
    fn values_are_rounded_to_one_decimal() {
        let stats = compute_rankings(&[line("LAL", 115.26, 111.94)]);
        assert_eq!(stats["LAL"].points_for, 115.3);
        assert_eq!(stats["LAL"].points_against, 111.9);
    }

    #[test]
    fn collect_points_normalizes_and_skips_incomplete_entries() {
        let response: StandingsResponse = serde_json::from_value(serde_json::json!({
            "children": [{
                "name": "Western Conference",
                "standings": { "entries": [
                    { "team": { "abbreviation": "GS" }, "stats": [
                        { "name": "avgPointsFor", "value": 117.2 },
                        { "name": "avgPointsAgainst", "value": 113.0 }
                    ]},
                    { "team": { "abbreviation": "UTAH" }, "stats": [
                        { "name": "avgPointsFor", "value": 111.0 }
                    ]}
                ]},
                "children": [{
                    "name": "Pacific",
                    "standings": { "entries": [
                        { "team": { "abbreviation": "GS" }, "stats": [
                            { "name": "avgPointsFor", "value": 117.2 },
                            { "name": "avgPointsAgainst", "value": 113.0 }
                        ]}
                    ]}
                }]
            }]
        }))
        .unwrap();

        let lines = collect_points(&response);
        assert_eq!(lines, vec![line("GSW", 117.2, 113.0)]);
    }
}
