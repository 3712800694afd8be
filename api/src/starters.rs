//! Projected lineups for a matchup preview.

use crate::boxscore::BoxScoreCache;
use crate::client::NbaApi;
use crate::espn::{AthleteStatsResponse, DepthChartResponse, EspnAthlete, EspnStat, RosterResponse, SummaryResponse};
use crate::injuries::{find_injury, Injury, InjuryFetcher};
use crate::PLACEHOLDER;
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

const STARTERS: usize = 5;
const NAME_SUFFIXES: [&str; 6] = ["Jr.", "Sr.", "II", "III", "IV", "V"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonLine {
    pub gp: String,
    pub ppg: String,
    pub rpg: String,
    pub apg: String,
    pub mpg: String,
    pub fg_pct: String,
    pub fg3_pct: String,
    pub ft_pct: String,
    pub spg: String,
    pub bpg: String,
    pub tov: String,
    pub pf: String,
}

impl SeasonLine {
    fn has_averages(&self) -> bool {
        [&self.ppg, &self.rpg, &self.apg].iter().any(|v| v.as_str() != PLACEHOLDER)
    }

    fn points(&self) -> f64 {
        self.ppg.parse().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub position: String,
    pub jersey: String,
    pub headshot: String,
    pub season: Option<SeasonLine>,
    pub injury: Option<Injury>,
}

impl Player {
    pub fn from_athlete(athlete: &EspnAthlete) -> Self {
        let name = athlete
            .display_name
            .clone()
            .or_else(|| athlete.full_name.clone())
            .unwrap_or_else(|| "Unknown".into());
        Self {
            id: athlete.id.clone().unwrap_or_default(),
            display_name: short_name(&name),
            name,
            position: athlete
                .position
                .as_ref()
                .and_then(|p| p.abbreviation.clone())
                .unwrap_or_default(),
            jersey: athlete.jersey.clone().unwrap_or_default(),
            headshot: athlete
                .headshot
                .as_ref()
                .and_then(|h| h.href.clone())
                .unwrap_or_default(),
            season: None,
            injury: None,
        }
    }
}

/// "LeBron James" → "L. James", "Jaren Jackson Jr." → "J. Jackson Jr.".
pub fn short_name(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    let [first, .., last] = parts.as_slice() else {
        return name.to_string();
    };
    let initial = first.chars().next().map(String::from).unwrap_or_default();
    if parts.len() > 2 && NAME_SUFFIXES.contains(last) {
        return format!("{initial}. {} {last}", parts[parts.len() - 2]);
    }
    format!("{initial}. {last}")
}

/// First five athletes listed for the team in a game summary.
pub fn starters_from_summary<'a>(summary: &'a SummaryResponse, team_id: &str) -> Vec<&'a EspnAthlete> {
    summary
        .boxscore
        .iter()
        .flat_map(|b| b.players.iter().flatten())
        .find(|p| p.team.as_ref().and_then(|t| t.id.as_deref()) == Some(team_id))
        .and_then(|p| p.statistics.as_ref()?.first())
        .map(|group| {
            group
                .athletes
                .iter()
                .flatten()
                .filter_map(|a| a.athlete.as_ref())
                .take(STARTERS)
                .collect()
        })
        .unwrap_or_default()
}

/// Top of the depth chart at each position, five at most.
pub fn starters_from_depth_chart(chart: &DepthChartResponse) -> Vec<&EspnAthlete> {
    let Some(positions) = chart
        .items
        .as_ref()
        .and_then(|items| items.first())
        .and_then(|c| c.positions.as_ref())
    else {
        return Vec::new();
    };
    positions
        .iter()
        .filter_map(|p| p.athletes.as_ref()?.first())
        .map(|slot| slot.athlete())
        .take(STARTERS)
        .collect()
}

/// Active roster players that have an id.
pub fn roster_players(roster: &RosterResponse) -> Vec<&EspnAthlete> {
    roster
        .athletes
        .iter()
        .flatten()
        .filter(|a| a.active != Some(false))
        .filter(|a| a.id.as_deref().is_some_and(|id| !id.is_empty()))
        .collect()
}

fn find_stat<'a>(stats: &[&'a EspnStat], names: &[&str]) -> Option<&'a EspnStat> {
    names.iter().find_map(|name| {
        stats.iter().copied().find(|s| {
            s.name.as_deref() == Some(name)
                || s.abbreviation.as_deref() == Some(name)
                || s.display_name.as_deref() == Some(name)
        })
    })
}

fn stat_text(stats: &[&EspnStat], names: &[&str]) -> String {
    find_stat(stats, names)
        .and_then(|s| {
            s.display_value
                .clone()
                .filter(|v| !v.is_empty())
                .or_else(|| s.value.map(|v| v.to_string()))
        })
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Season averages from an athlete statistics payload. `None` when the
/// payload is for another season, the player has not appeared in a game or
/// nothing useful is listed.
pub fn season_line(response: &AthleteStatsResponse, season: i32) -> Option<SeasonLine> {
    if let Some(year) = response.season.as_ref().and_then(|s| s.year)
        && year != season
    {
        return None;
    }

    let stats: Vec<&EspnStat> = response.all_stats().collect();
    let gp = stat_text(&stats, &["gamesPlayed", "games", "GP", "totalGames", "gp"]);
    if gp.parse::<f64>().map_or(true, |games| games < 1.0) {
        return None;
    }

    let line = SeasonLine {
        gp,
        ppg: stat_text(&stats, &["avgPoints", "pointsPerGame", "PPG"]),
        rpg: stat_text(&stats, &["avgRebounds", "reboundsPerGame", "RPG"]),
        apg: stat_text(&stats, &["avgAssists", "assistsPerGame", "APG"]),
        mpg: stat_text(&stats, &["avgMinutes", "minutesPerGame", "MPG"]),
        fg_pct: stat_text(&stats, &["fieldGoalPct", "fieldGoalPctg", "FG%"]),
        fg3_pct: stat_text(&stats, &["threePointFieldGoalPct", "threePointPct", "3P%"]),
        ft_pct: stat_text(&stats, &["freeThrowPct", "freeThrowPctg", "FT%"]),
        spg: stat_text(&stats, &["avgSteals", "stealsPerGame", "SPG"]),
        bpg: stat_text(&stats, &["avgBlocks", "blocksPerGame", "BPG"]),
        tov: stat_text(&stats, &["avgTurnovers", "turnoversPerGame", "TOV"]),
        pf: stat_text(&stats, &["avgPersonalFouls", "foulsPerGame", "PF"]),
    };
    line.has_averages().then_some(line)
}

/// Which team a lineup is for.
#[derive(Debug, Clone)]
pub struct LineupRequest<'a> {
    pub event_id: Option<&'a str>,
    pub team_id: &'a str,
    pub code: &'a str,
    pub team_name: &'a str,
    pub date: NaiveDate,
}

#[derive(Debug)]
pub struct LineupFetcher {
    api: NbaApi,
    box_scores: Arc<BoxScoreCache>,
    injuries: Option<Arc<InjuryFetcher>>,
    season: i32,
}

impl LineupFetcher {
    pub fn new(
        api: NbaApi,
        box_scores: Arc<BoxScoreCache>,
        injuries: Option<Arc<InjuryFetcher>>,
        season: i32,
    ) -> Self {
        Self { api, box_scores, injuries, season }
    }

    /// Starters from the game summary, else the depth chart, else the
    /// roster's top scorers. Every player carries season averages and any
    /// listed injury.
    pub async fn lineup(&self, request: &LineupRequest<'_>, now: DateTime<Utc>) -> Vec<Player> {
        if request.team_id.is_empty() {
            warn!("no ESPN team id for {}, cannot build lineup", request.code);
            return Vec::new();
        }

        let mut players = self.base_lineup(request).await;
        if players.is_empty() {
            info!("no lineup available for {}", request.code);
            return players;
        }

        if let Some(injuries) = &self.injuries {
            let report = injuries
                .team_injuries(request.date, now, request.team_name, request.code)
                .await;
            for player in &mut players {
                player.injury = find_injury(&player.name, &player.display_name, &report).cloned();
            }
        }
        players
    }

    async fn base_lineup(&self, request: &LineupRequest<'_>) -> Vec<Player> {
        if let Some(event_id) = request.event_id {
            match self.box_scores.get(event_id).await {
                Ok(summary) => {
                    let starters = starters_from_summary(&summary, request.team_id);
                    if !starters.is_empty() {
                        debug!("{} starters from game summary", request.code);
                        return self.with_season_lines(starters).await;
                    }
                }
                Err(e) => debug!("summary for {event_id} unavailable: {e}"),
            }
        }

        match self.api.fetch_depth_chart(request.team_id).await {
            Ok(chart) => {
                let starters = starters_from_depth_chart(&chart);
                if !starters.is_empty() {
                    debug!("{} starters from depth chart", request.code);
                    return self.with_season_lines(starters).await;
                }
            }
            Err(e) => debug!("depth chart for {} unavailable: {e}", request.code),
        }

        match self.api.fetch_roster(request.team_id).await {
            Ok(roster) => {
                let mut players: Vec<Player> = self
                    .with_season_lines(roster_players(&roster))
                    .await
                    .into_iter()
                    .filter(|p| p.season.is_some())
                    .collect();
                players.sort_by(|a, b| {
                    let points = |p: &Player| p.season.as_ref().map_or(0.0, SeasonLine::points);
                    points(b).total_cmp(&points(a))
                });
                players
            }
            Err(e) => {
                warn!("roster for {} unavailable: {e}", request.code);
                Vec::new()
            }
        }
    }

    async fn with_season_lines(&self, athletes: Vec<&EspnAthlete>) -> Vec<Player> {
        let players: Vec<Player> = athletes.into_iter().map(Player::from_athlete).collect();
        let lines = join_all(players.iter().map(|p| self.season_for(&p.id))).await;
        players
            .into_iter()
            .zip(lines)
            .map(|(player, season)| Player { season, ..player })
            .collect()
    }

    async fn season_for(&self, athlete_id: &str) -> Option<SeasonLine> {
        if athlete_id.is_empty() {
            return None;
        }
        match self.api.fetch_athlete_statistics(athlete_id, self.season).await {
            Ok(response) => season_line(&response, self.season),
            Err(e) => {
                debug!("no season stats for athlete {athlete_id}: {e}");
                None
            }
        }
    }
}
