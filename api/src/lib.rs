pub mod betting;
pub mod boxscore;
pub mod client;
pub mod enrich;
pub mod espn;
pub mod games;
pub mod injuries;
pub mod news;
pub mod season_stats;
pub mod standings;
pub mod starters;
pub mod teams;

use crate::espn::SummaryResponse;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Placeholder shown while a season stat or rank is unknown.
pub const PLACEHOLDER: &str = "-";

// ---------------------------------------------------------------------------
// Domain types: clean model, independent of ESPN wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Pre,
    In,
    Post,
}

impl GameStatus {
    /// ESPN's `status.type.state`. Anything unrecognised is treated as scheduled.
    pub fn from_state(state: &str) -> Self {
        match state {
            "in" => GameStatus::In,
            "post" => GameStatus::Post,
            _ => GameStatus::Pre,
        }
    }
}

/// Per-team season scoring averages and their league ranks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonStat {
    pub code: String,
    pub points_for: f64,
    pub points_against: f64,
    pub offensive_rank: u32,
    pub defensive_rank: u32,
}

/// A team's box score totals, looked up by stat name with per-field defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRecord {
    pub fg_pct: Option<String>,
    pub three_pm: Option<String>,
    pub three_pa: Option<String>,
    pub ft_m: Option<String>,
    pub ft_a: Option<String>,
    pub turnovers: Option<String>,
    pub rebounds: Option<String>,
    pub assists: Option<String>,
    pub steals: Option<String>,
    pub blocks: Option<String>,
    pub fast_break_points: Option<String>,
    pub points_in_paint: Option<String>,
    pub bench_points: Option<String>,
    pub biggest_lead: Option<String>,
}

impl StatRecord {
    pub fn is_empty(&self) -> bool {
        *self == StatRecord::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamView {
    pub code: String,
    pub name: String,
    pub record: String,
    pub logo: String,
    pub color: String,
    pub ppg: String,
    pub ppg_rank: String,
    pub oppg: String,
    pub oppg_rank: String,
    pub score: Option<u16>,
    #[serde(rename = "box")]
    pub box_stats: Option<StatRecord>,
    pub stats_loading: bool,
    pub espn_team_id: String,
    pub streak: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub arena: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrichedGame {
    pub id: u64,
    pub event_id: String,
    pub away_team: TeamView,
    pub home_team: TeamView,
    pub status: GameStatus,
    pub status_detail: Option<String>,
    pub date: String,
    pub time: String,
    pub network: String,
    /// Home-relative: negative means the home team is favored. Empty without odds.
    pub spread: String,
    pub total: String,
    pub period: Option<u8>,
    pub clock: Option<String>,
    pub venue: Option<Venue>,
    #[serde(skip)]
    pub box_score: Option<Arc<SummaryResponse>>,
}

impl PartialEq for EnrichedGame {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.event_id == other.event_id
            && self.away_team == other.away_team
            && self.home_team == other.home_team
            && self.status == other.status
            && self.status_detail == other.status_detail
            && self.date == other.date
            && self.time == other.time
            && self.network == other.network
            && self.spread == other.spread
            && self.total == other.total
            && self.period == other.period
            && self.clock == other.clock
            && self.venue == other.venue
            && self.box_score.is_some() == other.box_score.is_some()
    }
}

impl EnrichedGame {
    pub fn is_live(&self) -> bool {
        self.status == GameStatus::In
    }

    pub fn is_final(&self) -> bool {
        self.status == GameStatus::Post
    }

    pub fn has_odds(&self) -> bool {
        !self.spread.is_empty() && !self.total.is_empty()
    }

    /// "Final", "Final/OT", "Final/2OT", or whatever ESPN said instead
    /// (e.g. "Postponed").
    pub fn final_label(&self) -> String {
        if let Some(detail) = self.status_detail.as_deref()
            && !detail.is_empty()
            && detail != "Final"
        {
            return detail.to_string();
        }
        match self.period {
            Some(5) => "Final/OT".to_string(),
            Some(p) if p > 5 => format!("Final/{}OT", p - 4),
            _ => "Final".to_string(),
        }
    }

    /// Fold a background update into the game. Updates only fill in or
    /// overwrite data; a populated field never goes back to a placeholder.
    pub fn apply(&mut self, update: &GameUpdate) {
        match &update.kind {
            UpdateKind::BoxScore { away, home, summary } => {
                if !away.is_empty() || self.away_team.box_stats.is_none() {
                    self.away_team.box_stats = Some(away.clone());
                }
                if !home.is_empty() || self.home_team.box_stats.is_none() {
                    self.home_team.box_stats = Some(home.clone());
                }
                self.box_score = Some(summary.clone());
                self.away_team.stats_loading = false;
                self.home_team.stats_loading = false;
            }
            UpdateKind::StatsUnavailable => {
                self.away_team.stats_loading = false;
                self.home_team.stats_loading = false;
            }
            UpdateKind::Streaks { away, home } => {
                if away.is_some() {
                    self.away_team.streak = away.clone();
                }
                if home.is_some() {
                    self.home_team.streak = home.clone();
                }
            }
        }
    }
}

/// Result of a completed game against its closing line. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BettingResult {
    pub covering_team_code: String,
    pub display_spread: String,
    pub over_under: OverUnder,
    pub total: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OverUnder {
    #[serde(rename = "O")]
    Over,
    #[serde(rename = "U")]
    Under,
}

impl OverUnder {
    pub fn letter(&self) -> char {
        match self {
            OverUnder::Over => 'O',
            OverUnder::Under => 'U',
        }
    }
}

/// Incremental result of background enrichment, keyed by game id.
#[derive(Debug, Clone)]
pub struct GameUpdate {
    pub game_id: u64,
    pub kind: UpdateKind,
}

#[derive(Debug, Clone)]
pub enum UpdateKind {
    BoxScore {
        away: StatRecord,
        home: StatRecord,
        summary: Arc<SummaryResponse>,
    },
    /// Box score could not be loaded; only clears the loading flags.
    StatsUnavailable,
    Streaks {
        away: Option<String>,
        home: Option<String>,
    },
}

/// Apply a batch of updates to whichever games they belong to.
pub fn merge_updates(games: &mut [EnrichedGame], updates: impl IntoIterator<Item = GameUpdate>) {
    for update in updates {
        if let Some(game) = games.iter_mut().find(|g| g.id == update.game_id) {
            game.apply(&update);
        }
    }
}
