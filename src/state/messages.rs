use chrono::NaiveDate;
use nba_api::standings::StandingRow;
use nba_api::{EnrichedGame, GameUpdate};

use crate::state::app_state::Preview;

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadSeasonStats,
    LoadGames { date: NaiveDate },
    LoadTeamGames { code: String },
    /// Drop the cached day and load it again (watch mode).
    RefreshScores { date: NaiveDate },
    LoadStandings,
    LoadPreview { event_id: String, date: NaiveDate },
}

#[derive(Debug)]
pub enum NetworkResponse {
    SeasonStatsLoaded { teams: usize },
    GamesLoaded { games: Vec<EnrichedGame> },
    /// One background result for a game in the current snapshot.
    GameUpdated { update: GameUpdate },
    /// Every background task for the last snapshot has reported.
    UpdatesFinished,
    StandingsLoaded { rows: Vec<StandingRow> },
    PreviewLoaded { preview: Box<Preview> },
    RateLimited { message: String },
    Error { message: String },
}
