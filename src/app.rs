use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AppState, Mode, Preview};
use crate::state::messages::NetworkRequest;
use nba_api::standings::StandingRow;
use nba_api::{EnrichedGame, GameUpdate};

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
}

impl App {
    pub fn new(settings: AppSettings, mode: Mode) -> Self {
        Self { settings, state: AppState::new(mode) }
    }

    /// Requests sent once at startup, in order.
    pub fn startup_requests(&self) -> Vec<NetworkRequest> {
        match &self.state.mode {
            Mode::Date(date) => vec![NetworkRequest::LoadSeasonStats, NetworkRequest::LoadGames { date: *date }],
            Mode::Team(code) => vec![
                NetworkRequest::LoadSeasonStats,
                NetworkRequest::LoadTeamGames { code: code.clone() },
            ],
            Mode::Standings(_) => vec![NetworkRequest::LoadStandings],
            Mode::Preview { event_id, date } => vec![
                NetworkRequest::LoadSeasonStats,
                NetworkRequest::LoadPreview { event_id: event_id.clone(), date: *date },
            ],
        }
    }

    /// What watch mode re-issues on every tick. Standings and previews are
    /// not refreshed.
    pub fn refresh_request(&self) -> Option<NetworkRequest> {
        match &self.state.mode {
            Mode::Date(date) => Some(NetworkRequest::RefreshScores { date: *date }),
            Mode::Team(code) => Some(NetworkRequest::LoadTeamGames { code: code.clone() }),
            Mode::Standings(_) | Mode::Preview { .. } => None,
        }
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from the main loop
    // -----------------------------------------------------------------------

    pub fn on_games_loaded(&mut self, games: Vec<EnrichedGame>) {
        self.state.load_games(games);
    }

    pub fn on_game_updated(&mut self, update: GameUpdate) {
        self.state.apply_update(&update);
    }

    pub fn on_updates_finished(&mut self) {
        self.state.updates_pending = false;
    }

    pub fn on_standings_loaded(&mut self, rows: Vec<StandingRow>) {
        self.state.last_error = None;
        self.state.standings = rows;
    }

    pub fn on_preview_loaded(&mut self, preview: Preview) {
        self.state.last_error = None;
        self.state.preview = Some(preview);
    }

    pub fn on_rate_limited(&mut self, message: String) {
        self.state.rate_limit_banner = Some(message);
        // Nothing new is coming for this snapshot.
        self.state.games_loaded = true;
        self.state.updates_pending = false;
    }

    pub fn on_error(&mut self, message: String) {
        self.state.last_error = Some(message);
        if matches!(self.state.mode, Mode::Date(_) | Mode::Team(_)) {
            self.state.games_loaded = true;
            self.state.updates_pending = false;
        }
    }
}
