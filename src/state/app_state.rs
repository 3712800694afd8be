use chrono::{DateTime, Local, NaiveDate};
use nba_api::news::NewsArticle;
use nba_api::standings::StandingRow;
use nba_api::starters::Player;
use nba_api::{EnrichedGame, GameUpdate};
use serde::Serialize;

/// What the user asked to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Date(NaiveDate),
    Team(String),
    /// Optional conference filter ("east", "west").
    Standings(Option<String>),
    Preview { event_id: String, date: NaiveDate },
}

/// Everything needed to print a matchup preview.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub game: EnrichedGame,
    pub away_lineup: Vec<Player>,
    pub home_lineup: Vec<Player>,
    pub away_news: Vec<NewsArticle>,
    pub home_news: Vec<NewsArticle>,
}

#[derive(Debug)]
pub struct AppState {
    pub mode: Mode,
    pub games: Vec<EnrichedGame>,
    pub games_loaded: bool,
    /// Background enrichment for the current snapshot is still reporting.
    pub updates_pending: bool,
    pub standings: Vec<StandingRow>,
    pub preview: Option<Preview>,
    pub last_error: Option<String>,
    /// Shown above the games until a refresh succeeds.
    pub rate_limit_banner: Option<String>,
    pub last_updated: Option<DateTime<Local>>,
}

impl AppState {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            games: Vec::new(),
            games_loaded: false,
            updates_pending: false,
            standings: Vec::new(),
            preview: None,
            last_error: None,
            rate_limit_banner: None,
            last_updated: None,
        }
    }

    /// Replace the snapshot. Box scores and streaks already known for a game
    /// are carried over until the new background results arrive.
    pub fn load_games(&mut self, mut games: Vec<EnrichedGame>) {
        for game in &mut games {
            if let Some(previous) = self.games.iter().find(|g| g.id == game.id) {
                carry_over(previous, game);
            }
        }
        self.games = games;
        self.games_loaded = true;
        self.updates_pending = true;
        self.rate_limit_banner = None;
        self.last_error = None;
        self.last_updated = Some(Local::now());
    }

    pub fn apply_update(&mut self, update: &GameUpdate) {
        if let Some(game) = self.games.iter_mut().find(|g| g.id == update.game_id) {
            game.apply(update);
        }
    }

    /// True once there is nothing left to wait for in one-shot mode.
    fn failed(&self) -> bool {
        self.last_error.is_some() || self.rate_limit_banner.is_some()
    }

    pub fn is_complete(&self) -> bool {
        match self.mode {
            Mode::Date(_) | Mode::Team(_) => self.games_loaded && !self.updates_pending,
            Mode::Standings(_) => !self.standings.is_empty() || self.failed(),
            Mode::Preview { .. } => self.preview.is_some() || self.failed(),
        }
    }
}

fn carry_over(previous: &EnrichedGame, game: &mut EnrichedGame) {
    for (old, new) in [
        (&previous.away_team, &mut game.away_team),
        (&previous.home_team, &mut game.home_team),
    ] {
        if new.box_stats.is_none() {
            new.box_stats = old.box_stats.clone();
        }
        if new.streak.is_none() {
            new.streak = old.streak.clone();
        }
    }
    if game.box_score.is_none() {
        game.box_score = previous.box_score.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nba_api::{GameStatus, StatRecord, TeamView, UpdateKind};

    fn game(id: u64) -> EnrichedGame {
        EnrichedGame {
            id,
            status: GameStatus::In,
            away_team: TeamView { code: "LAL".into(), stats_loading: true, ..Default::default() },
            home_team: TeamView { code: "PHX".into(), stats_loading: true, ..Default::default() },
            ..Default::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 28).unwrap()
    }

    #[test]
    fn refresh_keeps_known_box_scores() {
        let mut state = AppState::new(Mode::Date(today()));
        state.load_games(vec![game(1)]);
        state.apply_update(&GameUpdate {
            game_id: 1,
            kind: UpdateKind::Streaks { away: Some("W 2".into()), home: None },
        });
        state.games[0].home_team.box_stats = Some(StatRecord { rebounds: Some("40".into()), ..Default::default() });

        state.load_games(vec![game(1), game(2)]);
        assert_eq!(state.games.len(), 2);
        assert_eq!(state.games[0].away_team.streak.as_deref(), Some("W 2"));
        assert!(state.games[0].home_team.box_stats.is_some());
        assert!(state.games[1].home_team.box_stats.is_none());
    }

    #[test]
    fn one_shot_completes_after_updates() {
        let mut state = AppState::new(Mode::Team("PHX".into()));
        assert!(!state.is_complete());
        state.load_games(vec![game(1)]);
        assert!(!state.is_complete());
        state.updates_pending = false;
        assert!(state.is_complete());
    }

    #[test]
    fn updates_for_unknown_games_are_ignored() {
        let mut state = AppState::new(Mode::Date(today()));
        state.load_games(vec![game(1)]);
        state.apply_update(&GameUpdate { game_id: 9, kind: UpdateKind::StatsUnavailable });
        assert!(state.games[0].home_team.stats_loading);
        state.apply_update(&GameUpdate { game_id: 1, kind: UpdateKind::StatsUnavailable });
        assert!(!state.games[0].home_team.stats_loading);
    }
}
