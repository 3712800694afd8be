use crate::state::app_settings::AppSettings;
use crate::state::app_state::Preview;
use crate::state::messages::{NetworkRequest, NetworkResponse};
use chrono::{Local, NaiveDate, Utc};
use log::{debug, error, info};
use nba_api::{EnrichedGame, TeamView};
use nba_api::boxscore::BoxScoreCache;
use nba_api::client::{ApiError, NbaApi};
use nba_api::enrich::{GameEnricher, UpdateStream};
use nba_api::games::Scoreboard;
use nba_api::injuries::{InjuryCache, InjuryFetcher};
use nba_api::news::NewsAggregator;
use nba_api::season_stats::{SeasonStatsRepository, season_year};
use nba_api::standings::{StandingsCache, StreakFetcher};
use nba_api::starters::{LineupFetcher, LineupRequest};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Owns the library services and answers requests from the main loop.
pub struct NetworkWorker {
    scoreboard: Arc<Scoreboard>,
    standings: Arc<StandingsCache>,
    lineups: Arc<LineupFetcher>,
    news: Arc<NewsAggregator>,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    /// Update stream of the snapshot being sent; forwarded after it.
    pending_updates: Option<UpdateStream>,
}

impl NetworkWorker {
    pub fn new(
        settings: &AppSettings,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        let api = NbaApi::new();
        let box_scores = Arc::new(BoxScoreCache::new(api.clone()));
        let standings = Arc::new(StandingsCache::new(api.clone()));
        let enricher = GameEnricher::new(box_scores.clone(), Arc::new(StreakFetcher::new(standings.clone())));
        let stats = Arc::new(SeasonStatsRepository::new(api.clone()));

        let injury_cache = match &settings.injury_cache {
            Some(path) => InjuryCache::load(path.clone()),
            None => InjuryCache::in_memory(),
        };
        let injuries = settings.injury_api_key.as_ref().map(|key| {
            Arc::new(InjuryFetcher::new(api.clone(), Some(key.clone()), injury_cache))
        });

        Self {
            scoreboard: Arc::new(Scoreboard::new(api.clone(), stats, enricher)),
            standings,
            lineups: Arc::new(LineupFetcher::new(
                api.clone(),
                box_scores,
                injuries,
                season_year(Utc::now()),
            )),
            news: Arc::new(NewsAggregator::new(api)),
            requests,
            responses,
            pending_updates: None,
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            let result = match request {
                NetworkRequest::LoadSeasonStats => self.handle_load_season_stats().await,
                NetworkRequest::LoadGames { date } => self.handle_load_games(date).await,
                NetworkRequest::RefreshScores { date } => {
                    self.scoreboard.invalidate(date);
                    self.handle_load_games(date).await
                }
                NetworkRequest::LoadTeamGames { code } => self.handle_load_team_games(&code).await,
                NetworkRequest::LoadStandings => self.handle_load_standings().await,
                NetworkRequest::LoadPreview { event_id, date } => {
                    self.handle_load_preview(&event_id, date).await
                }
            };
            debug!("network request complete");

            let response = result.unwrap_or_else(|err| match err {
                ApiError::RateLimited { .. } => NetworkResponse::RateLimited { message: err.to_string() },
                _ => NetworkResponse::Error { message: err.to_string() },
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
            if let Some(updates) = self.pending_updates.take() {
                self.forward_updates(updates);
            }
        }
    }

    async fn handle_load_season_stats(&self) -> Result<NetworkResponse, ApiError> {
        let teams = self.scoreboard.stats().refresh().await;
        info!("season stats ready for {teams} teams");
        Ok(NetworkResponse::SeasonStatsLoaded { teams })
    }

    async fn handle_load_games(&mut self, date: NaiveDate) -> Result<NetworkResponse, ApiError> {
        debug!("loading games for {date}");
        let (games, updates) = self.scoreboard.games_for_date(date, Utc::now()).await?;
        self.pending_updates = Some(updates);
        Ok(NetworkResponse::GamesLoaded { games })
    }

    async fn handle_load_team_games(&mut self, code: &str) -> Result<NetworkResponse, ApiError> {
        let today = Local::now().date_naive();
        // Today's results change while games are live.
        self.scoreboard.invalidate(today);
        let (games, updates) = self.scoreboard.games_for_team(code, today, Utc::now()).await;
        self.pending_updates = Some(updates);
        Ok(NetworkResponse::GamesLoaded { games })
    }

    async fn handle_load_standings(&self) -> Result<NetworkResponse, ApiError> {
        let rows = self.standings.table().await?;
        Ok(NetworkResponse::StandingsLoaded { rows })
    }

    async fn handle_load_preview(&self, event_id: &str, date: NaiveDate) -> Result<NetworkResponse, ApiError> {
        let (games, _updates) = self.scoreboard.games_for_date(date, Utc::now()).await?;
        let game = games
            .into_iter()
            .find(|g| g.event_id == event_id)
            .ok_or_else(|| ApiError::NotFound(format!("event {event_id} on {date}")))?;

        let preview = build_preview(&self.lineups, &self.news, game, date).await;
        Ok(NetworkResponse::PreviewLoaded { preview: Box::new(preview) })
    }

    /// Relay background enrichment to the main loop, then signal that the
    /// snapshot is complete. Must run after the snapshot itself was sent.
    fn forward_updates(&self, mut updates: UpdateStream) {
        let responses = self.responses.clone();
        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                if responses.send(NetworkResponse::GameUpdated { update }).await.is_err() {
                    return;
                }
            }
            let _ = responses.send(NetworkResponse::UpdatesFinished).await;
        });
    }
}

fn lineup_request<'a>(game: &'a EnrichedGame, team: &'a TeamView, date: NaiveDate) -> LineupRequest<'a> {
    LineupRequest {
        event_id: Some(game.event_id.as_str()),
        team_id: &team.espn_team_id,
        code: &team.code,
        team_name: &team.name,
        date,
    }
}

async fn build_preview(
    lineups: &LineupFetcher,
    news: &NewsAggregator,
    game: EnrichedGame,
    date: NaiveDate,
) -> Preview {
    let away = lineup_request(&game, &game.away_team, date);
    let home = lineup_request(&game, &game.home_team, date);
    let now = Utc::now();

    let (away_lineup, home_lineup, away_news, home_news) = tokio::join!(
        lineups.lineup(&away, now),
        lineups.lineup(&home, now),
        news.team_news(&game.away_team.espn_team_id, &game.away_team.code, &game.away_team.name),
        news.team_news(&game.home_team.espn_team_id, &game.home_team.code, &game.home_team.name),
    );

    Preview { away_lineup, home_lineup, away_news, home_news, game }
}
