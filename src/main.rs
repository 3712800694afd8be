mod app;
mod render;
mod state;

use crate::app::App;
use crate::state::app_settings::AppSettings;
use crate::state::app_state::Mode;
use crate::state::messages::{NetworkRequest, NetworkResponse};
use crate::state::network::NetworkWorker;
use crate::state::refresher::PeriodicRefresher;
use anyhow::{Context, bail};
use chrono::{Local, NaiveDate};
use clap::Parser;
use log::{error, warn};
use nba_api::teams;
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "sqorz", version, about = "NBA scores, odds, box scores and previews from ESPN")]
struct Cli {
    /// Day to show (YYYY-MM-DD or YYYYMMDD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Last ten results and next ten games for one team (e.g. PHX, GS).
    #[arg(long, conflicts_with = "date")]
    team: Option<String>,

    /// Keep refreshing every SQORZ_REFRESH_SECS seconds.
    #[arg(long)]
    watch: bool,

    /// League standings, optionally one conference.
    #[arg(long, value_name = "CONFERENCE", num_args = 0..=1, default_missing_value = "all")]
    standings: Option<String>,

    /// Pregame preview for an ESPN event id (lineups, injuries, news).
    #[arg(long, value_name = "EVENT_ID", conflicts_with_all = ["team", "standings"])]
    preview: Option<String>,

    /// Print the game snapshot as JSON.
    #[arg(long)]
    json: bool,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y%m%d"))
        .map_err(|_| format!("expected YYYY-MM-DD, got {raw:?}"))
}

impl Cli {
    fn mode(&self) -> anyhow::Result<Mode> {
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        if let Some(event_id) = &self.preview {
            return Ok(Mode::Preview { event_id: event_id.clone(), date });
        }
        if let Some(conference) = &self.standings {
            let filter = match conference.to_lowercase().as_str() {
                "all" => None,
                c @ ("east" | "west") => Some(c.to_string()),
                other => bail!("unknown conference {other:?}, expected east or west"),
            };
            return Ok(Mode::Standings(filter));
        }
        if let Some(team) = &self.team {
            let code = teams::normalize(&team.to_uppercase()).to_string();
            if !teams::is_nba(&code) {
                bail!("unknown team {team:?}");
            }
            return Ok(Mode::Team(code));
        }
        Ok(Mode::Date(date))
    }
}

fn init_logger(settings: &AppSettings) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if let Some(filter) = &settings.log_filter {
        builder.parse_filters(filter);
    }
    builder.format_timestamp_millis().init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    better_panic::install();

    let settings = AppSettings::load();
    init_logger(&settings);

    let mode = cli.mode()?;
    let mut app = App::new(settings, mode);

    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    // Network thread
    let network_worker = NetworkWorker::new(&app.settings, network_req_rx, network_resp_tx);
    let network_task = tokio::spawn(network_worker.run());

    for request in app.startup_requests() {
        network_req_tx.send(request).await.context("network worker stopped")?;
    }

    // Periodic score refresh thread
    let periodic_task = match app.refresh_request() {
        Some(request) if cli.watch => {
            let refresher = PeriodicRefresher::new(network_req_tx.clone(), request, app.settings.refresh_interval);
            Some(tokio::spawn(refresher.run()))
        }
        _ => None,
    };

    main_loop(&mut app, network_resp_rx, cli.watch, cli.json).await?;

    network_task.abort();
    if let Some(task) = periodic_task {
        task.abort();
    }
    Ok(())
}

async fn main_loop(
    app: &mut App,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
    watch: bool,
    json: bool,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            response = network_responses.recv() => {
                let Some(response) = response else {
                    bail!("network worker stopped");
                };
                if handle_network_response(response, app) {
                    print(app, json)?;
                    if !watch {
                        return Ok(());
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

/// Apply a response; true when there is a finished snapshot to print.
fn handle_network_response(response: NetworkResponse, app: &mut App) -> bool {
    let was_complete = app.state.is_complete();
    match response {
        NetworkResponse::SeasonStatsLoaded { teams } => {
            if teams == 0 {
                warn!("season averages unavailable; ranks will show as '-'");
            }
            return false;
        }
        NetworkResponse::GamesLoaded { games } => app.on_games_loaded(games),
        NetworkResponse::GameUpdated { update } => app.on_game_updated(update),
        NetworkResponse::UpdatesFinished => app.on_updates_finished(),
        NetworkResponse::StandingsLoaded { rows } => app.on_standings_loaded(rows),
        NetworkResponse::PreviewLoaded { preview } => app.on_preview_loaded(*preview),
        NetworkResponse::RateLimited { message } => {
            warn!("{message}");
            app.on_rate_limited(message);
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            app.on_error(message);
        }
    }
    app.state.is_complete() && !was_complete
}

fn print(app: &mut App, json: bool) -> anyhow::Result<()> {
    let state = &app.state;
    let hide_scores = app.settings.hide_scores;
    let text = match &state.mode {
        Mode::Date(_) | Mode::Team(_) if json => render::games_json(&state.games)?,
        Mode::Preview { .. } if json => match &state.preview {
            Some(preview) => serde_json::to_string_pretty(preview)?,
            None => render::games_report(state, hide_scores),
        },
        Mode::Standings(_) if json => serde_json::to_string_pretty(&state.standings)?,
        Mode::Date(_) | Mode::Team(_) => render::games_report(state, hide_scores),
        Mode::Standings(filter) => match state.last_error.as_ref().or(state.rate_limit_banner.as_ref()) {
            Some(error) => format!("! {error}"),
            None => render::standings_report(&state.standings, filter.as_deref()),
        },
        Mode::Preview { .. } => match &state.preview {
            Some(preview) => render::preview_report(preview, hide_scores),
            None => render::games_report(state, hide_scores),
        },
    };
    println!("{text}");
    // Watch mode prints again once the next snapshot is complete.
    app.state.games_loaded = false;
    Ok(())
}
