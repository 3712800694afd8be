//! Plain-text and JSON output.

use crate::state::app_state::{AppState, Preview};
use nba_api::betting::calculate_betting_result;
use nba_api::news::NewsArticle;
use nba_api::standings::{conference_rows, StandingRow};
use nba_api::starters::Player;
use nba_api::{BettingResult, EnrichedGame, GameStatus, PLACEHOLDER, TeamView};
use serde::Serialize;
use std::fmt::Write;

const HIDDEN_SCORE: &str = "**";

fn score(team: &TeamView, hide_scores: bool) -> String {
    match team.score {
        _ if hide_scores => HIDDEN_SCORE.to_string(),
        Some(points) => points.to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

fn status_column(game: &EnrichedGame) -> String {
    match game.status {
        GameStatus::Post => game.final_label(),
        _ => game.time.clone(),
    }
}

fn season_line(team: &TeamView) -> String {
    let mut line = format!("{} ({})", team.code, team.record);
    if team.ppg != PLACEHOLDER {
        let _ = write!(line, " {} PPG {} / {} OPP {}", team.ppg, team.ppg_rank, team.oppg, team.oppg_rank);
    }
    if let Some(streak) = &team.streak {
        let _ = write!(line, " [{streak}]");
    }
    line
}

fn betting_column(result: &BettingResult) -> String {
    format!(
        "{} {} {}{}",
        result.covering_team_code,
        result.display_spread,
        result.over_under.letter(),
        result.total
    )
}

/// One line per game.
pub fn game_line(game: &EnrichedGame, hide_scores: bool) -> String {
    let status = status_column(game);
    let mut line = match game.status {
        GameStatus::Pre => format!(
            "{status:<10} {} @ {}",
            season_line(&game.away_team),
            season_line(&game.home_team)
        ),
        GameStatus::In | GameStatus::Post => format!(
            "{status:<10} {} {:>3} @ {} {:>3}",
            game.away_team.code,
            score(&game.away_team, hide_scores),
            game.home_team.code,
            score(&game.home_team, hide_scores),
        ),
    };

    match game.status {
        GameStatus::Post if !hide_scores => {
            if let Some(result) = calculate_betting_result(game) {
                let _ = write!(line, "  {}", betting_column(&result));
            }
        }
        _ if game.has_odds() => {
            let _ = write!(line, "  {} {}  O/U {}", game.home_team.code, game.spread, game.total);
        }
        _ => {}
    }
    if !game.network.is_empty() && game.status != GameStatus::Post {
        let _ = write!(line, "  {}", game.network);
    }
    line
}

fn box_line(team: &TeamView) -> Option<String> {
    let stats = team.box_stats.as_ref().filter(|s| !s.is_empty())?;
    let v = |value: &Option<String>| value.clone().unwrap_or_else(|| PLACEHOLDER.to_string());
    Some(format!(
        "           {:<4} FG {}%  3P {}-{}  FT {}-{}  REB {}  AST {}  STL {}  BLK {}  TO {}",
        team.code,
        v(&stats.fg_pct),
        v(&stats.three_pm),
        v(&stats.three_pa),
        v(&stats.ft_m),
        v(&stats.ft_a),
        v(&stats.rebounds),
        v(&stats.assists),
        v(&stats.steals),
        v(&stats.blocks),
        v(&stats.turnovers),
    ))
}

pub fn games_report(state: &AppState, hide_scores: bool) -> String {
    let mut out = String::new();
    if let Some(banner) = &state.rate_limit_banner {
        let _ = writeln!(out, "! {banner}");
    }
    if let Some(error) = &state.last_error {
        let _ = writeln!(out, "! {error}");
    }
    if state.games.is_empty() {
        if state.last_error.is_none() && state.rate_limit_banner.is_none() {
            let _ = writeln!(out, "No games scheduled.");
        }
        return out;
    }

    for game in &state.games {
        let _ = writeln!(out, "{}", game_line(game, hide_scores));
        if !hide_scores {
            for line in [box_line(&game.away_team), box_line(&game.home_team)].into_iter().flatten() {
                let _ = writeln!(out, "{line}");
            }
        }
    }
    if let Some(updated) = state.last_updated {
        let _ = writeln!(out, "Updated {}", updated.format("%-I:%M:%S %p"));
    }
    out
}

pub fn standings_report(rows: &[StandingRow], filter: Option<&str>) -> String {
    let rows: Vec<&StandingRow> = match filter {
        Some(f) => conference_rows(rows, f),
        None => rows.iter().collect(),
    };
    let mut out = format!(
        "{:<4} {:<24} {:>7} {:>6} {:>5} {:>7} {:>7} {:>7} {:>6}\n",
        "", "TEAM", "W-L", "PCT", "GB", "HOME", "ROAD", "L10", "STRK"
    );
    for (i, row) in rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<4} {:<24} {:>7} {:>6} {:>5} {:>7} {:>7} {:>7} {:>6}",
            i + 1,
            row.name,
            format!("{}-{}", row.wins, row.losses),
            row.win_pct,
            row.games_behind,
            row.home,
            row.road,
            row.last_ten,
            row.streak
        );
    }
    out
}

fn player_line(player: &Player) -> String {
    let mut line = format!("  {:<3} {:<20}", player.position, player.display_name);
    match &player.season {
        Some(s) => {
            let _ = write!(line, " {:>5} PTS {:>5} REB {:>5} AST  {} GP", s.ppg, s.rpg, s.apg, s.gp);
        }
        None => line.push_str("   no season stats"),
    }
    if let Some(injury) = &player.injury {
        let _ = write!(line, "  ({} {})", injury.designation(), injury.description);
    }
    line
}

fn news_lines(out: &mut String, code: &str, articles: &[NewsArticle]) {
    if articles.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{code} news");
    for article in articles {
        let _ = writeln!(out, "  - {} ({})", article.headline, article.source);
    }
}

pub fn preview_report(preview: &Preview, hide_scores: bool) -> String {
    let game = &preview.game;
    let mut out = format!("{} @ {}\n", game.away_team.name, game.home_team.name);
    let _ = writeln!(out, "{}", game_line(game, hide_scores));
    if let Some(venue) = &game.venue {
        let _ = writeln!(out, "{}, {} {}", venue.arena, venue.city, venue.state);
    }

    for (team, lineup) in [(&game.away_team, &preview.away_lineup), (&game.home_team, &preview.home_lineup)] {
        let _ = writeln!(out, "\n{} lineup", team.code);
        if lineup.is_empty() {
            let _ = writeln!(out, "  unavailable");
        }
        for player in lineup {
            let _ = writeln!(out, "{}", player_line(player));
        }
    }

    news_lines(&mut out, &game.away_team.code, &preview.away_news);
    news_lines(&mut out, &game.home_team.code, &preview.home_news);
    out
}

#[derive(Serialize)]
struct GameJson<'a> {
    #[serde(flatten)]
    game: &'a EnrichedGame,
    betting: Option<BettingResult>,
}

/// The current snapshot as pretty JSON, completed games carrying their
/// betting result.
pub fn games_json(games: &[EnrichedGame]) -> serde_json::Result<String> {
    let games: Vec<GameJson> = games
        .iter()
        .map(|game| GameJson { game, betting: calculate_betting_result(game) })
        .collect();
    serde_json::to_string_pretty(&games)
}
