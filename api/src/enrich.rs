//! Scoreboard event → [`EnrichedGame`].
//!
//! [`enrich_event`] is pure: the same event and stats snapshot always produce
//! the same game. Anything that needs another request (box scores, streaks)
//! runs in the background via [`GameEnricher`] and arrives later as a
//! [`GameUpdate`] on the returned channel.

use crate::boxscore::{extract_team_stats, BoxScoreCache};
use crate::espn::{EspnBroadcast, EspnCompetition, EspnCompetitor, EspnEvent, EspnOdds};
use crate::season_stats::SeasonStats;
use crate::standings::StreakFetcher;
use crate::teams::{self, DEFAULT_LOGO};
use crate::{
    EnrichedGame, GameStatus, GameUpdate, PLACEHOLDER, TeamView, UpdateKind, Venue,
};
use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDateTime, Offset, Utc};
use log::{debug, warn};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tokio::sync::mpsc;

pub type UpdateStream = mpsc::UnboundedReceiver<GameUpdate>;
pub type UpdateSink = mpsc::UnboundedSender<GameUpdate>;

const LEAGUE_PASS: &str = "NBA League Pass";

static RE_SPREAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([A-Z]+)\s*([-+]?\d+\.?\d*)").expect("valid spread regex")
});

/// Substring → label for national TV partners. NBC regional feeds carry
/// local games, so they map to League Pass.
const NATIONAL_NETWORKS: [(&str, &str); 9] = [
    ("ESPN", "ESPN"),
    ("TNT", "TNT"),
    ("ABC", "ABC"),
    ("NBA TV", "NBA TV"),
    ("NBATV", "NBA TV"),
    ("PRIME", "Prime Video"),
    ("PEACOCK", "Peacock"),
    ("NBC", LEAGUE_PASS),
    ("NBCS", LEAGUE_PASS),
];

/// ESPN dates come with or without seconds ("2025-12-29T00:30Z").
pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|dt| dt.and_utc())
}

/// Express the ESPN odds line relative to the home team.
///
/// "PHX -6.5" stays "-6.5" when PHX is home and becomes "+6.5" when PHX is
/// away. A team matching neither side is assumed to already be home-relative.
/// Details that don't look like `TEAM ±N` come back untouched.
pub fn home_relative_spread(details: &str, home: &str, away: &str) -> String {
    let Some(caps) = RE_SPREAD.captures(details) else {
        return details.to_string();
    };
    let team = caps[1].to_ascii_uppercase();
    let Ok(value) = caps[2].parse::<f64>() else {
        return details.to_string();
    };

    let team = teams::normalize(&team);
    let value = if team == away && team != home { -value } else { value };
    crate::betting::signed_line(value)
}

fn spread_from_odds(odds: Option<&EspnOdds>, home: &str, away: &str) -> String {
    odds.and_then(|o| o.details.as_deref())
        .filter(|d| !d.trim().is_empty())
        .map(|d| home_relative_spread(d, home, away))
        .unwrap_or_default()
}

fn total_from_odds(odds: Option<&EspnOdds>) -> String {
    odds.and_then(|o| o.over_under)
        .filter(|ou| *ou != 0.0)
        .map(|ou| ou.to_string())
        .unwrap_or_default()
}

/// Pick the national broadcaster for a game, or League Pass when it is only
/// on local TV.
pub fn national_broadcast(broadcasts: &[EspnBroadcast]) -> String {
    let squash = |s: &str| -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase()
    };
    let lookup = |name: &str| -> Option<&'static str> {
        let name = squash(name);
        NATIONAL_NETWORKS
            .iter()
            .find(|(pattern, _)| name.contains(&squash(pattern)))
            .map(|(_, label)| *label)
    };

    for broadcast in broadcasts {
        let names = broadcast.names.as_deref().unwrap_or_default();

        if broadcast.market.as_deref() == Some("national")
            && let Some(first) = names.first()
        {
            let squashed = squash(first);
            if squashed.contains("NBC") && !squashed.contains("PEACOCK") {
                return LEAGUE_PASS.to_string();
            }
            return first.clone();
        }

        if let Some(short_name) = broadcast.broadcast_type.as_ref().and_then(|t| t.short_name.as_deref())
            && let Some(label) = lookup(short_name)
        {
            return label.to_string();
        }

        if let Some(label) = names.iter().find_map(|n| lookup(n)) {
            return label.to_string();
        }
    }
    LEAGUE_PASS.to_string()
}

/// Clock text for the scoreboard column.
pub fn display_time(
    status: GameStatus,
    start: Option<DateTime<Utc>>,
    clock: Option<&str>,
    period: u8,
    offset: FixedOffset,
) -> String {
    match status {
        GameStatus::Pre => start
            .map(|dt| dt.with_timezone(&offset).format("%-I:%M %p").to_string())
            .unwrap_or_else(|| "TBD".to_string()),
        GameStatus::In => format!("{} {period}Q", clock.unwrap_or_default()),
        GameStatus::Post => "Final".to_string(),
    }
}

fn team_view(competitor: &EspnCompetitor, code: &str, stats: &SeasonStats) -> TeamView {
    let team = competitor.team.clone().unwrap_or_default();
    let known = teams::find(code);

    let name = known
        .map(|t| t.full_name())
        .or(team.display_name)
        .unwrap_or_default();
    let logo = team
        .logo
        .filter(|l| !l.is_empty())
        .or_else(|| known.map(|t| t.logo()))
        .unwrap_or_else(|| DEFAULT_LOGO.to_string());
    let color = team
        .color
        .filter(|c| !c.is_empty())
        .map(|c| format!("#{c}"))
        .or_else(|| known.map(|t| t.color.to_string()))
        .unwrap_or_else(|| "#000000".to_string());
    let record = competitor
        .records
        .iter()
        .flatten()
        .next()
        .and_then(|r| r.summary.clone())
        .unwrap_or_else(|| "0-0".to_string());

    let (ppg, ppg_rank, oppg, oppg_rank) = match stats.get(code) {
        Some(s) => (
            format!("{:.1}", s.points_for),
            teams::ordinal(s.offensive_rank),
            format!("{:.1}", s.points_against),
            teams::ordinal(s.defensive_rank),
        ),
        None => (
            PLACEHOLDER.to_string(),
            PLACEHOLDER.to_string(),
            PLACEHOLDER.to_string(),
            PLACEHOLDER.to_string(),
        ),
    };

    TeamView {
        code: code.to_string(),
        name,
        record,
        logo,
        color,
        ppg,
        ppg_rank,
        oppg,
        oppg_rank,
        espn_team_id: team.id.unwrap_or_default(),
        ..Default::default()
    }
}

fn score(competitor: &EspnCompetitor) -> u16 {
    competitor
        .score
        .as_deref()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn venue(competition: &EspnCompetition) -> Option<Venue> {
    let venue = competition.venue.as_ref()?;
    let address = venue.address.as_ref();
    Some(Venue {
        arena: venue.full_name.clone().unwrap_or_default(),
        city: address.and_then(|a| a.city.clone()).unwrap_or_default(),
        state: address.and_then(|a| a.state.clone()).unwrap_or_default(),
    })
}

/// Normalize one scoreboard event. Returns `None` for malformed events and
/// for games involving a team outside the 30 NBA franchises (All-Star,
/// international exhibitions).
pub fn enrich_event(event: &EspnEvent, stats: &SeasonStats, offset: FixedOffset) -> Option<EnrichedGame> {
    let event_id = event.id.clone()?;
    let id: u64 = event_id.parse().ok()?;
    let competition = event.competition()?;
    let away = competition.side("away")?;
    let home = competition.side("home")?;

    let abbrev = |c: &EspnCompetitor| {
        c.team
            .as_ref()
            .and_then(|t| t.abbreviation.as_deref())
            .map(|a| teams::normalize(a).to_string())
    };
    let away_code = abbrev(away).unwrap_or_default();
    let home_code = abbrev(home).unwrap_or_default();
    if !teams::is_nba(&away_code) || !teams::is_nba(&home_code) {
        debug!("skipping non-NBA game {event_id}: {away_code} @ {home_code}");
        return None;
    }

    let status_raw = competition.status.clone().unwrap_or_default();
    let status = GameStatus::from_state(status_raw.state().unwrap_or("pre"));
    let start = event.date.as_deref().and_then(parse_event_date);
    let odds = competition.odds.as_ref().and_then(|o| o.first());

    let mut game = EnrichedGame {
        id,
        event_id,
        away_team: team_view(away, &away_code, stats),
        home_team: team_view(home, &home_code, stats),
        status,
        status_detail: status_raw.short_detail().map(str::to_string),
        date: event.date.clone().unwrap_or_default(),
        time: String::new(),
        network: national_broadcast(competition.broadcasts.as_deref().unwrap_or_default()),
        spread: spread_from_odds(odds, &home_code, &away_code),
        total: total_from_odds(odds),
        period: Some(status_raw.period.unwrap_or(4)),
        clock: None,
        venue: venue(competition),
        box_score: None,
    };

    match status {
        GameStatus::Post => {
            game.away_team.score = Some(score(away));
            game.home_team.score = Some(score(home));
            game.away_team.stats_loading = true;
            game.home_team.stats_loading = true;
        }
        GameStatus::In => {
            game.away_team.score = Some(score(away));
            game.home_team.score = Some(score(home));
            game.clock = Some(status_raw.display_clock.clone().unwrap_or_default());
            game.period = Some(status_raw.period.unwrap_or(1));
            game.away_team.stats_loading = true;
            game.home_team.stats_loading = true;
        }
        GameStatus::Pre => {}
    }

    game.time = display_time(
        status,
        start,
        game.clock.as_deref(),
        game.period.unwrap_or(1),
        offset,
    );
    Some(game)
}

/// Turns scoreboard events into games and schedules their background
/// enrichment.
#[derive(Debug, Clone)]
pub struct GameEnricher {
    box_scores: Arc<BoxScoreCache>,
    streaks: Arc<StreakFetcher>,
    offset: FixedOffset,
}

impl GameEnricher {
    pub fn new(box_scores: Arc<BoxScoreCache>, streaks: Arc<StreakFetcher>) -> Self {
        Self { box_scores, streaks, offset: Local::now().offset().fix() }
    }

    /// Display times in a fixed offset instead of the machine's local zone.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Snapshot plus update stream. The stream closes once every background
    /// task has reported.
    pub fn enrich(
        &self,
        events: &[EspnEvent],
        stats: &SeasonStats,
        now: DateTime<Utc>,
    ) -> (Vec<EnrichedGame>, UpdateStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let games = self.enrich_into(events, stats, now, &tx);
        (games, rx)
    }

    /// Like [`GameEnricher::enrich`], reporting on a caller-owned channel so
    /// several scoreboards can share one stream.
    pub fn enrich_into(
        &self,
        events: &[EspnEvent],
        stats: &SeasonStats,
        now: DateTime<Utc>,
        updates: &UpdateSink,
    ) -> Vec<EnrichedGame> {
        let games: Vec<EnrichedGame> = events
            .iter()
            .filter_map(|event| enrich_event(event, stats, self.offset))
            .collect();

        for game in &games {
            match game.status {
                GameStatus::Post | GameStatus::In => self.spawn_box_score(game, updates.clone()),
                GameStatus::Pre => {
                    let start = parse_event_date(&game.date);
                    if start.is_some_and(|s| s > now + Duration::hours(24)) {
                        self.spawn_streaks(game, updates.clone());
                    }
                }
            }
        }
        games
    }

    fn spawn_box_score(&self, game: &EnrichedGame, updates: UpdateSink) {
        if game.is_live() {
            self.box_scores.invalidate(&game.event_id);
        }
        let cache = self.box_scores.clone();
        let game_id = game.id;
        let event_id = game.event_id.clone();
        let away = game.away_team.code.clone();
        let home = game.home_team.code.clone();

        tokio::spawn(async move {
            let kind = match cache.get(&event_id).await {
                Ok(summary) => UpdateKind::BoxScore {
                    away: extract_team_stats(&summary, &away),
                    home: extract_team_stats(&summary, &home),
                    summary,
                },
                Err(e) => {
                    warn!("box score for event {event_id} unavailable: {e}");
                    UpdateKind::StatsUnavailable
                }
            };
            let _ = updates.send(GameUpdate { game_id, kind });
        });
    }

    fn spawn_streaks(&self, game: &EnrichedGame, updates: UpdateSink) {
        let streaks = self.streaks.clone();
        let game_id = game.id;
        let away_id = game.away_team.espn_team_id.clone();
        let home_id = game.home_team.espn_team_id.clone();

        tokio::spawn(async move {
            let (away, home) = tokio::join!(streaks.streak(&away_id), streaks.streak(&home_id));
            if away.is_some() || home.is_some() {
                let _ = updates.send(GameUpdate { game_id, kind: UpdateKind::Streaks { away, home } });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TeamSeasonStat;
    use chrono::TimeZone;
    use serde_json::json;

    fn pacific() -> FixedOffset {
        FixedOffset::west_opt(8 * 3600).unwrap()
    }

    fn event(away: &str, home: &str, state: &str) -> EspnEvent {
        serde_json::from_value(json!({
            "id": "401810001",
            "date": "2025-12-29T03:30Z",
            "competitions": [{
                "competitors": [
                    { "homeAway": "home", "score": "118",
                      "team": { "id": "21", "abbreviation": home, "displayName": "Phoenix Suns", "color": "29127a" },
                      "records": [{ "summary": "18-12" }] },
                    { "homeAway": "away", "score": "110",
                      "team": { "id": "13", "abbreviation": away, "displayName": "Los Angeles Lakers" } }
                ],
                "status": { "period": 3, "displayClock": "5:12",
                            "type": { "state": state, "shortDetail": "5:12 - 3rd" } },
                "odds": [{ "details": "PHX -6.5", "overUnder": 228.5 }],
                "broadcasts": [{ "market": "national", "names": ["ESPN"] }],
                "venue": { "fullName": "PHX Arena", "address": { "city": "Phoenix", "state": "AZ" } }
            }]
        }))
        .unwrap()
    }

    fn stats() -> SeasonStats {
        let mut s = SeasonStats::new();
        s.insert(
            "PHX".into(),
            TeamSeasonStat {
                code: "PHX".into(),
                points_for: 118.2,
                points_against: 112.0,
                offensive_rank: 2,
                defensive_rank: 13,
            },
        );
        s
    }

    #[test]
    fn spread_is_made_home_relative() {
        assert_eq!(home_relative_spread("PHX -6.5", "PHX", "LAL"), "-6.5");
        assert_eq!(home_relative_spread("PHX -6.5", "LAL", "PHX"), "+6.5");
        assert_eq!(home_relative_spread("GS +3", "LAL", "GSW"), "-3");
        assert_eq!(home_relative_spread("phx -2", "PHX", "LAL"), "-2");
    }

    #[test]
    fn unmatched_spread_team_is_treated_as_home_relative() {
        assert_eq!(home_relative_spread("BOS -1.5", "PHX", "LAL"), "-1.5");
    }

    #[test]
    fn malformed_spread_passes_through() {
        assert_eq!(home_relative_spread("EVEN", "PHX", "LAL"), "EVEN");
    }

    #[test]
    fn broadcast_prefers_national_market() {
        let national: Vec<EspnBroadcast> =
            serde_json::from_value(json!([{ "market": "national", "names": ["TNT"] }])).unwrap();
        assert_eq!(national_broadcast(&national), "TNT");

        let nbc: Vec<EspnBroadcast> =
            serde_json::from_value(json!([{ "market": "national", "names": ["NBC Sports Boston"] }])).unwrap();
        assert_eq!(national_broadcast(&nbc), "NBA League Pass");

        let peacock: Vec<EspnBroadcast> =
            serde_json::from_value(json!([{ "market": "home", "names": ["Peacock"] }])).unwrap();
        assert_eq!(national_broadcast(&peacock), "Peacock");

        let prime: Vec<EspnBroadcast> =
            serde_json::from_value(json!([{ "market": "home", "type": { "shortName": "Prime Video" } }])).unwrap();
        assert_eq!(national_broadcast(&prime), "Prime Video");

        let local: Vec<EspnBroadcast> =
            serde_json::from_value(json!([{ "market": "home", "names": ["FanDuel SN AZ"] }])).unwrap();
        assert_eq!(national_broadcast(&local), "NBA League Pass");
        assert_eq!(national_broadcast(&[]), "NBA League Pass");
    }

    #[test]
    fn parses_minute_precision_dates() {
        let dt = parse_event_date("2025-12-29T03:30Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 12, 29, 3, 30, 0).unwrap());
        assert!(parse_event_date("2025-12-29T03:30:00Z").is_some());
        assert!(parse_event_date("tomorrow").is_none());
    }

    #[test]
    fn pre_game_time_uses_twelve_hour_clock() {
        let start = Utc.with_ymd_and_hms(2025, 12, 29, 3, 30, 0).single();
        assert_eq!(display_time(GameStatus::Pre, start, None, 4, pacific()), "7:30 PM");
        assert_eq!(display_time(GameStatus::In, start, Some("5:12"), 3, pacific()), "5:12 3Q");
        assert_eq!(display_time(GameStatus::Post, start, None, 4, pacific()), "Final");
    }

    #[test]
    fn live_event_is_fully_enriched() {
        let game = enrich_event(&event("LAL", "PHX", "in"), &stats(), pacific()).unwrap();
        assert_eq!(game.id, 401810001);
        assert_eq!(game.status, GameStatus::In);
        assert_eq!(game.spread, "-6.5");
        assert_eq!(game.total, "228.5");
        assert_eq!(game.network, "ESPN");
        assert_eq!(game.time, "5:12 3Q");
        assert_eq!(game.period, Some(3));
        assert_eq!(game.home_team.score, Some(118));
        assert_eq!(game.away_team.score, Some(110));
        assert_eq!(game.home_team.ppg, "118.2");
        assert_eq!(game.home_team.ppg_rank, "2nd");
        assert_eq!(game.home_team.oppg_rank, "13th");
        assert_eq!(game.home_team.color, "#29127a");
        assert_eq!(game.home_team.record, "18-12");
        assert_eq!(game.away_team.ppg, "-");
        assert_eq!(game.away_team.record, "0-0");
        assert!(game.home_team.stats_loading);
        assert_eq!(game.venue.as_ref().map(|v| v.city.as_str()), Some("Phoenix"));
    }

    #[test]
    fn scheduled_event_has_no_scores() {
        let game = enrich_event(&event("LAL", "PHX", "pre"), &stats(), pacific()).unwrap();
        assert_eq!(game.time, "7:30 PM");
        assert_eq!(game.home_team.score, None);
        assert!(!game.home_team.stats_loading);
        assert_eq!(game.clock, None);
    }

    #[test]
    fn aliases_are_normalized_before_lookup() {
        let game = enrich_event(&event("GS", "PHX", "pre"), &stats(), pacific()).unwrap();
        assert_eq!(game.away_team.code, "GSW");
        assert_eq!(game.away_team.name, "Golden State Warriors");
    }

    #[test]
    fn non_nba_team_drops_the_event() {
        assert!(enrich_event(&event("XYZ", "PHX", "pre"), &stats(), pacific()).is_none());
    }

    #[test]
    fn enrichment_is_idempotent() {
        let e = event("LAL", "PHX", "post");
        let s = stats();
        assert_eq!(enrich_event(&e, &s, pacific()), enrich_event(&e, &s, pacific()));
    }
}
