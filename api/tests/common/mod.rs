#![allow(dead_code)]

use chrono::FixedOffset;
use nba_api::boxscore::BoxScoreCache;
use nba_api::client::{Endpoints, NbaApi, StandingsSource};
use nba_api::enrich::GameEnricher;
use nba_api::games::Scoreboard;
use nba_api::season_stats::SeasonStatsRepository;
use nba_api::standings::{StandingsCache, StreakFetcher};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub fn api(server: &mockito::ServerGuard) -> NbaApi {
    NbaApi::with_endpoints(Endpoints::single(&server.url())).with_backoff(Duration::from_millis(1), 3)
}

pub fn eastern() -> FixedOffset {
    FixedOffset::west_opt(5 * 3600).unwrap()
}

pub fn scoreboard(api: &NbaApi) -> Scoreboard {
    let sources = vec![StandingsSource::Current];
    let box_scores = Arc::new(BoxScoreCache::new(api.clone()));
    let standings = Arc::new(StandingsCache::with_sources(api.clone(), sources.clone()));
    let enricher = GameEnricher::new(box_scores, Arc::new(StreakFetcher::new(standings))).with_offset(eastern());
    let stats = Arc::new(SeasonStatsRepository::with_sources(api.clone(), sources));
    Scoreboard::new(api.clone(), stats, enricher)
}

pub fn competitor(side: &str, team_id: &str, code: &str, name: &str, score: &str) -> Value {
    json!({
        "homeAway": side,
        "score": score,
        "team": { "id": team_id, "abbreviation": code, "displayName": name },
        "records": [{ "summary": "10-5" }]
    })
}

pub fn event(id: &str, date: &str, state: &str, away: Value, home: Value) -> Value {
    json!({
        "id": id,
        "date": date,
        "competitions": [{
            "competitors": [home, away],
            "status": { "type": { "state": state, "shortDetail": "Final" }, "period": 4 },
            "odds": [{ "details": "PHX -4.5", "overUnder": 222.5 }]
        }]
    })
}

pub fn standings_body() -> Value {
    let entry = |id: &str, code: &str, pf: f64, pa: f64, streak: &str| {
        json!({
            "team": { "id": id, "abbreviation": code },
            "stats": [
                { "name": "avgPointsFor", "value": pf },
                { "name": "avgPointsAgainst", "value": pa },
                { "name": "streak", "type": "streak", "displayValue": streak }
            ]
        })
    };
    json!({
        "children": [
            { "name": "Western Conference", "standings": { "entries": [
                entry("21", "PHX", 118.2, 112.4, "W3"),
                entry("13", "LAL", 115.0, 114.9, "L1")
            ]}}
        ]
    })
}

pub fn summary_body() -> Value {
    let team = |code: &str, fg: &str| {
        json!({
            "team": { "abbreviation": code },
            "statistics": [
                { "name": "fieldGoalPct", "displayValue": fg },
                { "name": "threePointFieldGoalsMade-threePointFieldGoalsAttempted", "displayValue": "12-35" },
                { "name": "totalRebounds", "displayValue": "44" }
            ]
        })
    };
    json!({
        "header": { "competitions": [{ "status": { "type": { "state": "post" } } }] },
        "boxscore": { "teams": [team("LAL", "45.1"), team("PHX", "50.0")] }
    })
}
