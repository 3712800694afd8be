//! The scoreboard service: raw ESPN days in, enriched games out.

use crate::client::{ApiError, ApiResult, NbaApi};
use crate::enrich::{parse_event_date, GameEnricher, UpdateStream};
use crate::espn::EspnEvent;
use crate::season_stats::SeasonStatsRepository;
use crate::teams;
use crate::{EnrichedGame, GameStatus};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures_util::future::join_all;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, OnceCell};

/// How far team mode searches in either direction.
pub const TEAM_SEARCH_DAYS: i64 = 180;
/// Past and upcoming games shown in team mode.
pub const TEAM_GAMES_EACH_WAY: usize = 10;
/// Days fetched concurrently while searching a team's schedule.
const SEARCH_BATCH_DAYS: i64 = 7;

type DayCell = Arc<OnceCell<Arc<Vec<EspnEvent>>>>;

fn event_status(event: &EspnEvent) -> GameStatus {
    event
        .competition()
        .and_then(|c| c.status.as_ref())
        .and_then(|s| s.state())
        .map(GameStatus::from_state)
        .unwrap_or_default()
}

fn involves(event: &EspnEvent, code: &str) -> bool {
    event.competition().is_some_and(|c| {
        c.competitors.iter().flatten().any(|side| {
            side.team
                .as_ref()
                .and_then(|t| t.abbreviation.as_deref())
                .map(teams::normalize)
                == Some(code)
        })
    })
}

fn event_start(event: &EspnEvent) -> Option<DateTime<Utc>> {
    event.date.as_deref().and_then(parse_event_date)
}

/// Pick a team's most recent completed games and its next scheduled games
/// out of a pile of events, each list ordered by start time.
pub fn select_team_events(events: &[EspnEvent], code: &str, limit: usize) -> Vec<EspnEvent> {
    let mut seen = HashSet::new();
    let mut mine: Vec<&EspnEvent> = events
        .iter()
        .filter(|e| involves(e, code))
        .filter(|e| seen.insert(e.id.clone()))
        .collect();
    mine.sort_by_key(|e| event_start(e));

    let past: Vec<&EspnEvent> = mine
        .iter()
        .copied()
        .filter(|e| event_status(e) == GameStatus::Post)
        .collect();
    let past = &past[past.len().saturating_sub(limit)..];
    let upcoming = mine
        .iter()
        .copied()
        .filter(|e| event_status(e) != GameStatus::Post)
        .take(limit);

    past.iter().copied().chain(upcoming).cloned().collect()
}

/// Fetches scoreboard days, caching each day behind a coalescing cell, and
/// hands the events to the enricher.
#[derive(Debug)]
pub struct Scoreboard {
    api: NbaApi,
    stats: Arc<SeasonStatsRepository>,
    enricher: GameEnricher,
    days: Mutex<HashMap<NaiveDate, DayCell>>,
}

impl Scoreboard {
    pub fn new(api: NbaApi, stats: Arc<SeasonStatsRepository>, enricher: GameEnricher) -> Self {
        Self { api, stats, enricher, days: Mutex::new(HashMap::new()) }
    }

    pub fn stats(&self) -> &Arc<SeasonStatsRepository> {
        &self.stats
    }

    pub fn enricher(&self) -> &GameEnricher {
        &self.enricher
    }

    /// Raw events for one day. Concurrent callers share a single request;
    /// failures are not cached.
    pub async fn events(&self, date: NaiveDate) -> ApiResult<Arc<Vec<EspnEvent>>> {
        let cell = self.cell(date);
        let events = cell
            .get_or_try_init(|| async {
                debug!("fetching scoreboard for {date}");
                let response = self.api.fetch_scoreboard(date).await?;
                Ok::<_, ApiError>(Arc::new(response.events.unwrap_or_default()))
            })
            .await?;
        Ok(events.clone())
    }

    /// Drop a cached day so the next request refetches it.
    pub fn invalidate(&self, date: NaiveDate) {
        if let Ok(mut days) = self.days.lock() {
            days.remove(&date);
        }
    }

    /// Every NBA game on `date`, plus the stream of background updates.
    pub async fn games_for_date(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> ApiResult<(Vec<EnrichedGame>, UpdateStream)> {
        let events = self.events(date).await?;
        let stats = self.stats.snapshot();
        let (games, updates) = self.enricher.enrich(&events, &stats, now);
        info!("{} games on {date}", games.len());
        Ok((games, updates))
    }

    /// A team's last ten results and next ten games, oldest first. Days
    /// that fail to load are skipped.
    pub async fn games_for_team(
        &self,
        code: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> (Vec<EnrichedGame>, UpdateStream) {
        let code = teams::normalize(code);
        let past = self.search(code, today, -1, GameStatus::Post).await;
        let upcoming = self.search(code, today, 1, GameStatus::Pre).await;

        let mut pool = past;
        pool.extend(upcoming);
        let events = select_team_events(&pool, code, TEAM_GAMES_EACH_WAY);

        let (tx, rx) = mpsc::unbounded_channel();
        let stats = self.stats.snapshot();
        let mut games = self.enricher.enrich_into(&events, &stats, now, &tx);
        games.sort_by_key(|g| parse_event_date(&g.date));
        info!("{} games for {code}", games.len());
        (games, rx)
    }

    /// Walk day by day from `today` in `step` direction until enough of the
    /// team's games with the wanted status turn up.
    async fn search(&self, code: &str, today: NaiveDate, step: i64, wanted: GameStatus) -> Vec<EspnEvent> {
        let mut found: Vec<EspnEvent> = Vec::new();
        let mut offset = 0;

        while offset <= TEAM_SEARCH_DAYS {
            let batch: Vec<NaiveDate> = (offset..(offset + SEARCH_BATCH_DAYS).min(TEAM_SEARCH_DAYS + 1))
                .filter_map(|d| today.checked_add_signed(Duration::days(d * step)))
                .collect();
            offset += SEARCH_BATCH_DAYS;

            let days = join_all(batch.iter().map(|date| self.events(*date))).await;
            for (date, day) in batch.iter().zip(days) {
                match day {
                    Ok(events) => found.extend(
                        events
                            .iter()
                            .filter(|e| involves(e, code))
                            .filter(|e| (event_status(e) == GameStatus::Post) == (wanted == GameStatus::Post))
                            .cloned(),
                    ),
                    Err(e) => warn!("skipping {date} while searching {code} schedule: {e}"),
                }
            }

            if found.len() >= TEAM_GAMES_EACH_WAY {
                break;
            }
        }
        found
    }

    fn cell(&self, date: NaiveDate) -> DayCell {
        match self.days.lock() {
            Ok(mut days) => days.entry(date).or_default().clone(),
            Err(poisoned) => poisoned.into_inner().entry(date).or_default().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn game(id: &str, date: &str, away: &str, home: &str, state: &str) -> EspnEvent {
        serde_json::from_value(json!({
            "id": id,
            "date": date,
            "competitions": [{
                "competitors": [
                    { "homeAway": "home", "team": { "abbreviation": home } },
                    { "homeAway": "away", "team": { "abbreviation": away } }
                ],
                "status": { "type": { "state": state } }
            }]
        }))
        .unwrap()
    }

    #[test]
    fn matches_team_through_aliases() {
        let event = game("1", "2025-12-29T00:30Z", "GS", "LAL", "pre");
        assert!(involves(&event, "GSW"));
        assert!(involves(&event, "LAL"));
        assert!(!involves(&event, "BOS"));
    }

    #[test]
    fn keeps_latest_results_and_next_fixtures() {
        let mut events = Vec::new();
        for day in 1..=5 {
            events.push(game(&format!("p{day}"), &format!("2025-12-0{day}T00:30Z"), "PHX", "LAL", "post"));
        }
        for day in 6..=9 {
            events.push(game(&format!("f{day}"), &format!("2025-12-0{day}T00:30Z"), "LAL", "PHX", "pre"));
        }
        events.push(game("other", "2025-12-05T00:30Z", "BOS", "NY", "post"));
        // Same game seen twice (today appears in both directions).
        events.push(game("f6", "2025-12-06T00:30Z", "LAL", "PHX", "pre"));

        let picked: Vec<_> = select_team_events(&events, "PHX", 2)
            .into_iter()
            .filter_map(|e| e.id)
            .collect();
        assert_eq!(picked, vec!["p4", "p5", "f6", "f7"]);
    }

    #[test]
    fn missing_status_counts_as_scheduled() {
        let event: EspnEvent = serde_json::from_value(json!({ "id": "1" })).unwrap();
        assert_eq!(event_status(&event), GameStatus::Pre);
    }
}
