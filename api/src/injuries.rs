//! Daily injury report and matching injuries onto players.
//!
//! The report is published three times a day (11:00, 15:00 and 17:00
//! Eastern). A cached report stays good until the next publication, so the
//! cache is keyed by date and remembers which window it was fetched in.

use crate::client::{ApiError, NbaApi};
use crate::espn::InjuryRecord;
use crate::teams;
use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::Mutex;

const EASTERN_UTC_OFFSET_HOURS: i64 = 5;
const GENERATIONAL_SUFFIXES: [&str; 5] = ["jr", "sr", "ii", "iii", "iv"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injury {
    pub player: String,
    pub status: String,
    pub description: String,
}

impl Injury {
    pub fn designation(&self) -> String {
        designation(&self.status)
    }
}

/// Standard NBA designation for a free-form status ("Out" → "O").
pub fn designation(status: &str) -> String {
    let lower = status.to_lowercase();
    let code = if lower.contains("out") {
        "O"
    } else if lower.contains("questionable") {
        "Q"
    } else if lower.contains("doubtful") {
        "D"
    } else if lower.contains("day-to-day") || lower.contains("day to day") {
        "DTD"
    } else if lower.contains("gtd") || lower.contains("game time") {
        "GTD"
    } else if lower.contains("probable") {
        "P"
    } else if lower.contains("injured reserve") || has_word(&lower, "ir") {
        "IR"
    } else if lower.contains("suspended") {
        "SUSP"
    } else {
        return status
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_default();
    };
    code.to_string()
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric()).any(|w| w == word)
}

/// Publication window for the report at `now`: 0 before 11:00 ET, then 1, 2
/// and 3 after the 11:00, 15:00 and 17:00 updates. Eastern time is taken as
/// a fixed UTC-5.
pub fn update_window(now: DateTime<Utc>) -> u8 {
    let eastern = now - Duration::hours(EASTERN_UTC_OFFSET_HOURS);
    match eastern.hour() {
        0..=10 => 0,
        11..=14 => 1,
        15..=16 => 2,
        _ => 3,
    }
}

/// Lowercase, drop punctuation, fold hyphens, collapse whitespace and strip
/// a trailing generational suffix.
pub fn normalize_player_name(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| *c != '.' && *c != '\'' && *c != '\u{2019}')
        .map(|c| if c == '-' { ' ' } else { c })
        .collect();
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() > 1 && words.last().is_some_and(|w| GENERATIONAL_SUFFIXES.contains(w)) {
        words.pop();
    }
    words.join(" ")
}

fn names_match(injured: &str, candidate: &str) -> bool {
    if injured.is_empty() || candidate.is_empty() {
        return false;
    }
    if injured == candidate || injured.contains(candidate) || candidate.contains(injured) {
        return true;
    }
    let (Some(i_first), Some(i_last)) = (injured.split(' ').next(), injured.split(' ').last()) else {
        return false;
    };
    let (Some(c_first), Some(c_last)) = (candidate.split(' ').next(), candidate.split(' ').last()) else {
        return false;
    };
    i_last == c_last && i_first.chars().next() == c_first.chars().next()
}

/// Find the injury for a player, trying the full name and the display name:
/// exact, then substring either way, then last name plus first initial.
pub fn find_injury<'a>(name: &str, display_name: &str, injuries: &'a [Injury]) -> Option<&'a Injury> {
    let name = normalize_player_name(name);
    let display_name = normalize_player_name(display_name);
    injuries.iter().find(|injury| {
        let injured = normalize_player_name(&injury.player);
        names_match(&injured, &name) || names_match(&injured, &display_name)
    })
}

/// Injuries for one team out of the league-wide report.
pub fn filter_by_team(records: &[InjuryRecord], team_name: &str, code: &str) -> Vec<Injury> {
    let team_lower = team_name.to_lowercase();
    let code_lower = code.to_lowercase();

    records
        .iter()
        .filter(|record| {
            let team = record.team();
            if team.is_empty() {
                return false;
            }
            if teams::code_for_full_name(team) == Some(code) {
                return true;
            }
            let lower = team.to_lowercase();
            (!team_lower.is_empty() && (lower.contains(&team_lower) || team_lower.contains(&lower)))
                || has_word(&lower, &code_lower)
        })
        .map(|record| Injury {
            player: Some(record.player()).filter(|p| !p.is_empty()).unwrap_or("Unknown").to_string(),
            status: record.status().to_string(),
            description: record.reason().to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachedReport {
    pub window: u8,
    pub records: Vec<InjuryRecord>,
}

/// Reports by date, optionally mirrored to a JSON file between runs.
#[derive(Debug, Default)]
pub struct InjuryCache {
    reports: HashMap<NaiveDate, CachedReport>,
    path: Option<PathBuf>,
}

impl InjuryCache {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load a previously saved cache. A missing or unreadable file starts empty.
    pub fn load(path: PathBuf) -> Self {
        let reports = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| match serde_json::from_str(&content) {
                Ok(reports) => Some(reports),
                Err(e) => {
                    warn!("ignoring injury cache at {}: {e}", path.display());
                    None
                }
            })
            .unwrap_or_default();
        Self { reports, path: Some(path) }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&CachedReport> {
        self.reports.get(&date)
    }

    pub fn insert(&mut self, date: NaiveDate, report: CachedReport) {
        self.reports.insert(date, report);
        self.save();
    }

    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let result = serde_json::to_string(&self.reports)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!("could not write injury cache {}: {e}", path.display());
        }
    }
}

/// Cache decision for a stored report: reuse it while nothing newer has
/// been published.
pub fn cache_is_fresh(stored_window: u8, current_window: u8) -> bool {
    stored_window >= current_window || current_window == 0
}

#[derive(Debug)]
pub struct InjuryFetcher {
    api: NbaApi,
    api_key: Option<String>,
    cache: Mutex<InjuryCache>,
}

impl InjuryFetcher {
    pub fn new(api: NbaApi, api_key: Option<String>, cache: InjuryCache) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        Self { api, api_key, cache: Mutex::new(cache) }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// League-wide report for `date`. Falls back to a stale cached report on
    /// rate limiting or network trouble; otherwise an empty list.
    pub async fn report(&self, date: NaiveDate, now: DateTime<Utc>) -> Vec<InjuryRecord> {
        let current = update_window(now);
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.get(date)
            && cache_is_fresh(cached.window, current)
        {
            debug!("injury report for {date} served from window {} cache", cached.window);
            return cached.records.clone();
        }

        let Some(key) = self.api_key.as_deref() else {
            return cache.get(date).map(|c| c.records.clone()).unwrap_or_default();
        };

        match self.api.fetch_injuries(date, key).await {
            Ok(records) => {
                cache.insert(date, CachedReport { window: current, records: records.clone() });
                records
            }
            Err(e @ (ApiError::RateLimited { .. } | ApiError::Network(..) | ApiError::Parsing(..))) => {
                warn!("injury report unavailable ({e}); using cached data if any");
                cache.get(date).map(|c| c.records.clone()).unwrap_or_default()
            }
            Err(e) => {
                error!("injury report request failed: {e}");
                Vec::new()
            }
        }
    }

    pub async fn team_injuries(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
        team_name: &str,
        code: &str,
    ) -> Vec<Injury> {
        let report = self.report(date, now).await;
        filter_by_team(&report, team_name, code)
    }
}
