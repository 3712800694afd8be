/// ESPN API raw wire types: serde shapes for deserializing ESPN responses.
/// These map to our clean domain types in enrich.rs, boxscore.rs and friends.
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Scoreboard  (site v2 API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ScoreboardResponse {
    pub events: Option<Vec<EspnEvent>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EspnEvent {
    pub id: Option<String>,
    pub name: Option<String>,
    pub date: Option<String>, // ISO 8601, minute precision ("2025-12-29T00:30Z")
    pub competitions: Option<Vec<EspnCompetition>>,
}

impl EspnEvent {
    pub fn competition(&self) -> Option<&EspnCompetition> {
        self.competitions.as_ref()?.first()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EspnCompetition {
    pub competitors: Option<Vec<EspnCompetitor>>,
    pub status: Option<EspnStatus>,
    pub odds: Option<Vec<EspnOdds>>,
    pub broadcasts: Option<Vec<EspnBroadcast>>,
    pub venue: Option<EspnVenue>,
}

impl EspnCompetition {
    pub fn side(&self, home_away: &str) -> Option<&EspnCompetitor> {
        self.competitors
            .iter()
            .flatten()
            .find(|c| c.home_away.as_deref() == Some(home_away))
    }
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct EspnStatus {
    #[serde(rename = "type")]
    pub status_type: Option<EspnStatusType>,
    pub period: Option<u8>,
    #[serde(rename = "displayClock")]
    pub display_clock: Option<String>,
}

impl EspnStatus {
    pub fn state(&self) -> Option<&str> {
        self.status_type.as_ref()?.state.as_deref()
    }

    pub fn short_detail(&self) -> Option<&str> {
        self.status_type.as_ref()?.short_detail.as_deref()
    }
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct EspnStatusType {
    pub name: Option<String>,  // "STATUS_SCHEDULED", "STATUS_FINAL", "STATUS_POSTPONED"
    pub state: Option<String>, // "pre" | "in" | "post"
    pub completed: Option<bool>,
    #[serde(rename = "shortDetail")]
    pub short_detail: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EspnCompetitor {
    pub id: Option<String>,
    #[serde(rename = "homeAway")]
    pub home_away: Option<String>,
    pub team: Option<EspnTeam>,
    pub score: Option<String>, // ESPN sends scores as strings
    pub winner: Option<bool>,
    pub records: Option<Vec<EspnRecord>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct EspnTeam {
    pub id: Option<String>,
    pub abbreviation: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "shortDisplayName")]
    pub short_display_name: Option<String>,
    pub location: Option<String>,
    pub name: Option<String>,
    pub color: Option<String>, // hex without '#'
    pub logo: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnRecord {
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnOdds {
    pub details: Option<String>, // "PHX -6.5"
    #[serde(rename = "overUnder")]
    pub over_under: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EspnBroadcast {
    pub market: Option<String>,
    pub names: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub broadcast_type: Option<EspnBroadcastType>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct EspnBroadcastType {
    #[serde(rename = "shortName")]
    pub short_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnVenue {
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
    pub address: Option<EspnAddress>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnAddress {
    pub city: Option<String>,
    pub state: Option<String>,
}

// ---------------------------------------------------------------------------
// Standings  (v2 API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StandingsResponse {
    pub children: Option<Vec<StandingsGroup>>,
}

/// A conference, or a division nested inside a conference.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct StandingsGroup {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub standings: Option<StandingsTable>,
    pub children: Option<Vec<StandingsGroup>>,
}

impl StandingsGroup {
    pub fn entries(&self) -> impl Iterator<Item = &StandingsEntry> {
        self.standings
            .iter()
            .flat_map(|s| s.entries.iter().flatten())
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StandingsTable {
    pub entries: Option<Vec<StandingsEntry>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StandingsEntry {
    pub team: Option<StandingsTeam>,
    pub stats: Option<Vec<EspnStat>>,
}

impl StandingsEntry {
    pub fn stat(&self, name: &str) -> Option<&EspnStat> {
        self.stats
            .iter()
            .flatten()
            .find(|s| s.name.as_deref() == Some(name))
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StandingsTeam {
    pub id: Option<String>,
    pub abbreviation: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub location: Option<String>,
    pub logos: Option<Vec<EspnLogo>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnLogo {
    pub href: Option<String>,
}

/// Shared stat shape across standings, box score and athlete endpoints.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct EspnStat {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub stat_type: Option<String>,
    pub value: Option<f64>,
    #[serde(rename = "displayValue")]
    pub display_value: Option<String>,
}

// ---------------------------------------------------------------------------
// Game summary  (site v2 API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct SummaryResponse {
    pub header: Option<SummaryHeader>,
    pub boxscore: Option<EspnBoxscore>,
}

impl SummaryResponse {
    pub fn status(&self) -> Option<&EspnStatus> {
        self.header
            .as_ref()?
            .competitions
            .as_ref()?
            .first()?
            .status
            .as_ref()
    }
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct SummaryHeader {
    pub competitions: Option<Vec<HeaderCompetition>>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct HeaderCompetition {
    pub status: Option<EspnStatus>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct EspnBoxscore {
    pub teams: Option<Vec<BoxscoreTeam>>,
    pub players: Option<Vec<EspnTeamPlayers>>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct BoxscoreTeam {
    pub team: Option<EspnTeam>,
    pub statistics: Option<Vec<EspnStat>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EspnTeamPlayers {
    pub team: Option<EspnTeam>,
    pub statistics: Option<Vec<EspnStatCategory>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EspnStatCategory {
    pub name: Option<String>,
    pub athletes: Option<Vec<EspnAthleteStats>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EspnAthleteStats {
    pub athlete: Option<EspnAthlete>,
    pub starter: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct EspnAthlete {
    pub id: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
    pub jersey: Option<String>,
    pub position: Option<EspnPosition>,
    pub headshot: Option<EspnHeadshot>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct EspnPosition {
    pub abbreviation: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct EspnHeadshot {
    pub href: Option<String>,
}

// ---------------------------------------------------------------------------
// Team depth chart / roster  (site v2 API)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct DepthChartResponse {
    pub items: Option<Vec<DepthChart>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DepthChart {
    pub positions: Option<DepthPositions>,
}

/// ESPN has served positions both as an array and as an object keyed by slot.
/// Keyed slots stay in the order ESPN sent them (pg, sg, sf, pf, c).
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum DepthPositions {
    List(Vec<DepthPosition>),
    Keyed(#[serde(deserialize_with = "slots_in_order")] Vec<(String, DepthPosition)>),
}

impl DepthPositions {
    pub fn iter(&self) -> Box<dyn Iterator<Item = &DepthPosition> + '_> {
        match self {
            DepthPositions::List(list) => Box::new(list.iter()),
            DepthPositions::Keyed(slots) => Box::new(slots.iter().map(|(_, position)| position)),
        }
    }
}

fn slots_in_order<'de, D>(deserializer: D) -> Result<Vec<(String, DepthPosition)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Slots;

    impl<'de> Visitor<'de> for Slots {
        type Value = Vec<(String, DepthPosition)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("depth chart positions keyed by slot")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut slots = Vec::with_capacity(map.size_hint().unwrap_or(5));
            while let Some(slot) = map.next_entry()? {
                slots.push(slot);
            }
            Ok(slots)
        }
    }

    deserializer.deserialize_map(Slots)
}

#[derive(Debug, Deserialize, Clone)]
pub struct DepthPosition {
    pub position: Option<EspnPosition>,
    pub athletes: Option<Vec<DepthAthlete>>,
}

/// Depth chart slots either wrap the athlete or inline it.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum DepthAthlete {
    Wrapped { athlete: EspnAthlete },
    Inline(EspnAthlete),
}

impl DepthAthlete {
    pub fn athlete(&self) -> &EspnAthlete {
        match self {
            DepthAthlete::Wrapped { athlete } => athlete,
            DepthAthlete::Inline(athlete) => athlete,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RosterResponse {
    pub athletes: Option<Vec<EspnAthlete>>,
}

// ---------------------------------------------------------------------------
// Athlete season statistics  (core v2 / common v3 APIs)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AthleteStatsResponse {
    pub season: Option<EspnSeason>,
    pub categories: Option<Vec<StatBlock>>,
    pub splits: Option<AthleteSplits>,
    pub stats: Option<Vec<StatEntry>>,
}

impl AthleteStatsResponse {
    /// Every stat, whichever of the three layouts the endpoint answered with.
    pub fn all_stats(&self) -> impl Iterator<Item = &EspnStat> {
        let split_blocks = self
            .splits
            .iter()
            .flat_map(|s| s.categories.iter().flatten());
        self.categories
            .iter()
            .flatten()
            .chain(split_blocks)
            .flat_map(|block| block.stats.iter().flatten())
            .chain(self.stats.iter().flatten())
            .filter_map(StatEntry::as_stat)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EspnSeason {
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AthleteSplits {
    pub categories: Option<Vec<StatBlock>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StatBlock {
    pub name: Option<String>,
    pub stats: Option<Vec<StatEntry>>,
}

/// The common v3 endpoint mixes stat objects with bare display strings.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum StatEntry {
    Stat(EspnStat),
    Raw(serde_json::Value),
}

impl StatEntry {
    pub fn as_stat(&self) -> Option<&EspnStat> {
        match self {
            StatEntry::Stat(stat) => Some(stat),
            StatEntry::Raw(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// News  (site v2 / site.web APIs)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct NewsResponse {
    pub articles: Option<Vec<EspnArticle>>,
    pub feed: Option<Vec<EspnArticle>>,
    pub items: Option<Vec<EspnArticle>>,
}

impl NewsResponse {
    pub fn into_articles(self) -> Vec<EspnArticle> {
        self.articles
            .or(self.feed)
            .or(self.items)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EspnArticle {
    pub headline: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub story: Option<String>,
    pub published: Option<String>,
    #[serde(rename = "lastModified")]
    pub last_modified: Option<String>,
    pub links: Option<ArticleLinks>,
    pub images: Option<Vec<ArticleImage>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ArticleLinks {
    pub web: Option<ArticleLink>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ArticleLink {
    pub href: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ArticleImage {
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Injury report  (RapidAPI)
// ---------------------------------------------------------------------------

/// Injury feeds disagree on field names, so every spelling is kept and
/// resolved by the accessors in priority order.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InjuryRecord {
    pub team: Option<String>,
    pub team_name: Option<String>,
    pub player: Option<String>,
    pub player_name: Option<String>,
    pub status: Option<String>,
    pub injury_status: Option<String>,
    pub reason: Option<String>,
    pub injury: Option<String>,
    pub description: Option<String>,
    pub body_part: Option<String>,
}

impl InjuryRecord {
    pub fn team(&self) -> &str {
        first_of(&[&self.team, &self.team_name]).unwrap_or_default()
    }

    pub fn player(&self) -> &str {
        first_of(&[&self.player, &self.player_name]).unwrap_or_default()
    }

    pub fn status(&self) -> &str {
        first_of(&[&self.status, &self.injury_status]).unwrap_or("Out")
    }

    pub fn reason(&self) -> &str {
        first_of(&[&self.reason, &self.injury, &self.description, &self.body_part])
            .unwrap_or("Injury")
    }
}

fn first_of<'a>(fields: &[&'a Option<String>]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|f| f.as_deref())
        .find(|v| !v.trim().is_empty())
}
