//! Canonical NBA team codes and the static franchise table.
//!
//! ESPN abbreviates a handful of franchises differently from every other feed
//! ("GS" vs "GSW"). Everything downstream keys on the canonical code, so all
//! abbreviations pass through [`normalize`] before they are compared.

/// ESPN spelling → canonical code.
const ALIASES: [(&str, &str); 6] = [
    ("GS", "GSW"),
    ("NY", "NYK"),
    ("SA", "SAS"),
    ("NO", "NOP"),
    ("UTAH", "UTA"),
    ("WSH", "WAS"),
];

const LOGO_BASE: &str = "https://cdn.nba.com/logos/nba";
pub const DEFAULT_LOGO: &str = "https://cdn.nba.com/logos/nba/logo.svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NbaTeam {
    pub code: &'static str,
    pub city: &'static str,
    pub name: &'static str,
    /// NBA stats id, used for logo URLs.
    pub nba_id: u32,
    pub color: &'static str,
}

impl NbaTeam {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.city, self.name)
    }

    pub fn logo(&self) -> String {
        format!("{LOGO_BASE}/{}/primary/L/logo.svg", self.nba_id)
    }
}

macro_rules! team {
    ($code:literal, $city:literal, $name:literal, $id:literal, $color:literal) => {
        NbaTeam { code: $code, city: $city, name: $name, nba_id: $id, color: $color }
    };
}

pub static TEAMS: [NbaTeam; 30] = [
    team!("ATL", "Atlanta", "Hawks", 1610612737, "#E03A3E"),
    team!("BOS", "Boston", "Celtics", 1610612738, "#007A33"),
    team!("BKN", "Brooklyn", "Nets", 1610612751, "#000000"),
    team!("CHA", "Charlotte", "Hornets", 1610612766, "#1D1160"),
    team!("CHI", "Chicago", "Bulls", 1610612741, "#CE1141"),
    team!("CLE", "Cleveland", "Cavaliers", 1610612739, "#860038"),
    team!("DAL", "Dallas", "Mavericks", 1610612742, "#00538C"),
    team!("DEN", "Denver", "Nuggets", 1610612743, "#0E2240"),
    team!("DET", "Detroit", "Pistons", 1610612765, "#C8102E"),
    team!("GSW", "Golden State", "Warriors", 1610612744, "#1D428A"),
    team!("HOU", "Houston", "Rockets", 1610612745, "#CE1141"),
    team!("IND", "Indiana", "Pacers", 1610612754, "#002D62"),
    team!("LAC", "Los Angeles", "Clippers", 1610612746, "#C8102E"),
    team!("LAL", "Los Angeles", "Lakers", 1610612747, "#552583"),
    team!("MEM", "Memphis", "Grizzlies", 1610612763, "#5D76A9"),
    team!("MIA", "Miami", "Heat", 1610612748, "#98002E"),
    team!("MIL", "Milwaukee", "Bucks", 1610612749, "#00471B"),
    team!("MIN", "Minnesota", "Timberwolves", 1610612750, "#0C2340"),
    team!("NOP", "New Orleans", "Pelicans", 1610612740, "#0C2340"),
    team!("NYK", "New York", "Knicks", 1610612752, "#006BB6"),
    team!("OKC", "Oklahoma City", "Thunder", 1610612760, "#007AC1"),
    team!("ORL", "Orlando", "Magic", 1610612753, "#0077C0"),
    team!("PHI", "Philadelphia", "76ers", 1610612755, "#006BB6"),
    team!("PHX", "Phoenix", "Suns", 1610612756, "#1D1160"),
    team!("POR", "Portland", "Trail Blazers", 1610612757, "#E03A3E"),
    team!("SAC", "Sacramento", "Kings", 1610612758, "#5A2D81"),
    team!("SAS", "San Antonio", "Spurs", 1610612759, "#C4CED4"),
    team!("TOR", "Toronto", "Raptors", 1610612761, "#CE1141"),
    team!("UTA", "Utah", "Jazz", 1610612762, "#002B5C"),
    team!("WAS", "Washington", "Wizards", 1610612764, "#002B5C"),
];

/// Map an API-specific abbreviation to its canonical code. Unknown input is
/// returned unchanged, so `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == raw)
        .map(|(_, code)| *code)
        .unwrap_or(raw)
}

pub fn find(code: &str) -> Option<&'static NbaTeam> {
    let code = normalize(code);
    TEAMS.iter().find(|t| t.code == code)
}

pub fn is_nba(code: &str) -> bool {
    find(code).is_some()
}

/// Resolve a full franchise name as written by the injury feed.
///
/// Exact names win; otherwise the first team whose full name contains the
/// input (or vice versa) is taken.
pub fn code_for_full_name(name: &str) -> Option<&'static str> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    if name.eq_ignore_ascii_case("LA Clippers") {
        return Some("LAC");
    }

    let lower = name.to_lowercase();
    let full_names = || TEAMS.iter().map(|t| (t.code, t.full_name().to_lowercase()));

    full_names()
        .find(|(_, full)| *full == lower)
        .or_else(|| full_names().find(|(_, full)| full.contains(&lower) || lower.contains(full.as_str())))
        .map(|(code, _)| code)
}

/// Add the ordinal suffix used for league ranks: 1st, 2nd, 3rd, 11th, 22nd.
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}
