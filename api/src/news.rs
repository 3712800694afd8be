//! Team headlines from ESPN's news API and public RSS feeds.

use crate::client::NbaApi;
use crate::espn::EspnArticle;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use std::time::Duration;

const MAX_ARTICLES: usize = 10;
const ESPN_ARTICLES_CONSIDERED: usize = 10;
const ITEMS_PER_FEED: usize = 3;
const FEED_TIMEOUT: Duration = Duration::from_secs(15);

static RE_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<(item|entry)\b[^>]*>(.*?)</(?:item|entry)>").expect("valid item regex"));
static RE_CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("valid cdata regex"));
static RE_MEDIA_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<media:(?:content|thumbnail)\b[^>]*\burl="([^"]+)""#).expect("valid media regex")
});
static RE_LINK_HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<link\b[^>]*\bhref="([^"]+)""#).expect("valid link regex"));
static RE_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#x[0-9a-fA-F]+|#\d+|[a-zA-Z]+);").expect("valid entity regex"));
static RE_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</p>\s*<p>").expect("valid paragraph regex"));
static RE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid break regex"));
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Item elements read from RSS 2.0 and Atom entries.
const FEED_TAGS: [&str; 9] = [
    "title",
    "link",
    "description",
    "summary",
    "content:encoded",
    "content",
    "pubDate",
    "published",
    "updated",
];
static RE_FEED_TAGS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    FEED_TAGS
        .iter()
        .map(|tag| {
            let pattern = format!(r"(?s)<{0}\b[^>]*>(.*?)</{0}>", regex::escape(tag));
            (*tag, Regex::new(&pattern).expect("valid feed tag regex"))
        })
        .collect()
});

/// Boilerplate that feeds append to summaries.
static RE_ARTIFACTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\[.*?\]",
        r"(?i)Continue reading.*",
        r"(?i)Read more.*",
        r"(?i)Subscribe to .* (Apple Podcasts|Spotify|YouTube|RSS).*",
        r"(?i)Check out the rest of .*",
        r"(?i)If you ever have .* questions, email us at .*",
        r"\(\d{1,2}:\d{2}(:\d{2})?\)\s*[—–-]\s*[^(]*",
        r"(?i)\(Photo by [^)]+\)",
        r"(?i)Photo: [^.]*\.",
        r"(?i)Image: [^.]*\.",
        r"(?i)Getty Images.*",
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}",
        r"https?://\S+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid artifact regex"))
    .collect()
});
static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").expect("valid spaces regex"));
static RE_LINE_EDGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" *\n *").expect("valid line regex"));
static RE_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank line regex"));

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsArticle {
    pub headline: String,
    pub description: String,
    pub published: String,
    pub published_at: Option<DateTime<Utc>>,
    pub link: String,
    pub image: String,
    pub story: String,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct Feed {
    pub url: String,
    pub source: String,
}

/// A relay that fetches a URL on our behalf: `{base}?{param}={url}`.
#[derive(Debug, Clone)]
pub struct Relay {
    pub base: String,
    pub param: String,
}

impl Relay {
    fn new(base: &str, param: &str) -> Self {
        Self { base: base.into(), param: param.into() }
    }

    pub fn url_for(&self, target: &str) -> Option<String> {
        reqwest::Url::parse_with_params(&self.base, &[(self.param.as_str(), target)])
            .ok()
            .map(String::from)
    }
}

pub fn default_feeds() -> Vec<Feed> {
    vec![
        Feed { url: "https://www.espn.com/espn/rss/nba/news".into(), source: "ESPN RSS".into() },
        Feed { url: "https://sports.yahoo.com/nba/rss.xml".into(), source: "Yahoo Sports".into() },
    ]
}

pub fn default_relays() -> Vec<Relay> {
    vec![
        Relay::new("https://corsproxy.io/", "url"),
        Relay::new("https://api.allorigins.win/raw", "url"),
        Relay::new("https://api.codetabs.com/v1/proxy", "quest"),
    ]
}

fn decode_entity(caps: &Captures) -> String {
    let entity = &caps[1];
    let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse().ok().and_then(char::from_u32)
    } else {
        match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" | "rsquo" | "lsquo" => Some('\''),
            "ldquo" | "rdquo" => Some('"'),
            "ndash" => Some('–'),
            "mdash" => Some('—'),
            "nbsp" => Some(' '),
            "hellip" => Some('…'),
            _ => None,
        }
    };
    match decoded {
        Some('\u{a0}') => " ".to_string(),
        Some('\u{2018}' | '\u{2019}') => "'".to_string(),
        Some('\u{201c}' | '\u{201d}') => "\"".to_string(),
        Some(c) => c.to_string(),
        None => caps[0].to_string(),
    }
}

pub fn decode_entities(text: &str) -> String {
    RE_ENTITY.replace_all(text, decode_entity).into_owned()
}

/// Plain text from feed HTML: entities decoded, tags stripped, boilerplate
/// removed, paragraph breaks kept.
pub fn clean_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let mut text = decode_entities(html);
    text = RE_PARAGRAPH.replace_all(&text, "\n\n").into_owned();
    text = RE_BREAK.replace_all(&text, "\n").into_owned();
    text = RE_TAG.replace_all(&text, " ").into_owned();
    text = decode_entities(&text);
    for artifact in RE_ARTIFACTS.iter() {
        text = artifact.replace_all(&text, "").into_owned();
    }
    text = RE_SPACES.replace_all(&text, " ").into_owned();
    text = RE_LINE_EDGES.replace_all(&text, "\n").into_owned();
    text = RE_BLANK_LINES.replace_all(&text, "\n\n").into_owned();
    text.trim().to_string()
}

/// Whole-word, case-insensitive matcher for a team's code, full name and
/// nickname ("lal", "los angeles lakers", "lakers").
#[derive(Debug, Clone)]
pub struct TeamMatcher {
    patterns: Vec<Regex>,
}

impl TeamMatcher {
    pub fn new(code: &str, name: &str) -> Self {
        let nickname = name.split_whitespace().last().unwrap_or_default();
        let patterns = [code, name, nickname]
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .filter_map(|t| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&t))).ok())
            .collect();
        Self { patterns }
    }

    pub fn matches(&self, headline: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(headline))
    }
}

fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn tag_text(block: &str, tag: &str) -> Option<String> {
    let inner = RE_FEED_TAGS.get(tag)?.captures(block)?.get(1)?.as_str();
    let inner = RE_CDATA.replace_all(inner, "$1");
    Some(inner.trim().to_string()).filter(|s| !s.is_empty())
}

/// Items of an RSS 2.0 or Atom document.
pub fn parse_feed(xml: &str, source: &str) -> Vec<NewsArticle> {
    RE_ITEM
        .captures_iter(xml)
        .map(|caps| {
            let block = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let content = tag_text(block, "content:encoded").or_else(|| tag_text(block, "content"));
            let summary = tag_text(block, "description")
                .or_else(|| tag_text(block, "summary"))
                .or_else(|| content.clone());
            let published = tag_text(block, "pubDate")
                .or_else(|| tag_text(block, "published"))
                .or_else(|| tag_text(block, "updated"))
                .unwrap_or_default();
            let link = tag_text(block, "link")
                .or_else(|| RE_LINK_HREF.captures(block).map(|c| c[1].to_string()))
                .unwrap_or_default();
            let image = RE_MEDIA_URL
                .captures(block)
                .map(|c| c[1].to_string())
                .unwrap_or_default();

            NewsArticle {
                headline: clean_html(&tag_text(block, "title").unwrap_or_else(|| "No headline".into())),
                description: clean_html(&summary.unwrap_or_default()),
                published_at: parse_published(&published),
                published,
                link,
                image,
                story: clean_html(&content.unwrap_or_default()),
                source: source.to_string(),
            }
        })
        .collect()
}

fn from_espn(article: &EspnArticle, headline: &str) -> NewsArticle {
    let published = article
        .published
        .clone()
        .or_else(|| article.last_modified.clone())
        .unwrap_or_default();
    NewsArticle {
        headline: clean_html(headline),
        description: clean_html(
            article.description.as_deref().or(article.story.as_deref()).unwrap_or_default(),
        ),
        published_at: parse_published(&published),
        published,
        link: article
            .links
            .as_ref()
            .and_then(|l| l.web.as_ref())
            .and_then(|w| w.href.clone())
            .unwrap_or_default(),
        image: article
            .images
            .iter()
            .flatten()
            .find_map(|i| i.url.clone())
            .unwrap_or_default(),
        story: clean_html(article.story.as_deref().unwrap_or_default()),
        source: "ESPN API".into(),
    }
}

/// Team-relevant articles among the first ten ESPN returned.
pub fn relevant_espn_articles(articles: &[EspnArticle], matcher: &TeamMatcher) -> Vec<NewsArticle> {
    articles
        .iter()
        .take(ESPN_ARTICLES_CONSIDERED)
        .filter_map(|a| {
            let headline = a
                .headline
                .as_deref()
                .or(a.title.as_deref())
                .or(a.description.as_deref())?;
            matcher.matches(headline).then(|| from_espn(a, headline))
        })
        .collect()
}

/// Drop repeated headlines, newest first, at most ten.
pub fn merge_articles(articles: Vec<NewsArticle>) -> Vec<NewsArticle> {
    let mut seen = HashSet::new();
    let mut unique: Vec<NewsArticle> = articles
        .into_iter()
        .filter(|a| seen.insert(a.headline.trim().to_lowercase()))
        .collect();
    // Undated articles go last.
    unique.sort_by(|a, b| match (a.published_at, b.published_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    unique.truncate(MAX_ARTICLES);
    unique
}

#[derive(Debug, Clone)]
pub struct NewsAggregator {
    api: NbaApi,
    feeds: Vec<Feed>,
    relays: Vec<Relay>,
}

impl NewsAggregator {
    pub fn new(api: NbaApi) -> Self {
        Self::with_sources(api, default_feeds(), default_relays())
    }

    pub fn with_sources(api: NbaApi, feeds: Vec<Feed>, relays: Vec<Relay>) -> Self {
        Self { api, feeds, relays }
    }

    /// Headlines about one team, ESPN first, then RSS. Sources that fail are
    /// skipped; the result may be empty.
    pub async fn team_news(&self, team_id: &str, code: &str, name: &str) -> Vec<NewsArticle> {
        let matcher = TeamMatcher::new(code, name);
        let mut articles = match self.api.fetch_team_news(team_id).await {
            Ok(raw) => relevant_espn_articles(&raw, &matcher),
            Err(e) => {
                warn!("ESPN news for {code} unavailable: {e}");
                Vec::new()
            }
        };

        if !name.is_empty() {
            for feed in &self.feeds {
                articles.extend(self.feed_articles(feed, &matcher).await);
            }
        }

        merge_articles(articles)
    }

    async fn feed_articles(&self, feed: &Feed, matcher: &TeamMatcher) -> Vec<NewsArticle> {
        for relay in &self.relays {
            let Some(url) = relay.url_for(&feed.url) else {
                continue;
            };
            let body = match self.api.fetch_text(&url, FEED_TIMEOUT).await {
                Ok(body) => body,
                Err(e) => {
                    debug!("{} via {} failed: {e}", feed.source, relay.base);
                    continue;
                }
            };
            if !body.contains("<rss") && !body.contains("<feed") {
                debug!("{} via {} did not return a feed", feed.source, relay.base);
                continue;
            }
            return parse_feed(&body, &feed.source)
                .into_iter()
                .filter(|a| matcher.matches(&a.headline))
                .take(ITEMS_PER_FEED)
                .collect();
        }
        warn!("could not fetch {} through any relay", feed.source);
        Vec::new()
    }
}
