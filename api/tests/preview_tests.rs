mod common;

use chrono::{NaiveDate, TimeZone, Utc};
use mockito::Matcher;
use nba_api::boxscore::BoxScoreCache;
use nba_api::injuries::{InjuryCache, InjuryFetcher};
use nba_api::news::{Feed, NewsAggregator, Relay};
use nba_api::starters::{LineupFetcher, LineupRequest};
use serde_json::json;
use std::sync::Arc;

const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item>
    <title>Booker drops 40 as Suns hold off Lakers</title>
    <description><![CDATA[<p>Phoenix won again.</p>]]></description>
    <pubDate>Sun, 28 Dec 2025 06:00:00 GMT</pubDate>
    <link>https://news.test/booker</link>
  </item>
  <item>
    <title>Celtics rest starters</title>
    <pubDate>Sun, 28 Dec 2025 07:00:00 GMT</pubDate>
  </item>
</channel></rss>"#;

fn dec28() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 28).unwrap()
}

#[tokio::test]
async fn box_score_requests_are_coalesced() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/summary")
        .match_query(Matcher::UrlEncoded("event".into(), "401810001".into()))
        .with_body(common::summary_body().to_string())
        .expect(1)
        .create_async()
        .await;

    let cache = BoxScoreCache::new(common::api(&server));
    let (a, b) = tokio::join!(cache.get("401810001"), cache.get("401810001"));
    assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    assert!(cache.contains("401810001"));
    mock.assert_async().await;
}

#[tokio::test]
async fn failed_box_score_is_not_cached() {
    let mut server = mockito::Server::new_async().await;
    let failing = server
        .mock("GET", "/summary")
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let cache = BoxScoreCache::new(common::api(&server));
    assert!(cache.get("401810001").await.is_err());
    assert!(!cache.contains("401810001"));
    failing.assert_async().await;

    server
        .mock("GET", "/summary")
        .match_query(Matcher::Any)
        .with_body(common::summary_body().to_string())
        .create_async()
        .await;
    assert!(cache.get("401810001").await.is_ok());
}

#[tokio::test]
async fn news_merges_espn_and_relayed_feed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/teams/21/news")
        .with_body(
            json!({ "articles": [
                { "headline": "Suns extend win streak", "published": "2025-12-28T05:00:00Z",
                  "links": { "web": { "href": "https://espn.test/suns" } } },
                { "headline": "Knicks trade rumors" }
            ]})
            .to_string(),
        )
        .create_async()
        .await;
    let down = server
        .mock("GET", "/relay-down")
        .match_query(Matcher::Any)
        .with_status(502)
        .create_async()
        .await;
    let up = server
        .mock("GET", "/relay-up")
        .match_query(Matcher::UrlEncoded("url".into(), "https://feeds.test/nba.xml".into()))
        .with_body(RSS)
        .create_async()
        .await;

    let base = server.url();
    let aggregator = NewsAggregator::with_sources(
        common::api(&server),
        vec![Feed { url: "https://feeds.test/nba.xml".into(), source: "Test RSS".into() }],
        vec![
            Relay { base: format!("{base}/relay-down"), param: "url".into() },
            Relay { base: format!("{base}/relay-up"), param: "url".into() },
        ],
    );
    let news = aggregator.team_news("21", "PHX", "Phoenix Suns").await;

    let headlines: Vec<_> = news.iter().map(|a| a.headline.as_str()).collect();
    assert_eq!(
        headlines,
        vec!["Booker drops 40 as Suns hold off Lakers", "Suns extend win streak"]
    );
    assert_eq!(news[0].source, "Test RSS");
    assert_eq!(news[0].description, "Phoenix won again.");
    assert_eq!(news[1].source, "ESPN API");
    assert_eq!(news[1].link, "https://espn.test/suns");
    down.assert_async().await;
    up.assert_async().await;
}

#[tokio::test]
async fn lineup_falls_back_to_depth_chart_with_injuries() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/teams/21/depthcharts")
        .with_body(
            json!({ "items": [{ "positions": [
                { "athletes": [{ "athlete": { "id": "1", "displayName": "Devin Booker", "jersey": "1" } }] },
                { "athletes": [{ "athlete": { "id": "2", "displayName": "Jaren Jackson Jr." } }] }
            ]}]})
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/seasons/2026/types/2/athletes/1/statistics/0")
        .with_body(
            json!({ "season": { "year": 2026 }, "splits": { "categories": [{ "stats": [
                { "name": "gamesPlayed", "displayValue": "28" },
                { "name": "avgPoints", "displayValue": "27.1" }
            ]}]}})
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/seasons/2026/types/2/athletes/2/statistics/0")
        .with_status(404)
        .create_async()
        .await;
    let common_v3 = server
        .mock("GET", "/athletes/2/statistics")
        .match_query(Matcher::Any)
        .with_body(json!({ "categories": [{ "stats": [{ "name": "gamesPlayed", "displayValue": "0" }] }] }).to_string())
        .expect(2)
        .create_async()
        .await;
    let injuries = server
        .mock("GET", "/injuries/2025-12-28")
        .match_header("X-RapidAPI-Key", "test-key")
        .with_body(
            json!([
                { "team": "Phoenix Suns", "player": "Devin Booker", "status": "Questionable", "reason": "Groin" },
                { "team": "Boston Celtics", "player": "Jayson Tatum", "status": "Out" }
            ])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let api = common::api(&server);
    let injury_fetcher = Arc::new(InjuryFetcher::new(
        api.clone(),
        Some("test-key".into()),
        InjuryCache::in_memory(),
    ));
    let lineups = LineupFetcher::new(
        api.clone(),
        Arc::new(BoxScoreCache::new(api)),
        Some(injury_fetcher),
        2026,
    );
    let request = LineupRequest {
        event_id: None,
        team_id: "21",
        code: "PHX",
        team_name: "Phoenix Suns",
        date: dec28(),
    };
    let now = Utc.with_ymd_and_hms(2025, 12, 28, 17, 0, 0).unwrap();
    let players = lineups.lineup(&request, now).await;

    assert_eq!(players.len(), 2);
    assert_eq!(players[0].display_name, "D. Booker");
    assert_eq!(players[0].season.as_ref().map(|s| s.ppg.as_str()), Some("27.1"));
    assert_eq!(players[0].injury.as_ref().map(|i| i.designation()), Some("Q".to_string()));
    assert_eq!(players[1].display_name, "J. Jackson Jr.");
    assert!(players[1].season.is_none());
    assert!(players[1].injury.is_none());

    // Season lines are refetched; the day's injury report is not.
    lineups.lineup(&request, now).await;
    common_v3.assert_async().await;
    injuries.assert_async().await;
}
