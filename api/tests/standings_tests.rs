mod common;

use common::standings_body;
use mockito::Matcher;
use nba_api::client::StandingsSource;
use nba_api::season_stats::SeasonStatsRepository;
use nba_api::standings::{StandingsCache, StreakFetcher};
use std::sync::Arc;

fn chain() -> Vec<StandingsSource> {
    vec![
        StandingsSource::Season(2026),
        StandingsSource::Season(2025),
        StandingsSource::Current,
    ]
}

#[tokio::test]
async fn season_stats_fall_back_through_sources() {
    let mut server = mockito::Server::new_async().await;
    let this_season = server
        .mock("GET", "/standings")
        .match_query(Matcher::UrlEncoded("season".into(), "2026".into()))
        .with_status(500)
        .create_async()
        .await;
    let last_season = server
        .mock("GET", "/standings")
        .match_query(Matcher::UrlEncoded("season".into(), "2025".into()))
        .with_status(404)
        .create_async()
        .await;
    let current = server
        .mock("GET", "/standings")
        .match_query(Matcher::Missing)
        .with_body(standings_body().to_string())
        .create_async()
        .await;

    let repo = SeasonStatsRepository::with_sources(common::api(&server), chain());
    assert_eq!(repo.refresh().await, 2);

    let suns = repo.get("PHX").unwrap();
    assert_eq!(suns.points_for, 118.2);
    assert_eq!(suns.offensive_rank, 1);
    assert_eq!(suns.defensive_rank, 1);
    assert_eq!(repo.get("LAL").unwrap().defensive_rank, 2);

    this_season.assert_async().await;
    last_season.assert_async().await;
    current.assert_async().await;
}

#[tokio::test]
async fn exhausted_sources_leave_an_empty_table() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/standings")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let repo = SeasonStatsRepository::with_sources(common::api(&server), chain());
    assert_eq!(repo.refresh().await, 0);
    assert!(repo.snapshot().is_empty());
    assert!(repo.get("PHX").is_none());
}

#[tokio::test]
async fn outage_keeps_the_previous_table() {
    let mut server = mockito::Server::new_async().await;
    let healthy = server
        .mock("GET", "/standings")
        .match_query(Matcher::Missing)
        .with_body(standings_body().to_string())
        .expect(1)
        .create_async()
        .await;

    let repo = SeasonStatsRepository::with_sources(common::api(&server), vec![StandingsSource::Current]);
    assert_eq!(repo.refresh().await, 2);
    healthy.assert_async().await;
    healthy.remove_async().await;

    let down = server
        .mock("GET", "/standings")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    assert_eq!(repo.refresh().await, 2);
    let suns = repo.get("PHX").unwrap();
    assert_eq!(suns.offensive_rank, 1);
    assert_eq!(suns.defensive_rank, 1);
    down.assert_async().await;
}

#[tokio::test]
async fn streaks_share_one_standings_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/standings")
        .match_query(Matcher::Missing)
        .with_body(standings_body().to_string())
        .expect(1)
        .create_async()
        .await;

    let cache = Arc::new(StandingsCache::with_sources(
        common::api(&server),
        vec![StandingsSource::Current],
    ));
    let streaks = StreakFetcher::new(cache.clone());
    let (suns, lakers) = tokio::join!(streaks.streak("21"), streaks.streak("13"));

    assert_eq!(suns.as_deref(), Some("W 3"));
    assert_eq!(lakers.as_deref(), Some("L 1"));
    assert_eq!(streaks.streak("99").await, None);
    assert_eq!(streaks.streak("").await, None);

    let table = cache.table().await.unwrap();
    assert_eq!(table.len(), 2);
    mock.assert_async().await;
}
