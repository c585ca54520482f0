//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for NewsAPI and run the full
//! crawl → sink → index cycle end-to-end.

use chrono::{DateTime, Duration, TimeZone, Utc};
use newsapi_crawl::config::{parse_config, Config};
use newsapi_crawl::crawler::Runner;
use newsapi_crawl::discovery::{load_sources, update_sources, DomainDiscovery};
use newsapi_crawl::source::TransportError;
use newsapi_crawl::storage::{ArticleStore, RunStatus, SqliteStore};
use newsapi_crawl::{CrawlError, Interval, IntervalCrawler, NewsApiClient, NewsCrawlError};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 12, 9, 0, 0).unwrap()
}

fn hour() -> Interval {
    Interval::starting_at(t0(), Duration::hours(1)).unwrap()
}

/// An article as NewsAPI returns it
fn article(title: &str, source: &str, minute: i64) -> Value {
    let published = t0() + Duration::minutes(minute);
    json!({
        "source": {"id": null, "name": source},
        "author": null,
        "title": title,
        "description": "",
        "url": format!("https://www.{}/{}", source.to_lowercase().replace(' ', ""), minute),
        "urlToImage": null,
        "publishedAt": published.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        "content": ""
    })
}

fn everything(total: u64, articles: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": "ok",
        "totalResults": total,
        "articles": articles
    }))
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, dir: &Path, page_size: u32) -> Config {
    parse_config(&format!(
        r#"
[newsapi]
base-url = "{base_url}"
api-key = "test-key"
page-size = {page_size}

[window]
size-seconds = 3600
offset-seconds = 3600

[filters]
language = "fr"
domains = ["lemonde.fr", "lefigaro.fr"]

[discovery]
language = "fr"
country = "fr"
sources-path = '{sources}'

[output]
directory = '{data}'
database-path = '{db}'
"#,
        base_url = base_url,
        page_size = page_size,
        sources = dir.join("sources.json").display(),
        data = dir.join("data").display(),
        db = dir.join("articles.db").display(),
    ))
    .expect("test config should be valid")
}

fn runner_for(config: &Config) -> Runner {
    let client = Arc::new(NewsApiClient::from_config(&config.newsapi).unwrap());
    Runner::from_config(config, client, "test-hash").unwrap()
}

/// Mounts three pages of two: 09:50, 09:40 | 09:30, 09:20 | 09:10
async fn mount_paged_hour(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(header("X-Api-Key", "test-key"))
        .and(query_param("from", "2021-03-12T09:00:00"))
        .and(query_param("to", "2021-03-12T09:59:59"))
        .and(query_param("pageSize", "2"))
        .and(query_param("sortBy", "publishedAt"))
        .and(query_param("language", "fr"))
        .and(query_param("domains", "lemonde.fr,lefigaro.fr"))
        .respond_with(everything(
            5,
            vec![
                article("Cinquante", "Le Monde", 50),
                article("Quarante", "Le Figaro", 40),
            ],
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("from", "2021-03-12T09:00:00"))
        .and(query_param("to", "2021-03-12T09:39:59"))
        .respond_with(everything(
            3,
            vec![
                article("Trente", "Le Monde", 30),
                article("Vingt", "Le Figaro", 20),
            ],
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("from", "2021-03-12T09:00:00"))
        .and(query_param("to", "2021-03-12T09:19:59"))
        .respond_with(everything(1, vec![article("Dix", "Le Monde", 10)]))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_interval_collects_every_page() {
    let server = MockServer::start().await;
    mount_paged_hour(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 2);
    let client = Arc::new(NewsApiClient::from_config(&config.newsapi).unwrap());
    let crawler = IntervalCrawler::new(client, 2);

    let result = crawler
        .crawl(&hour(), &config.filters().unwrap())
        .await
        .unwrap();

    assert_eq!(result.api_calls_made, 3);
    let titles: Vec<_> = result.items.iter().filter_map(|i| i.title()).collect();
    assert_eq!(
        titles,
        vec!["Cinquante", "Quarante", "Trente", "Vingt", "Dix"]
    );
    // Untouched fields are carried through
    assert_eq!(result.items[0].payload["author"], Value::Null);
    assert_eq!(result.items[0].payload["source"]["name"], "Le Monde");
}

#[tokio::test]
async fn test_full_run_writes_object_and_index() {
    let server = MockServer::start().await;
    mount_paged_hour(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 2);
    let runner = runner_for(&config);

    // Triggered at 10:00 for the previous hour
    let report = runner
        .run_at(Utc.with_ymd_and_hms(2021, 3, 12, 10, 0, 0).unwrap())
        .await
        .unwrap();

    assert_eq!(report.interval, hour());
    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.item_count, 5);
    assert_eq!(report.api_calls, 3);

    let object = dir.path().join("data/newsapi/2021-03-12/09/articles.json");
    let content = std::fs::read_to_string(&object).unwrap();
    let lines: Vec<Value> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0]["title"], "Cinquante");
    assert_eq!(lines[4]["publishedAt"], "2021-03-12T09:10:00Z");

    let store = SqliteStore::new(&dir.path().join("articles.db")).unwrap();
    assert_eq!(store.count_articles().unwrap(), 5);
    assert_eq!(store.count_sources().unwrap(), 2);

    let runs = store.recent_runs(10).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].api_calls, 3);
    assert_eq!(runs[0].item_count, 5);
    assert_eq!(runs[0].config_hash, "test-hash");
    assert_eq!(store.calls_on(Utc::now().date_naive()).unwrap(), 3);
}

#[tokio::test]
async fn test_exact_multiple_of_page_size_stops_early() {
    let server = MockServer::start().await;

    // Four items, page size two: the second page reaches totalResults
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("to", "2021-03-12T09:59:59"))
        .respond_with(everything(
            4,
            vec![
                article("Un", "Le Monde", 50),
                article("Deux", "Le Monde", 40),
            ],
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("to", "2021-03-12T09:39:59"))
        .respond_with(everything(
            2,
            vec![
                article("Trois", "Le Monde", 30),
                article("Quatre", "Le Monde", 20),
            ],
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 2);
    let client = Arc::new(NewsApiClient::from_config(&config.newsapi).unwrap());

    let result = IntervalCrawler::new(client, 2)
        .crawl(&hour(), &config.filters().unwrap())
        .await
        .unwrap();

    assert_eq!(result.len(), 4);
    assert_eq!(result.api_calls_made, 2);
}

#[tokio::test]
async fn test_empty_hour_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(everything(0, vec![]))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 100);
    let runner = runner_for(&config);

    let err = runner.run_interval(hour()).await.unwrap_err();

    assert!(matches!(
        err,
        NewsCrawlError::Crawl(CrawlError::EmptyResult { .. })
    ));
    assert!(!dir.path().join("data/newsapi/2021-03-12").exists());

    let store = SqliteStore::new(&dir.path().join("articles.db")).unwrap();
    assert_eq!(store.count_articles().unwrap(), 0);
    assert_eq!(store.count_runs(RunStatus::Empty).unwrap(), 1);
}

#[tokio::test]
async fn test_rate_limit_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "status": "error",
            "code": "rateLimited",
            "message": "You have made too many requests recently."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 100);
    let runner = runner_for(&config);

    let err = runner.run_interval(hour()).await.unwrap_err();

    assert!(matches!(
        err,
        NewsCrawlError::Crawl(CrawlError::Transport(TransportError::RateLimited { .. }))
    ));

    let store = SqliteStore::new(&dir.path().join("articles.db")).unwrap();
    let runs = store.recent_runs(1).unwrap();
    assert_eq!(runs[0].status, RunStatus::Failed);
    assert_eq!(runs[0].api_calls, 1);
}

#[tokio::test]
async fn test_invalid_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid or incorrect."
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 100);
    let client = Arc::new(NewsApiClient::from_config(&config.newsapi).unwrap());

    let err = IntervalCrawler::new(client, 100)
        .crawl(&hour(), &config.filters().unwrap())
        .await
        .unwrap_err();

    match err {
        CrawlError::Transport(TransportError::Unauthorized { code, .. }) => {
            assert_eq!(code, "apiKeyInvalid");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_backfill_over_three_hours() {
    let server = MockServer::start().await;

    for (hour_of_day, minute_title) in [(9, "Neuf"), (10, "Dix"), (11, "Onze")] {
        let from = format!("2021-03-12T{:02}:00:00", hour_of_day);
        let to = format!("2021-03-12T{:02}:59:59", hour_of_day);
        let offset = (hour_of_day - 9) * 60;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(query_param("from", from.as_str()))
            .and(query_param("to", to.as_str()))
            .respond_with(everything(
                1,
                vec![article(minute_title, "Le Monde", offset + 15)],
            ))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 100);
    let runner = runner_for(&config);

    let plan = newsapi_crawl::crawler::backfill_plan(
        t0(),
        t0() + Duration::hours(3),
        &config.window,
    )
    .unwrap();
    let results = runner.backfill(plan).await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|(_, outcome)| outcome.is_ok()));
    for hh in ["09", "10", "11"] {
        assert!(dir
            .path()
            .join(format!("data/newsapi/2021-03-12/{}/articles.json", hh))
            .exists());
    }

    let store = SqliteStore::new(&dir.path().join("articles.db")).unwrap();
    assert_eq!(store.count_articles().unwrap(), 3);
    assert_eq!(store.count_runs(RunStatus::Completed).unwrap(), 3);
}

#[tokio::test]
async fn test_discovery_fills_sources_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .and(query_param("category", "general"))
        .and(query_param("language", "fr"))
        .and(query_param("country", "fr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {"source": {"id": "le-monde", "name": "Le Monde"}, "url": "https://www.lemonde.fr/a", "title": "A"},
                {"source": {"id": null, "name": "Le Figaro"}, "url": "https://www.lefigaro.fr/b", "title": "B"}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/top-headlines"))
        .and(query_param("category", "sports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "totalResults": 1,
            "articles": [
                {"source": {"id": null, "name": "L'Équipe"}, "url": "https://www.lequipe.fr/c", "title": "C"}
            ]
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path(), 100);
    let client = Arc::new(NewsApiClient::from_config(&config.newsapi).unwrap());
    let discovery = DomainDiscovery::from_config(client, &config.discovery);

    let discovered = discovery
        .discover_domains(&["general".to_string(), "sports".to_string()])
        .await
        .unwrap();
    assert_eq!(discovered.len(), 3);

    let sources_path = Path::new(&config.discovery.sources_path);
    update_sources(sources_path, &discovered).unwrap();

    let sources = load_sources(sources_path).unwrap();
    assert_eq!(sources["Le Monde"], "lemonde.fr");
    assert_eq!(sources["Le Figaro"], "lefigaro.fr");
    assert_eq!(sources["L'Équipe"], "lequipe.fr");
}
