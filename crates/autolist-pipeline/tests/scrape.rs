//! End-to-end `Orchestrator::scrape` tests: a `wiremock` upstream feeding a
//! real SQLite store.

use std::{path::PathBuf, time::Duration};

use autolist_db::{count_listings, get_listing_by_url, get_source_count, PoolConfig, Store};
use autolist_pipeline::{Orchestrator, PipelineConfig, PipelineError, ScrapeParams, Stage};
use autolist_scraper::{AutotraderClient, Channel, ScraperError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A database file under the temp dir, removed with its WAL sidecars on drop.
struct TempDb {
    path: PathBuf,
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

/// The guard must outlive the store so the file is not removed under the pool.
async fn open_store() -> (TempDb, Store) {
    let db = TempDb {
        path: std::env::temp_dir().join(format!("autolist-scrape-{}.db", uuid::Uuid::new_v4())),
    };
    let store = Store::open(&format!("sqlite://{}", db.path.display()), PoolConfig::default())
        .await
        .expect("open store");
    store.migrate().await.expect("migrate");
    (db, store)
}

fn orchestrator(server: &MockServer, store: Store, timeout_secs: u64) -> Orchestrator {
    let client = AutotraderClient::new(&server.uri(), timeout_secs, "autolist-test/0.1")
        .expect("failed to build test client");
    Orchestrator::new(
        PipelineConfig {
            site_origin: "https://www.autotrader.ca".to_string(),
            source_prefix: "autotrader".to_string(),
            page_size: 40,
        },
        store,
        client,
    )
}

fn params(channel: Channel) -> ScrapeParams {
    ScrapeParams {
        postal_code: "N5X0E2".to_string(),
        page: 1,
        channel,
        page_path: None,
    }
}

#[tokio::test]
async fn rest_scrape_persists_listings_and_total() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("postalCode", "N5X0E2"))
        .and(query_param("pageSize", "40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "listings": [{
                "title": "2019 Ford F150",
                "price": "$30,000",
                "location": "London",
                "mileage": 50000,
                "url": "/x"
            }],
            "totalCount": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_db, store) = open_store().await;
    let orch = orchestrator(&server, store.clone(), 2);

    let batch = orch.scrape(&params(Channel::Rest)).await.expect("scrape");

    assert_eq!(batch.inserted, 1);
    assert_eq!(batch.failed, 0);
    let row = get_listing_by_url(store.pool(), "https://www.autotrader.ca/x")
        .await
        .unwrap()
        .expect("stored");
    assert_eq!(row.title.as_deref(), Some("2019 Ford F150"));
    assert_eq!(row.mileage_km, Some(50_000));
    let count = get_source_count(store.pool(), "autotrader:N5X0E2")
        .await
        .unwrap()
        .expect("total recorded");
    assert_eq!(count.total_count, 1);
}

#[tokio::test]
async fn search_scrape_normalizes_nested_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "vehicle": {"make": "Honda", "model": "Civic", "modelYear": 2020, "mileageInKm": 12000},
                    "price": {"amount": 21500},
                    "location": {"city": "Toronto"},
                    "url": "/a/honda/civic/9"
                },
                "garbage"
            ],
            "total": "2,310"
        })))
        .mount(&server)
        .await;

    let (_db, store) = open_store().await;
    let orch = orchestrator(&server, store.clone(), 2);

    let batch = orch.scrape(&params(Channel::Search)).await.expect("scrape");

    assert_eq!(batch.inserted, 1);
    assert_eq!(batch.failed, 1);
    let row = get_listing_by_url(store.pool(), "https://www.autotrader.ca/a/honda/civic/9")
        .await
        .unwrap()
        .expect("stored");
    assert_eq!(row.title.as_deref(), Some("2020 Honda Civic"));
    assert_eq!(row.price_display.as_deref(), Some("$21,500"));
    assert_eq!(row.city.as_deref(), Some("Toronto"));
    let count = get_source_count(store.pool(), "autotrader:N5X0E2")
        .await
        .unwrap()
        .expect("total recorded");
    assert_eq!(count.total_count, 2310);
}

#[tokio::test]
async fn page_scrape_extracts_embedded_payload() {
    let html = r#"<!doctype html><html><body><div id="root"></div>
<script type="application/json" id="__NEXT_DATA__">
{&quot;props&quot;: {&quot;pageProps&quot;: {&quot;totalCount&quot;: 77, &quot;listings&quot;: [
  {&quot;make&quot;: &quot;Mazda&quot;, &quot;model&quot;: &quot;3&quot;, &quot;year&quot;: 2018, &quot;url&quot;: &quot;/a/mazda/3/1&quot;}
]}}}
</script></body></html>"#;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cars/"))
        .and(query_param("loc", "N5X0E2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .mount(&server)
        .await;

    let (_db, store) = open_store().await;
    let orch = orchestrator(&server, store.clone(), 2);

    let batch = orch.scrape(&params(Channel::Page)).await.expect("scrape");

    assert_eq!(batch.inserted, 1);
    let row = get_listing_by_url(store.pool(), "https://www.autotrader.ca/a/mazda/3/1")
        .await
        .unwrap()
        .expect("stored");
    assert_eq!(row.title.as_deref(), Some("2018 Mazda 3"));
    let count = get_source_count(store.pool(), "autotrader:N5X0E2")
        .await
        .unwrap()
        .expect("total recorded");
    assert_eq!(count.total_count, 77);
}

#[tokio::test]
async fn blocked_page_is_a_per_item_failure_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cars/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>Checking your browser</body></html>", "text/html"),
        )
        .mount(&server)
        .await;

    let (_db, store) = open_store().await;
    let orch = orchestrator(&server, store.clone(), 2);

    let batch = orch.scrape(&params(Channel::Page)).await.expect("scrape");

    assert_eq!(batch.inserted, 0);
    assert_eq!(batch.failed, 1);
    assert_eq!(count_listings(store.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn upstream_error_status_aborts_with_source_context() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (_db, store) = open_store().await;
    let orch = orchestrator(&server, store, 2);

    let err = orch.scrape(&params(Channel::Rest)).await.unwrap_err();

    assert!(!err.is_timeout());
    assert_eq!(err.stage(), Stage::Fetch);
    assert_eq!(err.source_id(), "autotrader:N5X0E2");
    assert!(matches!(
        err,
        PipelineError::Upstream {
            source: ScraperError::UnexpectedStatus { status: 503, .. },
            ..
        }
    ));
}

#[tokio::test]
async fn slow_upstream_surfaces_as_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"listings": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let (_db, store) = open_store().await;
    let orch = orchestrator(&server, store.clone(), 1);

    let err = orch.scrape(&params(Channel::Rest)).await.unwrap_err();

    assert!(err.is_timeout(), "expected timeout, got {err}");
    assert_eq!(count_listings(store.pool()).await.unwrap(), 0);
}
