/// Price update flow tests
///
/// Drive the update service through the public API: a resolver fed by fake or
/// mocked sources, an in-memory store, and a notifier that records what it
/// was asked to send.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gold_tracker::app;
use gold_tracker::config::AppConfig;
use gold_tracker::db::{self, price_queries};
use gold_tracker::external::extractor::ExtractError;
use gold_tracker::external::fetcher::FetchError;
use gold_tracker::external::multi_source::{MultiSourceResolver, PriceOrigin};
use gold_tracker::external::price_source::{PriceSource, SourceError};
use gold_tracker::models::NewPriceRecord;
use gold_tracker::services::alert_service::{AlertMessage, AlertRule};
use gold_tracker::services::notification_service::{NotificationError, Notifier};
use gold_tracker::services::price_service::{
    AlertStatus, PersistStatus, PriceUpdateService, TrackedSeries,
};

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

struct StaticSource {
    name: &'static str,
    price: Option<f64>,
    calls: Arc<AtomicUsize>,
}

impl StaticSource {
    fn boxed(name: &'static str, price: Option<f64>) -> (Box<dyn PriceSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Self {
            name,
            price,
            calls: calls.clone(),
        };
        (Box::new(source), calls)
    }
}

#[async_trait]
impl PriceSource for StaticSource {
    fn name(&self) -> String {
        self.name.to_string()
    }

    async fn fetch_price(&self) -> Result<f64, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.price {
            Some(p) => Ok(p),
            None => Err(SourceError::Fetch(FetchError::Timeout)),
        }
    }
}

struct BrokenLayoutSource;

#[async_trait]
impl PriceSource for BrokenLayoutSource {
    fn name(&self) -> String {
        "broken".to_string()
    }

    async fn fetch_price(&self) -> Result<f64, SourceError> {
        Err(SourceError::Extract(ExtractError::NotFound))
    }
}

#[derive(Default)]
struct CollectingNotifier {
    sent: Mutex<Vec<AlertMessage>>,
}

#[async_trait]
impl Notifier for CollectingNotifier {
    async fn send(&self, message: &AlertMessage) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, day).unwrap().and_hms_opt(hour, 0, 0).unwrap()
}

fn series() -> TrackedSeries {
    TrackedSeries {
        karat: "22K".to_string(),
        city: "Hyderabad".to_string(),
    }
}

async fn seed_previous_days(pool: &sqlx::SqlitePool, price: f64) {
    for day in [17, 18, 19] {
        let record = NewPriceRecord::at(at(day, 12), price, "22K", "Hyderabad");
        price_queries::insert(pool, &record).await.unwrap();
    }
}

// ---------------------------------------------------------------------------
// Orchestration with fakes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_drop_below_week_average_notifies_once() {
    let pool = db::connect_in_memory().await.unwrap();
    seed_previous_days(&pool, 150000.0).await;

    let (primary, _) = StaticSource::boxed("primary", Some(132000.0));
    let notifier = Arc::new(CollectingNotifier::default());
    let service = PriceUpdateService::new(
        pool.clone(),
        MultiSourceResolver::new(vec![primary], 132000.0),
        notifier.clone(),
        AlertRule::default(),
        series(),
        7,
    );

    let outcome = service.run_once_at(at(20, 12)).await;

    assert_eq!(outcome.origin, PriceOrigin::Source("primary".to_string()));
    assert!(matches!(outcome.persisted, PersistStatus::Inserted(_)));
    assert_eq!(outcome.trailing_average, Some(150000.0));
    assert_eq!(outcome.alert, AlertStatus::Delivered);
    assert_eq!(price_queries::count(&pool).await.unwrap(), 4);

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.contains("132000"));
}

#[tokio::test]
async fn test_outage_reports_fallback_but_stores_and_alerts_nothing() {
    let pool = db::connect_in_memory().await.unwrap();
    seed_previous_days(&pool, 150000.0).await;

    let (timeout_source, calls) = StaticSource::boxed("slow", None);
    let notifier = Arc::new(CollectingNotifier::default());
    let service = PriceUpdateService::new(
        pool.clone(),
        MultiSourceResolver::new(vec![Box::new(BrokenLayoutSource), timeout_source], 132000.0),
        notifier.clone(),
        AlertRule::default(),
        series(),
        7,
    );

    let outcome = service.run_once_at(at(20, 6)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.origin, PriceOrigin::Fallback);
    assert_eq!(outcome.price, 132000.0);
    assert_eq!(outcome.persisted, PersistStatus::Skipped);
    assert_eq!(outcome.alert, AlertStatus::NotTriggered);

    assert_eq!(price_queries::count(&pool).await.unwrap(), 3);
    assert!(notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_later_sources_untouched_after_success() {
    let pool = db::connect_in_memory().await.unwrap();

    let (first, first_calls) = StaticSource::boxed("first", Some(131500.0));
    let (second, second_calls) = StaticSource::boxed("second", Some(999999.0));
    let service = PriceUpdateService::new(
        pool,
        MultiSourceResolver::new(vec![first, second], 132000.0),
        Arc::new(CollectingNotifier::default()),
        AlertRule::default(),
        series(),
        7,
    );

    let outcome = service.run_once_at(at(20, 18)).await;

    assert_eq!(outcome.price, 131500.0);
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Wired from configuration against mocked upstreams
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_configured_chain_falls_through_to_bankbazaar_and_posts_to_ntfy() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/goodreturns"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bankbazaar"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<table>\
               <tr><th>Gram</th><th>Today</th></tr>\
               <tr><td>1 gram</td><td>&#8377; 13,200</td></tr>\
               <tr><td>10 grams</td><td>&#8377; 1,32,000</td></tr>\
             </table>",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/gold-alerts"))
        .and(header("Priority", "high"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = AppConfig {
        goodreturns_url: format!("{}/goodreturns", server.uri()),
        bankbazaar_url: format!("{}/bankbazaar", server.uri()),
        ntfy_topic_url: Some(format!("{}/gold-alerts", server.uri())),
        http_timeout: Duration::from_secs(2),
        ..AppConfig::default()
    };

    let pool = db::connect_in_memory().await.unwrap();
    seed_previous_days(&pool, 135000.0).await;

    let client = app::build_client().unwrap();
    let service = app::build_update_service(&config, pool.clone(), &client);
    let outcome = service.run_once_at(at(20, 12)).await;

    assert_eq!(outcome.origin, PriceOrigin::Source("BankBazaar".to_string()));
    assert_eq!(outcome.price, 132000.0);
    assert_eq!(outcome.alert, AlertStatus::Delivered);
}
