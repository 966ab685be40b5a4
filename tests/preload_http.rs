//! Integration tests for loading over HTTP.
//!
//! Uses wiremock for HTTP mocking. Tests cover the event, collect and
//! callback forms against one server where some images load and some 404.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use preloader::{
    load_all, load_each, settle_all, Channel, FailureReason, FetchOptions, Identifier,
    LoadAggregator, ProgressEvent, SourceFetcher,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

async fn image_server() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/images/nujji.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(PNG.to_vec())
                .insert_header("content-type", "image/png")
                .set_delay(Duration::from_millis(50)),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/images/other.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    mock_server
}

fn url(server: &MockServer, name: &str) -> Identifier {
    Identifier::new(format!("{}/images/{}", server.uri(), name))
}

fn fetcher() -> SourceFetcher {
    SourceFetcher::new(FetchOptions::default()).expect("failed to create fetcher")
}

#[tokio::test]
async fn test_events_partial_failure() {
    let server = image_server().await;
    let bad = url(&server, "other.jpg");
    let ok = url(&server, "nujji.png");

    let mut aggregator = LoadAggregator::new(fetcher(), vec![bad.clone(), ok.clone()]).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    for channel in [Channel::Progress, Channel::Error, Channel::Complete] {
        let log = Arc::clone(&log);
        aggregator.on(channel, move |e: &ProgressEvent| {
            log.lock().unwrap().push((
                channel,
                e.identifier.clone(),
                e.settled,
                e.percent_complete,
            ));
        });
    }

    let summary = aggregator.run().await;

    let log = log.lock().unwrap().clone();
    assert_eq!(log.len(), 3);

    // Either item may settle first; each notification carries its own count.
    let error = log.iter().find(|e| e.0 == Channel::Error).unwrap();
    let progress = log.iter().find(|e| e.0 == Channel::Progress).unwrap();
    assert_eq!(error.1, bad);
    assert_eq!(progress.1, ok);
    assert_eq!(error.3, error.2 as f64 / 2.0);
    assert_eq!(progress.3, progress.2 as f64 / 2.0);

    let mut counts = vec![log[0].2, log[1].2];
    counts.sort();
    assert_eq!(counts, vec![1, 2]);
    assert_eq!(log[0].2, 1);

    let complete = &log[2];
    assert_eq!(complete.0, Channel::Complete);
    assert_eq!(complete.1, log[1].1);
    assert_eq!(complete.3, 1.0);

    assert_eq!(summary.failed, vec![bad]);
    assert_eq!(summary.loaded, 1);
}

#[tokio::test]
async fn test_load_all_positions() {
    let server = image_server().await;
    let ids = vec![url(&server, "other.jpg"), url(&server, "nujji.png")];

    let images = load_all(&fetcher(), &ids).await;

    assert_eq!(images.len(), 2);
    assert!(images[0].is_none());
    let image = images[1].as_ref().expect("nujji.png should load");
    assert_eq!(image.data, PNG);
    assert_eq!(image.content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn test_settle_all_reports_reason() {
    let server = image_server().await;
    let ids = vec![url(&server, "other.jpg"), url(&server, "nujji.png")];

    let results = settle_all(&fetcher(), &ids).await;

    let failure = results[0].as_ref().unwrap_err();
    assert_eq!(failure.identifier, ids[0]);
    assert_eq!(failure.reason, FailureReason::Status(404));
    assert!(results[1].is_ok());
}

#[tokio::test]
async fn test_load_each_reports_every_item() {
    let server = image_server().await;
    let ids = vec![url(&server, "nujji.png"), url(&server, "other.jpg")];

    let mut errors = Vec::new();
    let mut images = Vec::new();
    let loaded = load_each(&fetcher(), &ids, |result| match result {
        Ok(artifact) => images.push(artifact.identifier.clone()),
        Err(failure) => errors.push(failure.identifier),
    })
    .await;

    assert_eq!(loaded, 1);
    assert_eq!(images, vec![ids[0].clone()]);
    assert_eq!(errors, vec![ids[1].clone()]);
}

#[tokio::test]
async fn test_unreachable_host_is_a_failed_item() {
    // Nothing listens on port 9 on localhost.
    let ids = vec![Identifier::from("http://127.0.0.1:9/none.png")];
    let options = FetchOptions {
        timeout_seconds: 2,
        ..FetchOptions::default()
    };
    let fetcher = SourceFetcher::new(options).unwrap();

    let images = load_all(&fetcher, &ids).await;
    assert_eq!(images.len(), 1);
    assert!(images[0].is_none());
}
