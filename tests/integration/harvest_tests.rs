//! Integration tests for the harvester
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! harvest cycle end-to-end, both through the library and the binary.

use status_harvester::config::Config;
use status_harvester::harvester::run_harvest;
use status_harvester::storage::{load_feed, load_manifest, MANIFEST_FILE};
use status_harvester::RunOutcome;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, save_dir: &Path, timeout: u64, min_feeds: usize) -> Config {
    let mut config = Config::default();
    config.collector.dashboard_url = format!("{}/", base_url);
    config.collector.save_dir = save_dir.display().to_string();
    config.collector.timeout = timeout;
    config.collector.min_feeds = min_feeds;

    config.retry.dashboard_timeout_min = 1;
    config.retry.dashboard_timeout_max = 2;
    config.retry.feed_timeout_min = 1;
    config.retry.feed_timeout_max = 2;
    config.retry.pause_ms = 50;

    config.user_agent.crawler_name = "TestHarvester".to_string();
    config.user_agent.crawler_version = "1.0.0".to_string();
    config.user_agent.contact_url = "https://example.com/contact".to_string();
    config.user_agent.contact_email = "test@example.com".to_string();
    config
}

fn feed_path(i: usize) -> String {
    format!("/rss/feed{}.rss", i)
}

fn feed_body(i: usize) -> String {
    format!("<rss><channel><title>Feed {}</title></channel></rss>", i)
}

/// Mounts a dashboard listing `count` feeds plus some unrelated links
async fn mount_dashboard(server: &MockServer, count: usize) {
    let links: String = (0..count)
        .map(|i| format!(r#"<li><a href="{}">Feed {}</a></li>"#, feed_path(i), i))
        .collect();
    let page = format!(
        r#"<html><body>
        <a href="/about.html">About</a>
        <ul>{}</ul>
        <a href="/history.html">History</a>
        </body></html>"#,
        links
    );

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts healthy feeds for the given indices
async fn mount_feeds(server: &MockServer, indices: impl IntoIterator<Item = usize>) {
    for i in indices {
        Mock::given(method("GET"))
            .and(path(feed_path(i)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(feed_body(i))
                    .insert_header("content-type", "application/rss+xml"),
            )
            .mount(server)
            .await;
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_all_feeds_fetched() {
    let mock_server = MockServer::start().await;
    mount_dashboard(&mock_server, 5).await;
    mount_feeds(&mock_server, 0..5).await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), tmp.path(), 30, 3);

    let outcome = run_harvest(&config).await.expect("harvest failed");

    assert_eq!(outcome.exit_code(), 0);
    let run_dir = outcome.run_dir().unwrap();
    assert_eq!(run_dir.parent().unwrap(), tmp.path());

    let manifest = load_manifest(run_dir).unwrap();
    assert_eq!(manifest.discovered_count(), 5);
    assert_eq!(manifest.fetched_count(), 5);
    assert_eq!(manifest.dashboard_url, format!("{}/", mock_server.uri()));

    let names = entries(run_dir);
    assert_eq!(names.len(), 6);
    assert!(names.contains(&MANIFEST_FILE.to_string()));
    assert_eq!(names.iter().filter(|n| n.ends_with(".rss.gz")).count(), 5);

    for i in 0..5 {
        let url = format!("{}{}", mock_server.uri(), feed_path(i));
        let record = manifest.get(&url).expect("missing record");
        assert_eq!(load_feed(run_dir, &record.file).unwrap(), feed_body(i));
        assert_eq!(record.size, feed_body(i).len() as u64);
    }
}

#[tokio::test]
async fn test_dashboard_never_succeeds() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let save_dir = tmp.path().join("saved");
    let config = create_test_config(&mock_server.uri(), &save_dir, 2, 1);

    let outcome = run_harvest(&config).await.expect("harvest failed");

    assert_eq!(outcome.exit_code(), 3);
    assert!(matches!(outcome, RunOutcome::DashboardTimeout { .. }));
    assert!(!save_dir.exists());

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.len() > 1, "dashboard should have been retried");
}

#[tokio::test]
async fn test_one_feed_never_succeeds() {
    let mock_server = MockServer::start().await;
    mount_dashboard(&mock_server, 5).await;
    mount_feeds(&mock_server, [0, 1, 3, 4]).await;
    Mock::given(method("GET"))
        .and(path(feed_path(2)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), tmp.path(), 2, 1);

    let outcome = run_harvest(&config).await.expect("harvest failed");

    assert_eq!(outcome.exit_code(), 4);
    match &outcome {
        RunOutcome::FeedsTimeout {
            fetched,
            discovered,
            ..
        } => {
            assert_eq!(*fetched, 4);
            assert_eq!(*discovered, 5);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let run_dir = outcome.run_dir().unwrap();
    let manifest = load_manifest(run_dir).unwrap();
    assert_eq!(manifest.fetched_count(), 4);
    assert_eq!(
        manifest.missing(),
        vec![format!("{}{}", mock_server.uri(), feed_path(2))]
    );
    assert_eq!(entries(run_dir).len(), 5);
}

#[tokio::test]
async fn test_too_few_feeds() {
    let mock_server = MockServer::start().await;
    mount_dashboard(&mock_server, 2).await;
    mount_feeds(&mock_server, 0..2).await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), tmp.path(), 30, 10);

    let outcome = run_harvest(&config).await.expect("harvest failed");

    assert_eq!(outcome.exit_code(), 5);
    assert_eq!(
        outcome.to_string(),
        "Found 2 feeds, less than expected minimum of 10."
    );
    let manifest = load_manifest(outcome.run_dir().unwrap()).unwrap();
    assert_eq!(manifest.fetched_count(), 2);
}

#[tokio::test]
async fn test_flaky_feed_is_requeued() {
    let mock_server = MockServer::start().await;
    mount_dashboard(&mock_server, 3).await;

    // First two attempts at feed 1 fail, later ones fall through to the
    // healthy mock below
    Mock::given(method("GET"))
        .and(path(feed_path(1)))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    mount_feeds(&mock_server, 0..3).await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), tmp.path(), 30, 1);

    let outcome = run_harvest(&config).await.expect("harvest failed");

    assert!(outcome.is_success());
    let manifest = load_manifest(outcome.run_dir().unwrap()).unwrap();
    assert_eq!(manifest.fetched_count(), 3);

    let requests = mock_server.received_requests().await.unwrap();
    let feed1_hits = requests
        .iter()
        .filter(|r| r.url.path() == feed_path(1))
        .count();
    assert_eq!(feed1_hits, 3);
}

#[tokio::test]
async fn test_slow_feed_times_out_and_is_retried() {
    let mock_server = MockServer::start().await;
    mount_dashboard(&mock_server, 2).await;

    // Slower than the 1-2s attempt timeout, once
    Mock::given(method("GET"))
        .and(path(feed_path(0)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(feed_body(0))
                .set_delay(Duration::from_secs(4)),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_feeds(&mock_server, 0..2).await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), tmp.path(), 30, 1);

    let outcome = run_harvest(&config).await.expect("harvest failed");

    assert!(outcome.is_success());
    let manifest = load_manifest(outcome.run_dir().unwrap()).unwrap();
    let url = format!("{}{}", mock_server.uri(), feed_path(0));
    let record = manifest.get(&url).unwrap();
    assert!(record.elapsed < 1.0);
}

#[tokio::test]
async fn test_user_agent_sent() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestHarvester/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), tmp.path(), 5, 0);

    let outcome = run_harvest(&config).await.expect("harvest failed");

    assert!(outcome.is_success());
}

async fn run_binary(args: &[&str]) -> std::process::Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_status-harvester"))
        .args(args)
        .output()
        .await
        .expect("failed to run binary")
}

#[tokio::test]
async fn test_binary_exit_success() {
    let mock_server = MockServer::start().await;
    mount_dashboard(&mock_server, 3).await;
    mount_feeds(&mock_server, 0..3).await;

    let tmp = TempDir::new().unwrap();
    let dashboard = format!("{}/", mock_server.uri());
    let save_dir = tmp.path().display().to_string();

    let output = run_binary(&["-d", &dashboard, "-t", "30", "-m", "3", "-s", &save_dir]).await;

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    assert_eq!(entries(tmp.path()).len(), 1);
}

#[tokio::test]
async fn test_binary_exit_dashboard_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let dashboard = format!("{}/", mock_server.uri());
    let save_dir = tmp.path().join("saved").display().to_string();

    let output = run_binary(&["-d", &dashboard, "-t", "2", "-s", &save_dir]).await;

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("within timeout of 2 seconds"), "{}", stderr);
}

#[tokio::test]
async fn test_binary_exit_too_few_feeds() {
    let mock_server = MockServer::start().await;
    mount_dashboard(&mock_server, 2).await;
    mount_feeds(&mock_server, 0..2).await;

    let tmp = TempDir::new().unwrap();
    let dashboard = format!("{}/", mock_server.uri());
    let save_dir = tmp.path().display().to_string();

    let output = run_binary(&["-d", &dashboard, "-t", "30", "-m", "10", "-s", &save_dir]).await;

    assert_eq!(output.status.code(), Some(5));
}

#[tokio::test]
async fn test_binary_exit_unexpected_error() {
    let tmp = TempDir::new().unwrap();
    let save_dir = tmp.path().display().to_string();

    // Nothing listens on port 1, so the connection is refused
    let output = run_binary(&["-d", "http://127.0.0.1:1/", "-t", "10", "-s", &save_dir]).await;

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("ERROR:") || stderr.contains("\nERROR:"), "{}", stderr);
}

#[tokio::test]
async fn test_binary_inspect() {
    let mock_server = MockServer::start().await;
    mount_dashboard(&mock_server, 2).await;
    mount_feeds(&mock_server, 0..2).await;

    let tmp = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), tmp.path(), 30, 1);
    let outcome = run_harvest(&config).await.expect("harvest failed");
    let run_dir = outcome.run_dir().unwrap().display().to_string();

    let output = run_binary(&["--inspect", &run_dir]).await;

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Discovered: 2"), "{}", stdout);
    assert!(stdout.contains("Fetched: 2"), "{}", stdout);
}
