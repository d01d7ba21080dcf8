//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run whole tasks
//! end-to-end, checking what was requested and what landed on disk.

use spindle::config::{Action, ActionOption, Config, CrawlerConfig, OutputConfig, Task};
use spindle::crawler::crawl;
use spindle::output::TaskReport;
use spindle::MimeRegistry;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a configuration with one task running `actions`
fn create_test_config(data_root: &Path, actions: Vec<Action>) -> Config {
    let task = Task {
        name: "test".to_string(),
        hour: 0,
        minute: 0,
        second: 0,
        actions: actions.iter().map(|a| a.name.clone()).collect(),
    };

    Config {
        crawler: CrawlerConfig {
            poll_interval_ms: 50,
            transfer_timeout_secs: 5,
            ..CrawlerConfig::default()
        },
        output: OutputConfig {
            data_root: data_root.to_path_buf(),
            summary_path: None,
        },
        actions,
        tasks: vec![task],
        ..Config::default()
    }
}

async fn mount(server: &MockServer, route: &str, body: &str, mime: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), mime))
        .mount(server)
        .await;
}

async fn run(config: Config) -> TaskReport {
    let mut reports = crawl(config, Arc::new(MimeRegistry::builtin()), None)
        .await
        .expect("crawl failed");
    assert_eq!(reports.len(), 1);
    reports.remove(0)
}

async fn request_paths(server: &MockServer) -> Vec<String> {
    let mut paths: Vec<String> = server
        .received_requests()
        .await
        .expect("request recording disabled")
        .iter()
        .map(|r| r.url.path().to_string())
        .collect();
    paths.sort();
    paths
}

#[tokio::test]
async fn test_mutual_links_fetched_once() {
    let server = MockServer::start().await;
    mount(&server, "/", r#"<a href="/other">other</a>"#, "text/html").await;
    mount(&server, "/other", r#"<a href="/">back</a>"#, "text/html").await;

    let data = TempDir::new().unwrap();
    let action = Action::new("site", format!("{}/", server.uri()))
        .with_option(ActionOption::MaxDepth(1));
    let report = run(create_test_config(data.path(), vec![action])).await;

    assert_eq!(request_paths(&server).await, vec!["/", "/other"]);
    let stats = &report.actions[0];
    assert_eq!(stats.transfers_started, 2);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.failed, 0);
    assert!(!report.timed_out);
}

#[tokio::test]
async fn test_depth_bound_and_foreign_host() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;

    mount(
        &site,
        "/",
        &format!(
            r#"<html><body>
            <a href="/about">About</a>
            <a href="{}/z">Elsewhere</a>
            <a href="mailto:someone@x.test">Mail</a>
            </body></html>"#,
            other.uri()
        ),
        "text/html",
    )
    .await;
    mount(&site, "/about", r#"<a href="/deeper">deeper</a>"#, "text/html").await;
    mount(&site, "/deeper", "too deep", "text/html").await;
    mount(&other, "/z", r#"<a href="/zz">zz</a>"#, "text/html").await;

    let data = TempDir::new().unwrap();
    let action = Action::new("site", format!("{}/", site.uri()))
        .with_option(ActionOption::MaxDepth(1));
    let report = run(create_test_config(data.path(), vec![action])).await;

    assert_eq!(request_paths(&site).await, vec!["/", "/about"]);
    assert_eq!(request_paths(&other).await, vec!["/z"]);

    let stats = &report.actions[0];
    assert_eq!(stats.succeeded, 3);
    assert_eq!(stats.max_depth_reached, 1);
    assert_eq!(stats.files_kept, 3);

    let text_dir = data.path().join("site").join("text");
    assert!(text_dir.join("index.html").exists());
    assert!(text_dir.join("about.html").exists());
    assert!(text_dir.join("z.html").exists());
    assert!(!text_dir.join("deeper.html").exists());
}

#[tokio::test]
async fn test_max_depth_zero_fetches_seed_only() {
    let server = MockServer::start().await;
    mount(&server, "/", r#"<a href="/next">next</a>"#, "text/html").await;
    mount(&server, "/next", "next", "text/html").await;

    let data = TempDir::new().unwrap();
    let action = Action::new("site", format!("{}/", server.uri()));
    let report = run(create_test_config(data.path(), vec![action])).await;

    assert_eq!(request_paths(&server).await, vec!["/"]);
    assert_eq!(report.actions[0].links_seen, 0);
    assert!(data
        .path()
        .join("site")
        .join("text")
        .join("index.html")
        .exists());
}

#[tokio::test]
async fn test_type_filter_discards_extraction_html() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        r#"<img src="/logo.png"><a href="/page">page</a>"#,
        "text/html; charset=utf-8",
    )
    .await;
    mount(&server, "/page", "page", "text/html").await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0x89u8, b'P', b'N', b'G'], "image/png"),
        )
        .mount(&server)
        .await;

    let data = TempDir::new().unwrap();
    let action = Action::new("images", format!("{}/", server.uri()))
        .with_option(ActionOption::MaxDepth(1))
        .with_option(ActionOption::TypeSelect(["image/png".to_string()].into()));
    let report = run(create_test_config(data.path(), vec![action])).await;

    assert_eq!(request_paths(&server).await, vec!["/", "/logo.png", "/page"]);

    let stats = &report.actions[0];
    assert_eq!(stats.files_kept, 1);
    assert_eq!(stats.files_discarded, 1);
    assert_eq!(stats.write_errors, 0);

    let action_dir = data.path().join("images");
    assert_eq!(
        std::fs::read(action_dir.join("image").join("logo.png")).unwrap(),
        vec![0x89u8, b'P', b'N', b'G']
    );
    assert!(!action_dir.join("text").join("index.html").exists());
    assert!(!action_dir.join("text").join("page.html").exists());
}

#[tokio::test]
async fn test_same_named_extraction_pages_all_expanded() {
    let server = MockServer::start().await;
    let seed: String = (0..40)
        .map(|i| format!(r#"<a href="/d{}/page">page {}</a>"#, i, i))
        .collect();
    mount(&server, "/", &seed, "text/html").await;

    let padding = "x".repeat(100_000);
    for i in 0..40 {
        mount(
            &server,
            &format!("/d{}/page", i),
            &format!(r#"{}<img src="/t{}">{}"#, padding, i, padding),
            "text/html",
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path_regex(r"^/t\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89u8, b'P'], "image/png"))
        .mount(&server)
        .await;

    let data = TempDir::new().unwrap();
    let action = Action::new("images", format!("{}/", server.uri()))
        .with_option(ActionOption::MaxDepth(2))
        .with_option(ActionOption::TypeSelect(["image/png".to_string()].into()));
    let mut config = create_test_config(data.path(), vec![action]);
    config.crawler.max_concurrent_transfers = Some(20);
    let report = run(config).await;

    let targets = request_paths(&server)
        .await
        .into_iter()
        .filter(|p| p.starts_with("/t"))
        .count();
    assert_eq!(targets, 40);

    let stats = &report.actions[0];
    assert_eq!(stats.files_kept, 40);
    assert_eq!(stats.files_discarded, 41);
    assert_eq!(stats.write_errors, 0);
    assert_eq!(
        std::fs::read_dir(data.path().join("images").join("image"))
            .unwrap()
            .count(),
        40
    );
}

#[tokio::test]
async fn test_same_file_name_kept_for_every_page() {
    let server = MockServer::start().await;
    let seed = r#"<a href="/en/index">en</a><a href="/fr/index">fr</a>"#;
    mount(&server, "/", seed, "text/html").await;
    mount(&server, "/en/index", "ENGLISH", "text/html").await;
    mount(&server, "/fr/index", "FRENCH", "text/html").await;

    let data = TempDir::new().unwrap();
    let action = Action::new("site", format!("{}/", server.uri()))
        .with_option(ActionOption::MaxDepth(1));
    let report = run(create_test_config(data.path(), vec![action])).await;
    assert_eq!(report.actions[0].files_kept, 3);

    let text_dir = data.path().join("site").join("text");
    let mut names: Vec<String> = std::fs::read_dir(&text_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["index-1.html", "index-2.html", "index.html"]);

    let mut contents: Vec<String> = names
        .iter()
        .map(|name| std::fs::read_to_string(text_dir.join(name)).unwrap())
        .collect();
    contents.sort();
    let mut expected = vec![seed.to_string(), "ENGLISH".to_string(), "FRENCH".to_string()];
    expected.sort();
    assert_eq!(contents, expected);
}

#[tokio::test]
async fn test_http_error_is_dropped() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        r#"<a href="/gone">gone</a><a href="/here">here</a>"#,
        "text/html",
    )
    .await;
    mount(&server, "/here", "here", "text/html").await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let data = TempDir::new().unwrap();
    let action = Action::new("site", format!("{}/", server.uri()))
        .with_option(ActionOption::MaxDepth(1));
    let report = run(create_test_config(data.path(), vec![action])).await;

    let stats = &report.actions[0];
    assert_eq!(stats.transfers_started, 3);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.failed, 1);
    assert!(!data.path().join("site").join("text").join("gone.html").exists());
}

#[tokio::test]
async fn test_hyperlink_index_written() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        r#"<a href="/b">b</a><a href="/a">a</a><a href="/a">again</a>"#,
        "text/html",
    )
    .await;
    mount(&server, "/a", "a", "text/html").await;
    mount(&server, "/b", "b", "text/html").await;

    let data = TempDir::new().unwrap();
    let action = Action::new("my site", format!("{}/", server.uri()))
        .with_option(ActionOption::MaxDepth(1));
    run(create_test_config(data.path(), vec![action])).await;

    let host = server.uri().trim_start_matches("http://").to_string();
    let index = std::fs::read_to_string(data.path().join("my_site").join("hyperlinks.txt")).unwrap();
    let lines: Vec<&str> = index.lines().collect();
    assert_eq!(
        lines,
        vec![host.clone(), format!("{}/a", host), format!("{}/b", host)]
    );
}

#[tokio::test]
async fn test_actions_of_a_task_run_together() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount(&first, "/", "first", "text/html").await;
    mount(&second, "/", "second", "text/html").await;

    let data = TempDir::new().unwrap();
    let actions = vec![
        Action::new("one", format!("{}/", first.uri())),
        Action::new("two", format!("{}/", second.uri())),
    ];
    let report = run(create_test_config(data.path(), actions)).await;

    assert_eq!(report.actions.len(), 2);
    assert_eq!(report.actions[0].action, "one");
    assert_eq!(report.actions[1].action, "two");
    assert_eq!(
        std::fs::read_to_string(data.path().join("one").join("text").join("index.html")).unwrap(),
        "first"
    );
    assert_eq!(
        std::fs::read_to_string(data.path().join("two").join("text").join("index.html")).unwrap(),
        "second"
    );
}

#[tokio::test]
async fn test_versioning_keeps_run_directory() {
    let server = MockServer::start().await;
    mount(&server, "/", "v1", "text/html").await;

    let data = TempDir::new().unwrap();
    let action = Action::new("site", format!("{}/", server.uri()))
        .with_option(ActionOption::Versioning(true));
    run(create_test_config(data.path(), vec![action])).await;

    let runs: Vec<_> = std::fs::read_dir(data.path().join("site"))
        .unwrap()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().unwrap().is_dir())
        .collect();
    assert_eq!(runs.len(), 1);

    let stamp = runs[0].file_name().into_string().unwrap();
    assert_eq!(stamp.len(), "20240101T000000".len());
    assert_eq!(
        std::fs::read_to_string(runs[0].path().join("text").join("index.html")).unwrap(),
        "v1"
    );
}

#[tokio::test]
async fn test_unknown_task_is_an_error() {
    let data = TempDir::new().unwrap();
    let config = create_test_config(data.path(), vec![Action::new("a", "http://a.test/")]);

    let result = crawl(config, Arc::new(MimeRegistry::builtin()), Some("missing")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_markdown_summary_after_crawl() {
    let server = MockServer::start().await;
    mount(&server, "/", "home", "text/html").await;

    let data = TempDir::new().unwrap();
    let action = Action::new("site", format!("{}/", server.uri()));
    let report = run(create_test_config(data.path(), vec![action])).await;

    let summary = data.path().join("reports").join("summary.md");
    spindle::output::generate_markdown_summary(&[report], &summary).unwrap();

    let content = std::fs::read_to_string(&summary).unwrap();
    assert!(content.contains("test"));
    assert!(content.contains("site"));
}
