//! Integration tests for PhaserDocs using wiremock

use phaserdocs::{
    DocsClient, DocsConfig, DocsError, DocsTool, ReadDocumentationParams,
    SearchDocumentationParams,
};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str, max_retries: u32) -> DocsConfig {
    DocsConfig::default()
        .with_base_url(base_url)
        .with_max_retries(max_retries)
        .with_retry_delay(Duration::from_millis(0))
}

fn client(server: &MockServer, max_retries: u32) -> DocsClient {
    DocsClient::new(&test_config(&server.uri(), max_retries)).unwrap()
}

#[tokio::test]
async fn test_fetch_page_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/phaser/getting-started"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body><main><p>Welcome</p></main></body></html>", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0);
    let html = client
        .fetch_page(&format!("{}/phaser/getting-started", mock_server.uri()))
        .await
        .unwrap();

    assert!(html.contains("Welcome"));
}

#[tokio::test]
async fn test_sends_identifying_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header(
            "user-agent",
            "Phaser-MCP-Server/1.0.0 (Documentation Access Bot)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>ok</p>", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0);
    client
        .fetch_page(&format!("{}/page", mock_server.uri()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_error_retried_to_ceiling() {
    let mock_server = MockServer::start().await;

    // max_retries = 2 means exactly 3 attempts
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 2);
    let err = client
        .fetch_page(&format!("{}/flaky", mock_server.uri()))
        .await
        .unwrap_err();

    match err {
        DocsError::Http(msg) => assert!(msg.contains("500"), "got: {msg}"),
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_recovers_when_server_comes_back() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recovering"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/recovering"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>back up</p>", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 2);
    let html = client
        .fetch_page(&format!("{}/recovering", mock_server.uri()))
        .await
        .unwrap();

    assert!(html.contains("back up"));
}

#[tokio::test]
async fn test_not_found_fails_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 3);
    let err = client
        .fetch_page(&format!("{}/missing", mock_server.uri()))
        .await
        .unwrap_err();

    match err {
        DocsError::Http(msg) => assert!(msg.starts_with("Page not found"), "got: {msg}"),
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_fails_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 3);
    let err = client
        .fetch_page(&format!("{}/private", mock_server.uri()))
        .await
        .unwrap_err();

    match err {
        DocsError::Http(msg) => assert!(msg.starts_with("Access forbidden"), "got: {msg}"),
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_exhausts_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 2);
    let err = client
        .fetch_page(&format!("{}/limited", mock_server.uri()))
        .await
        .unwrap_err();

    match err {
        DocsError::RateLimit(msg) => assert!(msg.contains("after 2 retries"), "got: {msg}"),
        other => panic!("expected RateLimit error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_oversized_response_rejected() {
    let mock_server = MockServer::start().await;

    let body = "x".repeat(1024 * 1024 + 1);
    Mock::given(method("GET"))
        .and(path("/huge"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 2);
    let err = client
        .fetch_page(&format!("{}/huge", mock_server.uri()))
        .await
        .unwrap_err();

    match err {
        DocsError::Validation(msg) => assert!(msg.contains("too large"), "got: {msg}"),
        other => panic!("expected Validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_get_page_content_extracts_metadata() {
    let mock_server = MockServer::start().await;

    let html = "<html><head><title>Sprites - Phaser</title></head><body>\
                <main><p>Sprite docs here.</p></main></body></html>";
    Mock::given(method("GET"))
        .and(path("/sprites"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html, "text/html")
                .insert_header("last-modified", "Tue, 01 Jan 2024 00:00:00 GMT"),
        )
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0);
    let page = client
        .get_page_content(&format!("{}/sprites", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(page.title, "Sprites");
    assert_eq!(
        page.last_modified.as_deref(),
        Some("Tue, 01 Jan 2024 00:00:00 GMT")
    );
    assert!(page.word_count > 0);
}

#[tokio::test]
async fn test_health_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0);
    assert!(client.health_check().await.is_ok());
}

#[tokio::test]
async fn test_read_documentation_end_to_end() {
    let mock_server = MockServer::start().await;

    let html = r#"<html><head><title>Scenes - Phaser</title></head><body>
        <nav>site nav</nav>
        <main>
          <h1>Scenes</h1>
          <p>A scene owns its display list.</p>
          <pre><code>const scene = new Phaser.Scene('main');
this.scene.start('main');</code></pre>
        </main>
    </body></html>"#;

    Mock::given(method("GET"))
        .and(path("/phaser/scenes"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(&mock_server)
        .await;

    let tool = DocsTool::new(&test_config(&mock_server.uri(), 0)).unwrap();
    let markdown = tool
        .read_documentation(ReadDocumentationParams {
            url: format!("{}/phaser/scenes", mock_server.uri()),
            max_length: 5000,
            start_index: 0,
        })
        .await
        .unwrap();

    assert!(markdown.starts_with("# Scenes"));
    assert!(markdown.contains("A scene owns its display list."));
    assert!(markdown.contains("```javascript"), "got: {markdown}");
    assert!(markdown.contains("new Phaser.Scene"));
    assert!(!markdown.contains("site nav"));
}

#[tokio::test]
async fn test_read_documentation_pagination() {
    let mock_server = MockServer::start().await;

    let html = "<main><h1>Long</h1><p>abcdefghij klmnopqrst uvwxyz</p></main>";
    Mock::given(method("GET"))
        .and(path("/long"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(&mock_server)
        .await;

    let tool = DocsTool::new(&test_config(&mock_server.uri(), 0)).unwrap();
    let url = format!("{}/long", mock_server.uri());

    let first = tool
        .read_documentation(ReadDocumentationParams {
            url: url.clone(),
            max_length: 10,
            start_index: 0,
        })
        .await
        .unwrap();
    assert_eq!(first.chars().count(), 10);

    let second = tool
        .read_documentation(ReadDocumentationParams {
            url: url.clone(),
            max_length: 10,
            start_index: 10,
        })
        .await
        .unwrap();
    assert_ne!(first, second);

    // Past the end yields empty, not an error
    let past_end = tool
        .read_documentation(ReadDocumentationParams {
            url,
            max_length: 10,
            start_index: 1_000_000,
        })
        .await
        .unwrap();
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn test_search_documentation_offline() {
    // Search never touches the network; a real server is not needed
    let tool = DocsTool::new(&DocsConfig::default()).unwrap();
    let results = tool
        .search_documentation(SearchDocumentationParams {
            query: "sprite animation".to_string(),
            limit: 5,
        })
        .await
        .unwrap();

    assert!(!results.is_empty());
    assert!(results.len() <= 5);
    assert_eq!(results[0].rank_order, 1);
    for pair in results.windows(2) {
        assert!(pair[0].relevance_score >= pair[1].relevance_score);
    }
}

#[tokio::test]
async fn test_get_api_reference_fallback_chain() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Sprite"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let html = r#"<html><body>
        <h1>Phaser.Sprite</h1>
        <div class="description">A Sprite Game Object.</div>
        <div class="method">setTexture(key, frame)</div>
        <div data-property>anims</div>
    </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/api/Phaser.Sprite"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0);
    let api = client.get_api_reference("Sprite").await.unwrap();

    assert_eq!(api.class_name, "Sprite");
    assert_eq!(api.description, "A Sprite Game Object.");
    assert!(api.url.ends_with("/api/Phaser.Sprite"));
    assert_eq!(api.methods, vec!["setTexture"]);
    assert_eq!(api.properties, vec!["anims"]);
}

#[tokio::test]
async fn test_get_api_reference_stub_when_all_candidates_missing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(4)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0);
    let api = client.get_api_reference("Nonexistent").await.unwrap();

    assert_eq!(api.class_name, "Nonexistent");
    assert!(api.description.contains("No specific documentation page found"));
    assert!(api.url.ends_with("/api/Nonexistent"));
    assert!(api.methods.is_empty());
}

#[tokio::test]
async fn test_get_api_reference_aborts_on_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/Broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 0);
    let err = client.get_api_reference("Broken").await.unwrap_err();
    assert!(matches!(err, DocsError::Http(_)));
}
