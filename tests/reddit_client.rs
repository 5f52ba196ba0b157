#[path = "common/mod.rs"]
mod common;

use common::*;
use serde_json::json;
use tea_scraper::{FetchError, RedditClient, RedditSettings, Secret, TeaRow, TeaScraper, TEA_SUBREDDIT_ID};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings_for(server: &MockServer) -> RedditSettings {
    RedditSettings {
        client_id: "id".to_string(),
        client_secret: Secret::new("secret"),
        auth_base: server.uri(),
        api_base: server.uri(),
        ..RedditSettings::default()
    }
}

/// Token endpoint that must be hit exactly once per test.
async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .and(header("authorization", "Basic aWQ6c2VjcmV0"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "token_type": "bearer",
            "expires_in": 86400,
            "scope": "*"
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Comment page with one collapsed stub; the stub is expanded through
/// `/api/morechildren` and the token is reused.
#[tokio::test]
async fn submission_with_comments_expands_more_stubs() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/comments/abc123"))
        .and(query_param("raw_json", "1"))
        .and(query_param("limit", "2048"))
        .and(query_param("sort", "confidence"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comment_page_json(
            "abc123",
            vec![
                comment_json("a", "t3_abc123", 3, json!("")),
                comment_json("n", "t3_abc123", -1, json!("")),
                more_json("m", "t3_abc123", &["b"]),
            ],
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/morechildren"))
        .and(query_param("api_type", "json"))
        .and(query_param("link_id", "t3_abc123"))
        .and(query_param("children", "b"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(morechildren_json(vec![comment_json(
            "b",
            "t1_a",
            2,
            json!(""),
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = RedditClient::new(settings_for(&server)).unwrap();
    let fetched = client.submission_with_comments("abc123").await.unwrap();

    assert_eq!(fetched.submission.id, "abc123");
    assert_eq!(fetched.submission.subreddit_id.as_deref(), Some(TEA_SUBREDDIT_ID));
    let ids: Vec<&str> = fetched.forest.comments().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "n", "b"]);

    let row = TeaRow::from_submission(&fetched.submission, &fetched.forest);
    assert_eq!(row.comments, vec!["<p>body a</p>", "<p>body b</p>"]);
}

#[tokio::test]
async fn continue_thread_stub_fetches_the_subthread() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/comments/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comment_page_json(
            "abc123",
            vec![comment_json("a", "t3_abc123", 3, listing_json(vec![more_json("_", "t1_a", &[])]))],
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/comments/abc123/_/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comment_page_json(
            "abc123",
            vec![comment_json("a", "t3_abc123", 3, listing_json(vec![comment_json("deep", "t1_a", 4, json!(""))]))],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = RedditClient::new(settings_for(&server)).unwrap();
    let fetched = client.submission_with_comments("abc123").await.unwrap();
    let ids: Vec<&str> = fetched.forest.comments().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "deep"]);
}

#[tokio::test]
async fn forbidden_submission_maps_to_forbidden() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/comments/gone"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"reason": "private", "error": 403})))
        .mount(&server)
        .await;

    let mut client = RedditClient::new(settings_for(&server)).unwrap();
    let err = client.submission("gone").await.unwrap_err();
    assert!(err.is_forbidden(), "got {err:?}");
}

#[tokio::test]
async fn server_error_maps_to_status() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/comments/boom"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut client = RedditClient::new(settings_for(&server)).unwrap();
    match client.submission("boom").await {
        Err(FetchError::Status { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected status error, got {:?}", other.map(|f| f.submission.id)),
    }
}

/// Reddit reports bad credentials as 200 with an `error` field.
#[tokio::test]
async fn token_error_body_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let mut client = RedditClient::new(settings_for(&server)).unwrap();
    assert!(matches!(client.submission("abc123").await, Err(FetchError::Auth(_))));
}

/// The real client behind the pipeline: a forbidden post is skipped and the
/// next one stored.
#[tokio::test]
async fn pipeline_over_http() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/comments/t1a"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/comments/t1b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comment_page_json(
            "t1b",
            vec![comment_json("x", "t3_t1b", 8, json!(""))],
        )))
        .mount(&server)
        .await;

    let base = temp_base();
    let dump = base.join("RS_2022-12");
    write_plain_lines(
        &dump,
        &[dump_line(TEA_SUBREDDIT_ID, 5, "t1a"), dump_line(TEA_SUBREDDIT_ID, 2, "t1b")],
    );

    let scraper = TeaScraper::new().dump_path(&dump).progress(false);
    let mut client = RedditClient::new(settings_for(&server)).unwrap();
    let mut store = MemoryStore::default();
    let report = scraper.run(&mut client, &mut store).await.unwrap();

    assert_eq!(report.forbidden, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(store.rows["t1b"].comments, vec!["<p>body x</p>"]);
}
