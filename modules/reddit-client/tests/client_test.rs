use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reddit_client::{ListingSort, RedditClient, RedditError, Thing};

fn client(base_url: &str) -> RedditClient {
    RedditClient::new("leadscan-test/0.1", Duration::from_secs(2))
        .unwrap()
        .with_base_url(base_url)
}

#[tokio::test]
async fn new_listing_is_read_with_agent_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/Gold/new.json"))
        .and(query_param("limit", "25"))
        .and(header("user-agent", "leadscan-test/0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "Listing",
            "data": {
                "after": "t3_abc",
                "children": [
                    { "kind": "t3", "data": { "id": "abc", "name": "t3_abc", "title": "Where can I buy gold", "is_self": true } }
                ]
            }
        })))
        .mount(&server)
        .await;

    let things = client(&server.uri())
        .listing("Gold", ListingSort::New, 25)
        .await
        .unwrap();
    assert_eq!(things.len(), 1);
    assert!(matches!(&things[0], Thing::Submission(s) if s.fullname() == "t3_abc"));
}

#[tokio::test]
async fn too_many_requests_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/Gold/hot.json"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .listing("Gold", ListingSort::Hot, 25)
        .await
        .unwrap_err();
    assert!(
        matches!(err, RedditError::RateLimited { retry_after_secs: Some(7) }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn server_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/Gold/new.json"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .listing("Gold", ListingSort::New, 25)
        .await
        .unwrap_err();
    match err {
        RedditError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream down");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn thread_returns_comments_from_the_second_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/Gold/comments/abc/where_to_buy.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "data": { "children": [
                { "kind": "t3", "data": { "id": "abc", "title": "Where to buy?" } }
            ] } },
            { "data": { "children": [
                { "kind": "t1", "data": { "id": "c1", "body": "try your LCS", "parent_id": "t3_abc" } },
                { "kind": "more", "data": { "count": 3 } }
            ] } }
        ])))
        .mount(&server)
        .await;

    let comments = client(&server.uri())
        .thread_comments("/r/Gold/comments/abc/where_to_buy/", 50)
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].fullname(), "t1_c1");
    assert!(comments[0].is_top_level());
}

#[tokio::test]
async fn thread_with_one_listing_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/Gold/comments/abc/x.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "data": { "children": [] } }
        ])))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .thread_comments("/r/Gold/comments/abc/x/", 50)
        .await
        .unwrap_err();
    assert!(matches!(err, RedditError::Parse(_)), "got {err:?}");
}
