use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use youtube_client::{YouTubeClient, YouTubeError};

const KEY: &str = "SECRET-API-KEY";

fn client(base_url: &str) -> YouTubeClient {
    YouTubeClient::new(KEY.to_string(), Duration::from_secs(2))
        .unwrap()
        .with_base_url(base_url)
}

#[tokio::test]
async fn unreachable_host_error_does_not_carry_the_key() {
    // Nothing listens on port 1.
    let err = client("http://127.0.0.1:1")
        .search_videos("buy gold", 5)
        .await
        .unwrap_err();

    assert!(matches!(err, YouTubeError::Network(_)), "got {err:?}");
    assert!(!err.to_string().contains(KEY), "key leaked: {err}");
    assert!(!format!("{err:?}").contains(KEY));
}

#[tokio::test]
async fn search_sends_key_and_keeps_only_video_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "buy gold"))
        .and(query_param("type", "video"))
        .and(query_param("maxResults", "5"))
        .and(query_param("key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": { "kind": "youtube#video", "videoId": "vid1" } },
                { "id": { "kind": "youtube#channel", "channelId": "chan1" } },
                { "id": { "kind": "youtube#video", "videoId": "vid2" } }
            ]
        })))
        .mount(&server)
        .await;

    let ids = client(&server.uri()).search_videos("buy gold", 5).await.unwrap();
    assert_eq!(ids, vec!["vid1", "vid2"]);
}

#[tokio::test]
async fn comment_threads_flatten_to_top_level_comments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .and(query_param("videoId", "vid1"))
        .and(query_param("textFormat", "plainText"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "thread1",
                "snippet": {
                    "videoId": "vid1",
                    "topLevelComment": {
                        "id": "Ugx1",
                        "snippet": {
                            "authorDisplayName": "@viewer",
                            "textDisplay": "where do I buy gold coins?",
                            "textOriginal": "where do I buy gold coins?"
                        }
                    }
                }
            }]
        })))
        .mount(&server)
        .await;

    let comments = client(&server.uri())
        .top_level_comments("vid1", 100)
        .await
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].id, "Ugx1");
    assert_eq!(comments[0].video_id, "vid1");
    assert_eq!(comments[0].author, "@viewer");
}

#[tokio::test]
async fn quota_response_maps_to_quota_exceeded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota.",
                "errors": [ { "reason": "quotaExceeded", "domain": "youtube.quota" } ]
            }
        })))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .search_videos("buy gold", 5)
        .await
        .unwrap_err();
    assert!(matches!(err, YouTubeError::QuotaExceeded(_)), "got {err:?}");
    assert!(!err.to_string().contains(KEY));
}
