//! Cursor traversal against a mock Bankin server.

use bankin::{BankinError, Client, ListOptions};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{any, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer) -> Client {
    Client::new("client-id", "client-secret")
        .expect("client should build")
        .with_base_url(&format!("{}/v2", server.uri()))
        .expect("mock url should parse")
}

#[tokio::test]
async fn walks_forward_and_back() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/banks"))
        .and(query_param_is_missing("after"))
        .and(query_param_is_missing("before"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
            "pagination": {"next_uri": "/v2/banks?after=X&limit=2", "previous_uri": null}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/banks"))
        .and(query_param("after", "X"))
        .and(query_param("limit", "2"))
        .and(query_param("client_id", "client-id"))
        .and(query_param("client_secret", "client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{"id": 3, "name": "C"}],
            "pagination": {"next_uri": null, "previous_uri": "/v2/banks?before=Y&limit=2"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/banks"))
        .and(query_param("before", "Y"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{"id": 1, "name": "A"}, {"id": 2, "name": "B"}],
            "pagination": {"next_uri": "/v2/banks?after=X&limit=2"}
        })))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let first = client.banks().list(&ListOptions::new().limit(2)).await.unwrap();
    assert_eq!(first.resources().len(), 2);
    assert!(first.has_next());
    assert!(!first.has_previous());

    let second = first.next().await.unwrap();
    assert_eq!(second.resources(), &[json!({"id": 3, "name": "C"})]);
    assert!(!second.has_next());
    assert!(matches!(second.next().await, Err(BankinError::NoNextPage)));

    let back = second.previous().await.unwrap();
    assert_eq!(back.resources(), first.resources());
    assert_eq!(first.resources().len(), 2);
}

#[tokio::test]
async fn repeated_next_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/items"))
        .and(query_param("after", "X"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{"id": 7}, {"id": 8}],
            "pagination": {}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let page = bankin::Page::new(
        client(&server).await.transport().clone(),
        json!({"resources": [], "pagination": {"next_uri": "/v2/items?after=X&limit=10"}}),
        None,
    )
    .unwrap();

    let a = page.next().await.unwrap();
    let b = page.next().await.unwrap();
    assert_eq!(a.resources(), b.resources());
    assert!(page.resources().is_empty());
}

#[tokio::test]
async fn bearer_token_follows_the_cursor() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/transactions/updated"))
        .and(query_param("since", "100"))
        .and(header("Authorization", "Bearer tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [{"id": 1, "amount": -10.5, "date": "2016-04-10"}],
            "pagination": {"next_uri": null}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = bankin::Page::new(
        client(&server).await.transport().clone(),
        json!({
            "resources": [],
            "pagination": {"next_uri": "/v2/transactions/updated?since=100"}
        }),
        Some("tok123".to_string()),
    )
    .unwrap();

    let next = page.next().await.unwrap();
    assert_eq!(next.bearer_token(), Some("tok123"));
    let txns: Vec<bankin::Transaction> = next.resources_as().unwrap();
    assert_eq!(txns[0].id, 1);
}

#[tokio::test]
async fn missing_cursor_never_hits_the_network() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let page = bankin::Page::new(
        client(&server).await.transport().clone(),
        json!({"resources": [], "pagination": {}}),
        None,
    )
    .unwrap();

    assert!(matches!(page.next().await, Err(BankinError::NoNextPage)));
    assert!(matches!(page.previous().await, Err(BankinError::NoPreviousPage)));
}

#[tokio::test]
async fn malformed_cursor_is_reported_not_sent() {
    let server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let page = bankin::Page::new(
        client(&server).await.transport().clone(),
        json!({"resources": [], "pagination": {"next_uri": "/v2/items"}}),
        None,
    )
    .unwrap();

    let err = page.next().await.unwrap_err();
    assert!(matches!(err, BankinError::InvalidCursor { ref uri, .. } if uri == "/v2/items"));
}

#[tokio::test]
async fn next_page_errors_propagate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/users"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let page = bankin::Page::new(
        client(&server).await.transport().clone(),
        json!({"resources": [], "pagination": {"next_uri": "/v2/users?after=Z"}}),
        None,
    )
    .unwrap();

    let err = page.next().await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
}
