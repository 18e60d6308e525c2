//! Tests for the GraphQL data client against a local HTTP stub.

use std::sync::Arc;
use std::sync::Mutex;

use cms_lib::DataAuth;
use cms_lib::DataClient;
use cms_lib::api::ModelApi;
use cms_lib::error::ApiError;
use cms_lib::error::Error;
use cms_lib::model::EntityKind;
use cms_lib::model::Record;
use cms_lib::model::Value;
use serde_json::json;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;

/// One request as seen by the stub.
#[derive(Debug, Clone)]
struct Captured {
    headers: Vec<(String, String)>,
    body: serde_json::Value,
}

impl Captured {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Serves the given `(status, body)` responses in order, one per connection.
async fn stub(responses: Vec<(u16, serde_json::Value)>) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/graphql", listener.local_addr().unwrap());
    let captured = Arc::new(Mutex::new(Vec::new()));

    let sink = captured.clone();
    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            sink.lock().unwrap().push(request);

            let payload = body.to_string();
            let response = format!(
                "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                payload.len(),
                payload
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
    });

    (url, captured)
}

async fn read_request(socket: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let headers: Vec<(String, String)> = head
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let length: usize = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before body");
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = serde_json::from_slice(&buf[header_end..header_end + length]).unwrap();
    Captured { headers, body }
}

fn client(url: &str) -> DataClient {
    DataClient::builder()
        .url(url)
        .auth(DataAuth::ApiKey("da2-test".into()))
        .list_limit(2)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_list_follows_next_token() {
    let (url, captured) = stub(vec![
        (
            200,
            json!({ "data": { "listTags": {
                "items": [
                    { "__typename": "Tag", "id": "t1", "name": "Rock", "slug": "rock", "color": "#FF6B6B",
                      "createdAt": "2024-01-01T00:00:00.000Z", "updatedAt": "2024-01-01T00:00:00.000Z" },
                    null
                ],
                "nextToken": "page-2"
            } } }),
        ),
        (
            200,
            json!({ "data": { "listTags": {
                "items": [{ "id": "t2", "name": "Jazz", "slug": "jazz", "color": null }],
                "nextToken": null
            } } }),
        ),
    ])
    .await;

    let records = client(&url).model(EntityKind::Tag).list().await.unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id().unwrap()).collect();
    assert_eq!(ids, vec!["t1", "t2"]);
    assert!(matches!(records[0].value("createdAt"), Value::DateTime(_)));
    assert!(!records[0].contains("__typename"));

    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header("x-api-key"), Some("da2-test"));
    assert_eq!(requests[0].body["variables"]["limit"], 2);
    assert_eq!(requests[0].body["variables"]["nextToken"], serde_json::Value::Null);
    assert_eq!(requests[1].body["variables"]["nextToken"], "page-2");
    assert!(requests[0].body["query"].as_str().unwrap().contains("listTags("));
}

#[tokio::test]
async fn test_graphql_errors_fail_the_call() {
    let (url, _) = stub(vec![(
        200,
        json!({
            "data": { "listTags": null },
            "errors": [{ "message": "Not Authorized to access listTags", "errorType": "Unauthorized", "path": null }]
        }),
    )])
    .await;

    let err = client(&url).model(EntityKind::Tag).list().await.unwrap_err();
    match err {
        Error::Api(api) => {
            assert!(api.is_unauthorized());
            assert_eq!(api.graphql_details().len(), 1);
            assert!(api.to_string().contains("Not Authorized"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_http_status_is_an_error() {
    let (url, _) = stub(vec![(401, json!({ "message": "Unauthorized" }))]).await;

    let err = client(&url).model(EntityKind::Tag).list().await.unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::Http { status: 401, .. })));
}

#[tokio::test]
async fn test_malformed_record_stays_listed() {
    let (url, _) = stub(vec![(
        200,
        json!({ "data": { "listUsers": {
            "items": [
                { "id": "u1", "email": "a@b.c", "role": "ROOT", "isActive": "yes" },
                { "id": "u2", "email": "d@e.f", "role": "ADMIN", "isActive": true }
            ],
            "nextToken": null
        } } }),
    )])
    .await;

    let records = client(&url).model(EntityKind::User).list().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id(), Some("u1"));
    assert_eq!(records[0].get_string("email").unwrap(), Some("a@b.c"));
    assert!(records[0].value("role").is_null());
    assert!(records[0].value("isActive").is_null());
    assert_eq!(records[1].get_bool("isActive").unwrap(), Some(true));
}

#[tokio::test]
async fn test_repeated_next_token_stops_paging() {
    let page = json!({ "data": { "listTags": {
        "items": [{ "id": "t1", "name": "Rock", "slug": "rock" }],
        "nextToken": "stuck"
    } } });
    let (url, captured) = stub(vec![(200, page.clone()), (200, page)]).await;

    let records = client(&url).model(EntityKind::Tag).list().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(captured.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_update_sends_id_in_input() {
    let (url, captured) = stub(vec![(
        200,
        json!({ "data": { "updateUser": {
            "id": "abc123", "email": "ann@example.com", "isActive": false,
            "updatedAt": "2024-05-01T10:00:00.000Z"
        } } }),
    )])
    .await;

    let saved = client(&url)
        .model(EntityKind::User)
        .update(Record::with_id("abc123").set("isActive", false))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(saved.get_bool("isActive").unwrap(), Some(false));
    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests[0].body["variables"]["input"], json!({ "id": "abc123", "isActive": false }));
    assert!(requests[0].body["query"].as_str().unwrap().contains("updateUser(input: $input)"));
}

#[tokio::test]
async fn test_delete_sends_only_id() {
    let (url, captured) = stub(vec![(200, json!({ "data": { "deleteTag": { "id": "t1" } } }))]).await;

    client(&url).model(EntityKind::Tag).delete("t1").await.unwrap();

    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests[0].body["variables"]["input"], json!({ "id": "t1" }));
}

#[tokio::test]
async fn test_token_auth_header() {
    let (url, captured) = stub(vec![(200, json!({ "data": { "listTodos": { "items": [], "nextToken": null } } }))]).await;

    let client = DataClient::builder()
        .url(&url)
        .auth(DataAuth::Token("eyJ-token".into()))
        .build()
        .unwrap();
    assert!(client.model(EntityKind::Todo).list().await.unwrap().is_empty());

    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests[0].header("authorization"), Some("eyJ-token"));
    assert_eq!(requests[0].header("x-api-key"), None);
}
