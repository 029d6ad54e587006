//! HTTP transport integration tests.
//!
//! Starts an axum server and exercises it with reqwest.

use std::sync::Arc;

use cart_items::http;
use cart_items::store::{Collection, InMemoryCollection};
use cart_items::ItemHandler;
use serde_json::{json, Value};

use crate::support::{FlakyCollection, SECRET_DETAIL};

/// Bind to port 0 and return the base URL.
async fn start_server<C: Collection + 'static>(handler: ItemHandler<C>) -> String {
    let app = http::router_with_pool(Arc::new(handler), 4);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn start_default() -> String {
    start_server(ItemHandler::new(InMemoryCollection::new("items"))).await
}

fn is_json(resp: &reqwest::Response) -> bool {
    resp.headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

#[tokio::test]
async fn item_lifecycle() {
    let base = start_default().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/items"))
        .json(&json!({ "name": "bat", "price": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    assert!(is_json(&resp));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Item created");
    assert_eq!(body["item"]["name"], "bat");
    assert_eq!(body["item"]["price"], 10);
    let id = body["item"]["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 24);
    assert!(id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));

    let resp = client.get(format!("{base}/items/{id}")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let fetched: Value = resp.json().await.unwrap();
    assert_eq!(fetched["item"], body["item"]);

    let resp = client.delete(format!("{base}/items/{id}")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let deleted: Value = resp.json().await.unwrap();
    assert_eq!(deleted, json!({ "message": "Item deleted" }));

    let resp = client.get(format!("{base}/items/{id}")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let missing: Value = resp.json().await.unwrap();
    assert_eq!(missing, json!({ "message": "Item not found" }));

    let resp = client.delete(format!("{base}/items/{id}")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn invalid_id_returns_400() {
    let base = start_default().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/items/not-an-id")).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    assert!(is_json(&resp));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Invalid item id" }));

    let resp = client
        .delete(format!("{base}/items/65F1C0FFEE0123456789ABCD"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn malformed_bodies_return_400() {
    let base = start_default().await;
    let client = reqwest::Client::new();

    for body in ["not json", "", "\"not json\"", "[1,2]", r#"{"price":10}"#] {
        let resp = client
            .post(format!("{base}/items"))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "body {body:?}");
        let reply: Value = resp.json().await.unwrap();
        assert!(reply["message"].is_string());
    }

    let resp = client.get(format!("{base}/items")).send().await.unwrap();
    let listed: Value = resp.json().await.unwrap();
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn create_accepts_body_without_content_type() {
    let base = start_default().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/items"))
        .body(r#"{"name":"ball"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
}

#[tokio::test]
async fn list_with_pagination() {
    let base = start_default().await;
    let client = reqwest::Client::new();

    let mut ids = Vec::new();
    for n in 0..6 {
        let resp = client
            .post(format!("{base}/items"))
            .json(&json!({ "name": format!("item-{n}") }))
            .send()
            .await
            .unwrap();
        let body: Value = resp.json().await.unwrap();
        ids.push(body["item"]["id"].clone());
    }

    let body: Value = client
        .get(format!("{base}/items"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 6);

    let body: Value = client
        .get(format!("{base}/items?limit=2&skip=3"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 2);
    let page: Vec<Value> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].clone())
        .collect();
    assert_eq!(page, ids[3..5].to_vec());

    let resp = client
        .get(format!("{base}/items?limit=abc&skip=-1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["count"], 6);

    let body: Value = client
        .get(format!("{base}/items?limit=%FF&skip=1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 5);
    assert_eq!(body["items"][0]["id"], ids[1]);
}

#[tokio::test]
async fn store_failure_returns_sanitized_500() {
    let items = FlakyCollection::new();
    let base = start_server(ItemHandler::new(items.clone())).await;
    let client = reqwest::Client::new();
    items.set_down(true);

    let resp = client.get(format!("{base}/items")).send().await.unwrap();
    assert_eq!(resp.status(), 500);
    let text = resp.text().await.unwrap();
    assert!(!text.contains(SECRET_DETAIL));
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body, json!({ "message": "Internal server error" }));

    let resp = client
        .post(format!("{base}/items"))
        .json(&json!({ "name": "bat" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
}

#[tokio::test]
async fn health_reflects_store() {
    let items = FlakyCollection::new();
    let base = start_server(ItemHandler::new(items.clone())).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "ok": true, "collection": "items" }));

    items.set_down(true);
    let resp = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "ok": false }));
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let base = start_default().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/carts")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    assert!(is_json(&resp));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Not found" }));
}

#[tokio::test]
async fn unsupported_methods_return_json_405() {
    let base = start_default().await;
    let client = reqwest::Client::new();

    let resp = client.put(format!("{base}/items")).send().await.unwrap();
    assert_eq!(resp.status(), 405);
    assert!(is_json(&resp));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Method not allowed" }));

    let resp = client
        .patch(format!("{base}/items/65f1c0ffee0123456789abcd"))
        .json(&json!({ "name": "bat" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);
    assert!(is_json(&resp));

    let resp = client.post(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), 405);
    assert!(is_json(&resp));
}

#[tokio::test]
async fn undecodable_path_id_returns_json_400() {
    let base = start_default().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{base}/items/%FF")).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    assert!(is_json(&resp));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Invalid item id" }));

    let resp = client.delete(format!("{base}/items/%FF")).send().await.unwrap();
    assert_eq!(resp.status(), 400);
    assert!(is_json(&resp));
}

#[tokio::test]
async fn oversized_body_returns_json_413() {
    let base = start_default().await;
    let client = reqwest::Client::new();

    let padding = "x".repeat(2 * 1024 * 1024 + 1024);
    let resp = client
        .post(format!("{base}/items"))
        .header("content-type", "application/json")
        .body(format!(r#"{{"name":"{padding}"}}"#))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
    assert!(is_json(&resp));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Request body too large" }));

    let listed: Value = client
        .get(format!("{base}/items"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn concurrent_creates_over_http() {
    let base = start_default().await;
    let client = reqwest::Client::new();

    let requests = (0..20).map(|n| {
        let client = client.clone();
        let url = format!("{base}/items");
        tokio::spawn(async move {
            let resp = client
                .post(url)
                .json(&json!({ "name": format!("item-{n}") }))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 201);
            let body: Value = resp.json().await.unwrap();
            body["item"]["id"].as_str().unwrap().to_string()
        })
    });

    let mut ids = std::collections::HashSet::new();
    for request in requests.collect::<Vec<_>>() {
        assert!(ids.insert(request.await.unwrap()));
    }
    assert_eq!(ids.len(), 20);
}
