use records_api::{
    AppConfig, AppState, InMemoryRepository, NoopSink, create_router, models::Record,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

async fn spawn_app() -> TestApp {
    let state = AppState::new(
        AppConfig::default(),
        Arc::new(InMemoryRepository::seeded()),
        Arc::new(NoopSink),
    );
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

async fn login(client: &reqwest::Client, app: &TestApp) -> String {
    let response = client
        .post(format!("{}/login", app.address))
        .json(&json!({"email": "test@example.com", "password": "1234"}))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = reqwest::get(format!("{}/health", app.address))
        .await
        .expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_record_lifecycle() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login(&client, &app).await;
    assert!(!token.is_empty());

    // Create
    let response = client
        .post(format!("{}/records", app.address))
        .bearer_auth(&token)
        .json(&json!({"title": "Dune", "author": "Frank Herbert"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let created: Record = response.json().await.unwrap();
    assert_eq!(created.id, 3);

    // Missing and malformed ids
    let missing = client
        .get(format!("{}/records/99", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    let malformed = client
        .get(format!("{}/records/abc", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), 400);

    // Delete, then the neighbours are untouched
    let deleted = client
        .delete(format!("{}/records/1", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);

    let gone = client
        .get(format!("{}/records/1", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);

    let list: Vec<Record> = client
        .get(format!("{}/records", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<u64> = list.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = login(&client, &app).await;

    let mut handles = Vec::new();
    for n in 0..20 {
        let client = client.clone();
        let url = format!("{}/records", app.address);
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            let record: Record = client
                .post(url)
                .bearer_auth(token)
                .json(&json!({"title": format!("t{n}"), "author": "a"}))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            record.id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;
    let doc: Value = reqwest::get(format!("{}/api-docs/openapi.json", app.address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(doc["paths"]["/records/{id}"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}
