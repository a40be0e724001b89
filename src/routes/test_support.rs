use std::sync::Arc;

use clap::Parser;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use serde_json::Value;

use crate::app::build_rocket;
use crate::config::app_config::AppConfig;
use crate::repository::memory_store::MemoryStore;

pub const TEST_SECRET: &str = "test-secret";

/// Rocket over a fresh memory store, signing with [`TEST_SECRET`]. `extra`
/// is appended to the command line.
pub async fn client(extra: &[&str]) -> Client {
    let mut argv = vec!["--token-secret", TEST_SECRET];
    argv.extend_from_slice(extra);
    launch(&argv).await
}

pub async fn client_without_secret() -> Client {
    launch(&[]).await
}

async fn launch(args: &[&str]) -> Client {
    let mut argv = vec!["jobnest", "--store", "memory"];
    argv.extend_from_slice(args);
    let config = AppConfig::parse_from(argv);
    let store = Arc::new(MemoryStore::new());
    let rocket = build_rocket(&config, store.clone(), store);
    Client::tracked(rocket).await.expect("valid rocket instance")
}

pub async fn post_json(client: &Client, uri: &str, body: Value) -> (Status, Value) {
    let response = client
        .post(uri)
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    let status = response.status();
    (status, response.into_json().await.unwrap_or(Value::Null))
}

pub async fn get_json(client: &Client, uri: &str) -> Value {
    let response = client.get(uri).dispatch().await;
    assert_eq!(response.status(), Status::Ok, "GET {}", uri);
    response.into_json().await.expect("json body")
}

/// The `insertedId` of an insert result, which is a plain hex string.
pub fn inserted_id(result: &Value) -> String {
    result["insertedId"].as_str().expect("hex inserted id").to_string()
}
