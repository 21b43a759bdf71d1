mod common;

use actix_web::{web, App, HttpServer};
use serde_json::{json, Value};

use common::test_state;
use todoforge::routes;

#[actix_rt::test]
async fn test_live_server_round_trip() {
    let state = web::Data::new(test_state());
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(routes::security_headers())
            .configure(routes::config)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind test server");
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    tokio::spawn(server);

    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .expect("Health request failed");
    assert!(resp.status().is_success());
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert_eq!(resp.headers()["referrer-policy"], "no-referrer");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = client
        .post(format!("http://{}/api/v1/users/register", addr))
        .json(&json!({ "name": "Live User", "email": "live@example.com", "password": "live123" }))
        .send()
        .await
        .expect("Register request failed");
    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = resp.json().await.unwrap();
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let resp = client
        .get(format!("http://{}/api/v1/todos", addr))
        .bearer_auth(&token)
        .send()
        .await
        .expect("List request failed");
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], json!([]));

    handle.stop(true).await;
}
