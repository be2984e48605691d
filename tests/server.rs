mod common;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{rt, web, App, HttpServer};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use common::{test_settings, test_store, PASSWORD};
use devboard::db::Store;
use devboard::routes;

#[actix_rt::test]
async fn test_served_over_http() {
    let store: Arc<dyn Store> = test_store().await;
    let store = web::Data::from(store);
    let settings = web::Data::new(test_settings());

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(store.clone())
            .app_data(settings.clone())
            .configure(routes::config)
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen")
    .run();
    let handle = server.handle();
    rt::spawn(server);

    let exchange = async {
        let client = reqwest::Client::new();
        let base = format!("http://127.0.0.1:{}", port);

        let resp = client
            .post(format!("{}/employer/tasks/", base))
            .json(&json!({ "title": "Unauthorized Task" }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers()
                .get(reqwest::header::WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], 401);

        let resp = client
            .post(format!("{}/employer/register/", base))
            .json(&json!({
                "username": "over_http",
                "email": "over_http@example.com",
                "password": PASSWORD,
                "company_name": "Wire Co"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

        let resp = client
            .post(format!("{}/employer/token", base))
            .form(&[("username", "over_http"), ("password", PASSWORD)])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let token: Value = resp.json().await.unwrap();
        let token = token["access_token"].as_str().unwrap();

        let resp = client
            .post(format!("{}/employer/tasks/", base))
            .bearer_auth(token)
            .json(&json!({ "title": "Authorized Task" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    };
    tokio::time::timeout(Duration::from_secs(30), exchange)
        .await
        .expect("server did not answer in time");

    handle.stop(true).await;
}
