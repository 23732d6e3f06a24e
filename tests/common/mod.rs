#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use actix_http::Request;
use actix_web::{
    App,
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test::{self, TestRequest},
};
use serde_json::{Value, json};

use plexpay::{
    config::Config,
    routes,
    seed::seed_demo_data,
    storage::{MemStorage, Storage},
    utils::username_cache::UsernameCache,
};

pub const PASSWORD: &str = "password123";

/// The governor keys on the peer IP, so every request needs one.
pub fn peer() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40_000))
}

pub async fn demo_storage() -> Arc<dyn Storage> {
    let storage = Arc::new(MemStorage::default());
    seed_demo_data(storage.as_ref(), PASSWORD).await.unwrap();
    storage
}

pub async fn init_app(
    storage: Arc<dyn Storage>,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(App::new().configure(move |cfg| {
        routes::configure(cfg, Config::in_memory(), storage, UsernameCache::default())
    }))
    .await
}

pub fn get(uri: &str, token: &str) -> Request {
    TestRequest::get()
        .uri(uri)
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request()
}

pub fn delete(uri: &str, token: &str) -> Request {
    TestRequest::delete()
        .uri(uri)
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request()
}

pub fn post(uri: &str, token: &str, body: Value) -> Request {
    TestRequest::post()
        .uri(uri)
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(body)
        .to_request()
}

pub fn put(uri: &str, token: &str, body: Value) -> Request {
    TestRequest::put()
        .uri(uri)
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(body)
        .to_request()
}

pub fn login_request(username: &str, password: &str) -> Request {
    TestRequest::post()
        .uri("/api/auth/login")
        .peer_addr(peer())
        .set_json(json!({ "username": username, "password": password }))
        .to_request()
}

/// Logs in and returns the full response body.
pub async fn login<S, B>(app: &S, username: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, login_request(username, PASSWORD)).await;
    assert_eq!(resp.status(), StatusCode::OK, "login as {username}");
    test::read_body_json(resp).await
}

pub async fn access_token<S, B>(app: &S, username: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    login(app, username).await["accessToken"]
        .as_str()
        .unwrap()
        .to_string()
}
