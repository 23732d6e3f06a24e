mod common;

use actix_web::{
    http::StatusCode,
    test::{self, TestRequest},
};
use serde_json::{Value, json};

use common::*;

#[actix_web::test]
async fn login_returns_user_without_password() {
    let app = init_app(demo_storage().await).await;

    let body = login(&app, "admin").await;

    assert_eq!(body["username"], "admin");
    assert_eq!(body["role"], "admin");
    assert!(body.get("password").is_none());
    assert!(body["accessToken"].is_string());
    assert!(body["refreshToken"].is_string());
}

#[actix_web::test]
async fn wrong_credentials_are_401() {
    let app = init_app(demo_storage().await).await;

    for (username, password) in [("admin", "nope"), ("ghost", PASSWORD)] {
        let resp = test::call_service(&app, login_request(username, password)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Invalid credentials" }));
    }
}

#[actix_web::test]
async fn empty_credentials_are_400() {
    let app = init_app(demo_storage().await).await;

    let resp = test::call_service(&app, login_request("", "")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn protected_routes_need_an_access_token() {
    let app = init_app(demo_storage().await).await;

    let req = TestRequest::get()
        .uri("/api/expenses")
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = test::call_service(&app, get("/api/expenses", "not-a-jwt")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // a refresh token is not an access token
    let refresh = login(&app, "staff").await["refreshToken"].as_str().unwrap().to_string();
    let resp = test::call_service(&app, get("/api/expenses", &refresh)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn me_returns_the_caller() {
    let app = init_app(demo_storage().await).await;
    let token = access_token(&app, "staff").await;

    let resp = test::call_service(&app, get("/api/auth/me", &token)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let me: Value = test::read_body_json(resp).await;
    assert_eq!(me["username"], "staff");
    assert!(me.get("password").is_none());
}

#[actix_web::test]
async fn refresh_tokens_rotate_once() {
    let app = init_app(demo_storage().await).await;
    let refresh = login(&app, "admin").await["refreshToken"].as_str().unwrap().to_string();

    let first = test::call_service(&app, post("/api/auth/refresh", &refresh, json!({}))).await;
    assert_eq!(first.status(), StatusCode::OK);
    let pair: Value = test::read_body_json(first).await;
    assert!(pair["accessToken"].is_string());

    let replay = test::call_service(&app, post("/api/auth/refresh", &refresh, json!({}))).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    // the rotated token still works
    let next = pair["refreshToken"].as_str().unwrap();
    let resp = test::call_service(&app, post("/api/auth/refresh", next, json!({}))).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn logout_revokes_the_refresh_token() {
    let app = init_app(demo_storage().await).await;
    let refresh = login(&app, "admin").await["refreshToken"].as_str().unwrap().to_string();

    let resp = test::call_service(&app, post("/api/auth/logout", &refresh, json!({}))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(&app, post("/api/auth/refresh", &refresh, json!({}))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // idempotent
    let resp = test::call_service(&app, post("/api/auth/logout", &refresh, json!({}))).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn user_management_is_admin_only() {
    let app = init_app(demo_storage().await).await;

    let staff = access_token(&app, "staff").await;
    let resp = test::call_service(&app, get("/api/users", &staff)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let admin = access_token(&app, "admin").await;
    let resp = test::call_service(&app, get("/api/users", &admin)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let users: Vec<Value> = test::read_body_json(resp).await;
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password").is_none()));
}

#[actix_web::test]
async fn created_users_can_log_in_and_names_stay_unique() {
    let app = init_app(demo_storage().await).await;
    let admin = access_token(&app, "admin").await;

    let jane = json!({
        "username": "jane",
        "password": PASSWORD,
        "name": "Jane Bookkeeper",
        "email": "jane@plexpay.com"
    });

    let resp = test::call_service(&app, post("/api/users", &admin, jane.clone())).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["role"], "staff");

    let resp = test::call_service(&app, post("/api/users", &admin, jane)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body = login(&app, "jane").await;
    assert_eq!(body["id"], created["id"]);

    // updating without a password keeps the old one
    let uri = format!("/api/users/{}", created["id"]);
    let update = json!({
        "username": "jane",
        "name": "Jane B.",
        "email": "jane@plexpay.com",
        "role": "admin"
    });
    let resp = test::call_service(&app, put(&uri, &admin, update)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(login(&app, "jane").await["role"], "admin");
}

#[actix_web::test]
async fn admins_cannot_delete_themselves() {
    let app = init_app(demo_storage().await).await;
    let body = login(&app, "admin").await;
    let token = body["accessToken"].as_str().unwrap();

    let resp = test::call_service(&app, delete(&format!("/api/users/{}", body["id"]), token)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
