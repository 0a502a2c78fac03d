use std::time::Duration;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, Error, test};
use actix_http::Request;
use serde_json::{Value, json};

use quill_infra::{Argon2PasswordService, JwtConfig, RateLimitConfig};

use super::configure_app;
use crate::background::SchedulerConfig;
use crate::config::AppConfig;
use crate::observability::RequestIdMiddleware;
use crate::state::AppState;
use crate::telemetry::TelemetryConfig;

fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: None,
        redis_url: None,
        jwt: JwtConfig {
            secret: "handler-test-secret".to_string(),
            ..JwtConfig::default()
        },
        rate_limit: RateLimitConfig {
            max_requests: 1000,
            window: Duration::from_secs(60),
        },
        scheduler: SchedulerConfig::default(),
        telemetry: TelemetryConfig::default(),
    }
}

async fn app() -> impl Service<Request, Response = ServiceResponse, Error = Error> {
    let passwords = Argon2PasswordService::with_params(1024, 1, 1).unwrap();
    let state = AppState::in_memory(&test_config(), passwords).unwrap();

    test::init_service(
        App::new()
            .wrap(RequestIdMiddleware)
            .configure(configure_app(state)),
    )
    .await
}

async fn send<S>(app: &S, req: test::TestRequest) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let res = test::call_service(app, req.to_request()).await;
    let status = res.status();
    let bytes = test::read_body(res).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

async fn register<S>(app: &S, name: &str, email: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let (status, body) = send(
        app,
        test::TestRequest::post().uri("/api/register").set_json(json!({
            "name": name,
            "email": email,
            "password": "secret1",
            "confirm_password": "secret1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

#[actix_rt::test]
async fn test_alice_scenario() {
    let app = app().await;

    let t1 = register(&app, "Alice", "a@x.com").await;
    assert!(!t1.is_empty());

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"email": "a@x.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Alice");
    assert!(body["user"].get("password_hash").is_none());
    let t2 = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/blogs")
            .insert_header(bearer(&t2))
            .set_json(json!({"title": "Hi", "content": "World"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Blog post created successfully");
    assert_eq!(body["blog"]["author"], "Alice");
    let blog_id = body["blog"]["id"].as_str().unwrap().to_string();

    let bob = register(&app, "Bob", "b@x.com").await;

    let (status, body) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/blogs/{blog_id}"))
            .insert_header(bearer(&bob)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "You are not authorized to delete this blog post.");

    let (status, _) = send(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/blogs/{blog_id}"))
            .insert_header(bearer(&t2)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_rt::test]
async fn test_register_validation_errors() {
    let app = app().await;

    let (status, body) = send(
        &app,
        test::TestRequest::post().uri("/api/register").set_json(json!({
            "name": "Alice",
            "email": "not-an-email",
            "password": "secret1",
            "confirm_password": "different",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"confirm_password"));
}

#[actix_rt::test]
async fn test_malformed_json_is_bad_request() {
    let app = app().await;

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/login")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{\"email\": "),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[actix_rt::test]
async fn test_wrong_password_is_unauthorized() {
    let app = app().await;
    register(&app, "Alice", "a@x.com").await;

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"email": "a@x.com", "password": "wrong-password"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid credentials");
}

#[actix_rt::test]
async fn test_protected_routes_require_token() {
    let app = app().await;

    for req in [
        test::TestRequest::get().uri("/api/blogs"),
        test::TestRequest::get().uri("/api/my-blogs"),
        test::TestRequest::get().uri("/api/user"),
        test::TestRequest::post().uri("/api/logout"),
        test::TestRequest::post().uri("/api/refresh"),
    ] {
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/blogs")
            .insert_header(bearer("garbage")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_logout_then_token_is_rejected() {
    let app = app().await;
    let token = register(&app, "Alice", "a@x.com").await;

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/logout")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully logged out");
    assert_eq!(body["user"]["email"], "a@x.com");

    let (status, _) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/user")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_refresh_issues_new_token() {
    let app = app().await;
    let token = register(&app, "Alice", "a@x.com").await;

    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/refresh")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = body["token"].as_str().unwrap().to_string();
    assert_ne!(fresh, token);

    let (status, body) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/user")
            .insert_header(bearer(&fresh)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Alice");

    // Refreshing a spent token fails.
    let (status, body) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/refresh")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["title"], "Refresh failed");
}

#[actix_rt::test]
async fn test_listing_messages_and_pagination() {
    let app = app().await;
    let token = register(&app, "Alice", "a@x.com").await;

    let (status, body) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/blogs")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No blogs found.");

    let (_, body) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/my-blogs")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(body["message"], "You have no blogs.");

    for i in 0..11 {
        let (status, _) = send(
            &app,
            test::TestRequest::post()
                .uri("/api/blogs")
                .insert_header(bearer(&token))
                .set_json(json!({"title": format!("Post {i}"), "content": "body"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, first) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/blogs")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(first["blogs"].as_array().unwrap().len(), 10);
    assert_eq!(first["meta"]["total"], 11);
    assert_eq!(first["meta"]["last_page"], 2);

    let (_, second) = send(
        &app,
        test::TestRequest::get()
            .uri("/api/my-blogs?page=2")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(second["blogs"].as_array().unwrap().len(), 1);
    assert_eq!(second["meta"]["current_page"], 2);
}

#[actix_rt::test]
async fn test_partial_update_and_missing_post() {
    let app = app().await;
    let token = register(&app, "Alice", "a@x.com").await;

    let (_, created) = send(
        &app,
        test::TestRequest::post()
            .uri("/api/blogs")
            .insert_header(bearer(&token))
            .set_json(json!({"title": "Hi", "content": "World"})),
    )
    .await;
    let blog_id = created["blog"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/blogs/{blog_id}"))
            .insert_header(bearer(&token))
            .set_json(json!({"content": "Everyone", "owner_id": uuid::Uuid::new_v4()})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Blog post updated successfully");
    assert_eq!(body["blog"]["title"], "Hi");
    assert_eq!(body["blog"]["content"], "Everyone");
    assert_eq!(body["blog"]["owner_id"], created["blog"]["owner_id"]);

    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/blogs/{blog_id}"))
            .insert_header(bearer(&token))
            .set_json(json!({"title": null})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "title");

    let (status, body) = send(
        &app,
        test::TestRequest::put()
            .uri(&format!("/api/blogs/{}", uuid::Uuid::new_v4()))
            .insert_header(bearer(&token))
            .set_json(json!({"title": "Nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["title"], "Blog not found");

    let (status, _) = send(
        &app,
        test::TestRequest::delete()
            .uri("/api/blogs/not-a-uuid")
            .insert_header(bearer(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_unknown_route_is_not_allowed() {
    let app = app().await;

    let (status, body) = send(&app, test::TestRequest::get().uri("/api/nowhere")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "You are not allowed to access this route.");
}

#[actix_rt::test]
async fn test_health_carries_request_id() {
    let app = app().await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request())
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
}
