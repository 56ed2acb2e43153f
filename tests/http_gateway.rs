//! End-to-end tests for the HTTP transport and refresh flow.
//!
//! Runs the real `reqwest` client (cookie jar included) against a local mock
//! server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};
use workmanager::net::HttpTransport;
use workmanager::net::types::TaskStatus;
use workmanager::{App, ClientConfig};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(&format!("{}/api", server.uri())).expect("mock server uri should be valid")
}

fn has_cookie(req: &Request, value: &str) -> bool {
    req.headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(value))
}

fn user_body() -> serde_json::Value {
    json!({ "id": 1, "name": "Ada", "email": "a@x.com", "role": "employer", "employer_id": null })
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "access_token_cookie=first; Path=/; HttpOnly")
                .set_body_json(json!({ "message": "Login successful", "user": user_body() })),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_then_refresh_replays_with_rotated_cookie() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "access_token_cookie=second; Path=/; HttpOnly")
                .set_body_json(json!({ "message": "Token refreshed" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let task_calls = Arc::new(AtomicUsize::new(0));
    let task_calls_clone = Arc::clone(&task_calls);
    Mock::given(method("GET"))
        .and(path("/api/tasks/"))
        .respond_with(move |req: &Request| {
            task_calls_clone.fetch_add(1, Ordering::SeqCst);
            if has_cookie(req, "access_token_cookie=second") {
                ResponseTemplate::new(200).set_body_json(json!([{
                    "id": 5,
                    "title": "Quarterly report",
                    "description": "",
                    "status": "in_progress",
                    "assigned_to": 1,
                    "created_by": 1,
                    "assigned_to_name": "Ada",
                    "created_by_name": "Ada"
                }]))
            } else {
                ResponseTemplate::new(401).set_body_json(json!({ "error": "Token has expired" }))
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    let app = App::connect(&config(&server)).unwrap();
    app.session.login("a@x.com", "pw").await.unwrap();
    assert_eq!(app.session.current_user().unwrap().email, "a@x.com");
    assert!(app.gateway().has_session_cookie());

    app.tasks.fetch().await.unwrap();

    let tasks = app.tasks.items();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::InProgress);
    assert_eq!(task_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn refresh_rejection_signs_out() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token has been revoked" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token has expired" })))
        .expect(1)
        .mount(&server)
        .await;

    let app = App::connect(&config(&server)).unwrap();
    app.session.login("a@x.com", "pw").await.unwrap();

    let err = app.users.fetch().await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.server_message(), Some("Token has been revoked"));
    assert!(app.session.current_user().is_none());
}

#[tokio::test]
async fn bootstrap_uses_stored_cookie() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(|req: &Request| {
            if has_cookie(req, "access_token_cookie=resumed") {
                ResponseTemplate::new(200).set_body_json(user_body())
            } else {
                ResponseTemplate::new(401).set_body_json(json!({ "error": "Missing cookie" }))
            }
        })
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server)).unwrap();
    transport.add_cookie("access_token_cookie=resumed; Path=/");
    let app = App::with_transport(Arc::new(transport));

    app.session.init().await;

    let state = app.session.snapshot();
    assert!(!state.loading);
    assert_eq!(state.user.map(|u| u.id), Some(1));
}

#[tokio::test]
async fn network_failure_is_reported_as_network_error() {
    // Port 9 (discard) on localhost is expected to refuse connections.
    let app = App::connect(&ClientConfig::new("http://127.0.0.1:9/api").unwrap()).unwrap();

    let err = app.tasks.fetch().await.unwrap_err();

    assert_eq!(err.kind(), workmanager::net::ErrorKind::Network);
    assert_eq!(app.tasks.snapshot().error.as_deref(), Some("Failed to fetch tasks"));
}
