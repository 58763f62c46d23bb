use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use serde_json::{json, Value};

use sewa_api::app::{build_app, services::AppServices};
use sewa_auth::{Claims, Role, TokenKind};
use sewa_core::FixedClock;
use sewa_notify::{EmailTemplate, RecordingNotifier, SentEmail};
use sewa_store::MemoryUserStore;

const JWT_SECRET: &str = "test-secret";
const ORIGIN: &str = "http://app.test";

struct TestServer {
    base_url: String,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<FixedClock>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod, bound to an ephemeral port, with the in-memory
    /// store, a recording notifier, and a controllable clock.
    async fn spawn() -> Self {
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let services = Arc::new(AppServices::new(
            Arc::new(MemoryUserStore::new()),
            notifier.clone(),
            clock.clone(),
            JWT_SECRET,
            ORIGIN,
        ));

        let app = build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            notifier,
            clock,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn cookie_value(res: &reqwest::Response, name: &str) -> Option<String> {
    res.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .find_map(|v| {
            let s = v.to_str().ok()?;
            let (key, rest) = s.split_once('=')?;
            if key == name {
                Some(rest.split(';').next().unwrap_or(rest).to_string())
            } else {
                None
            }
        })
}

fn activation_token(sent: &[SentEmail], email: &str) -> String {
    let mail = sent
        .iter()
        .rev()
        .find(|m| m.to == email && m.template == EmailTemplate::AccountActivation)
        .expect("no activation email");
    mail.context
        .url
        .strip_prefix(&format!("{ORIGIN}/auth/"))
        .and_then(|rest| rest.strip_suffix("/activation-user"))
        .expect("unexpected activation url shape")
        .to_string()
}

fn reset_token(sent: &[SentEmail], email: &str) -> String {
    let mail = sent
        .iter()
        .rev()
        .find(|m| m.to == email && m.template == EmailTemplate::ForgetPassword)
        .expect("no reset email");
    mail.context
        .url
        .strip_prefix(&format!("{ORIGIN}/auth/forget-password/"))
        .and_then(|rest| rest.strip_suffix("/new-password"))
        .expect("unexpected reset url shape")
        .to_string()
}

async fn register(
    client: &reqwest::Client,
    srv: &TestServer,
    email: &str,
    phone: &str,
    role: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/auth/register", srv.base_url))
        .json(&json!({
            "name": "Bob",
            "email": email,
            "phone": phone,
            "role": role,
            "password": "hunter2",
        }))
        .send()
        .await
        .unwrap()
}

async fn register_and_activate(client: &reqwest::Client, srv: &TestServer, email: &str, phone: &str, role: &str) {
    let res = register(client, srv, email, phone, role).await;
    assert_eq!(res.status(), StatusCode::OK);

    let token = activation_token(&srv.notifier.sent(), email);
    let res = client
        .post(format!("{}/auth/activation", srv.base_url))
        .json(&json!({ "token": token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

async fn login(client: &reqwest::Client, srv: &TestServer, email: &str) -> reqwest::Response {
    client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": email, "password": "hunter2" }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_route_without_credential_is_unauthorized() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .get(format!("{}/users/me", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_bearer_is_rejected_even_on_public_routes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // The resolver treats a present-but-bad credential as an error, unlike
    // its absence.
    let res = client
        .post(format!("{}/auth/check-auth", srv.base_url))
        .bearer_auth("garbage")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_activate_login_round_trip() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = register(&client, &srv, "bob@x.com", "811", "USER").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["email"], "bob@x.com");
    assert!(body["data"].get("password").is_none());

    // Not active yet: soft failure, no cookies issued.
    let res = login(&client, &srv, "bob@x.com").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(cookie_value(&res, "access-token").is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);

    // Activate twice: second call is a no-op, not an error.
    let token = activation_token(&srv.notifier.sent(), "bob@x.com");
    for _ in 0..2 {
        let res = client
            .post(format!("{}/auth/activation", srv.base_url))
            .json(&json!({ "token": token }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["data"]["active"], true);
    }

    let res = login(&client, &srv, "bob@x.com").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(cookie_value(&res, "access-token").is_some());
    assert!(cookie_value(&res, "refresh-token").is_some());
    let body: Value = res.json().await.unwrap();
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();

    // The minted access token opens a protected route; phone came back
    // normalized with the country prefix.
    let res = client
        .get(format!("{}/users/me", srv.base_url))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["email"], "bob@x.com");
    assert_eq!(body["data"]["phone"], "62811");
}

#[tokio::test]
async fn access_token_stops_working_after_its_ttl() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register_and_activate(&client, &srv, "bob@x.com", "811", "USER").await;

    let res = login(&client, &srv, "bob@x.com").await;
    let body: Value = res.json().await.unwrap();
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();

    srv.clock.advance(ChronoDuration::hours(2));

    let res = client
        .get(format!("{}/users/me", srv.base_url))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn second_login_revokes_the_first_refresh_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register_and_activate(&client, &srv, "bob@x.com", "811", "USER").await;

    let first = login(&client, &srv, "bob@x.com").await;
    let first_refresh = cookie_value(&first, "refresh-token").unwrap();

    srv.clock.advance(ChronoDuration::seconds(1));
    let second = login(&client, &srv, "bob@x.com").await;
    let second_refresh = cookie_value(&second, "refresh-token").unwrap();
    assert_ne!(first_refresh, second_refresh);

    let res = client
        .post(format!("{}/auth/refresh-token", srv.base_url))
        .header("cookie", format!("refresh-token={first_refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/auth/refresh-token", srv.base_url))
        .header("cookie", format!("refresh-token={second_refresh}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let new_access = cookie_value(&res, "access-token").unwrap();

    let res = client
        .get(format!("{}/users/me", srv.base_url))
        .bearer_auth(&new_access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_without_a_cookie_is_unauthorized() {
    let srv = TestServer::spawn().await;
    let res = reqwest::Client::new()
        .post(format!("{}/auth/refresh-token", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_and_phone_conflict() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = register(&client, &srv, "bob@x.com", "811", "USER").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = register(&client, &srv, "bob@x.com", "999", "USER").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "email already in use");

    let res = register(&client, &srv, "alice@x.com", "811", "USER").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "phone already in use");
}

#[tokio::test]
async fn user_listing_is_gated_on_admin_roles() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register_and_activate(&client, &srv, "user@x.com", "811", "USER").await;
    register_and_activate(&client, &srv, "admin@x.com", "822", "ADMIN").await;

    let res = login(&client, &srv, "user@x.com").await;
    let body: Value = res.json().await.unwrap();
    let user_access = body["data"]["accessToken"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{}/users", srv.base_url))
        .bearer_auth(&user_access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = login(&client, &srv, "admin@x.com").await;
    let body: Value = res.json().await.unwrap();
    let admin_access = body["data"]["accessToken"].as_str().unwrap().to_string();

    let res = client
        .get(format!("{}/users", srv.base_url))
        .bearer_auth(&admin_access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let listed = body["data"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|u| u.get("passwordHash").is_none()));
}

#[tokio::test]
async fn check_auth_is_a_soft_probe() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // No header: soft false.
    let res = client
        .post(format!("{}/auth/check-auth", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);

    // Structurally valid token for a user that does not exist: still soft.
    let now = Utc::now();
    let claims = Claims::new("ghost@x.com", Role::User, TokenKind::Access, now);
    let ghost = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let res = client
        .post(format!("{}/auth/check-auth", srv.base_url))
        .bearer_auth(&ghost)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);

    // Real session: success with the identity.
    register_and_activate(&client, &srv, "bob@x.com", "811", "USER").await;
    let res = login(&client, &srv, "bob@x.com").await;
    let body: Value = res.json().await.unwrap();
    let access = body["data"]["accessToken"].as_str().unwrap().to_string();

    let res = client
        .post(format!("{}/auth/check-auth", srv.base_url))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "bob@x.com");
    assert_eq!(body["data"]["role"], "USER");
}

#[tokio::test]
async fn password_reset_flow_end_to_end() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register_and_activate(&client, &srv, "bob@x.com", "811", "USER").await;

    // Unknown email is the one tolerated enumeration leak.
    let res = client
        .post(format!("{}/auth/forget-password", srv.base_url))
        .json(&json!({ "email": "nobody@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/auth/forget-password", srv.base_url))
        .json(&json!({ "email": "bob@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let sent = srv.notifier.sent();
    let resets: Vec<_> = sent
        .iter()
        .filter(|m| m.template == EmailTemplate::ForgetPassword)
        .collect();
    assert_eq!(resets.len(), 1);

    let token = reset_token(&sent, "bob@x.com");
    let res = client
        .post(format!("{}/auth/new-password", srv.base_url))
        .json(&json!({ "token": token, "password": "correct horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);

    // Old password rejected, new one accepted.
    let res = login(&client, &srv, "bob@x.com").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "bob@x.com", "password": "correct horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_reset_link_soft_fails_with_distinct_wording() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    register_and_activate(&client, &srv, "bob@x.com", "811", "USER").await;

    client
        .post(format!("{}/auth/forget-password", srv.base_url))
        .json(&json!({ "email": "bob@x.com" }))
        .send()
        .await
        .unwrap();
    let token = reset_token(&srv.notifier.sent(), "bob@x.com");

    srv.clock.advance(ChronoDuration::hours(2));

    let res = client
        .post(format!("{}/auth/new-password", srv.base_url))
        .json(&json!({ "token": token, "password": "pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "token has expired");

    let res = client
        .post(format!("{}/auth/new-password", srv.base_url))
        .json(&json!({ "token": "garbage", "password": "pw" }))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "token is invalid");
}

#[tokio::test]
async fn activation_resend_keeps_old_links_valid() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    register(&client, &srv, "bob@x.com", "811", "USER").await;
    let first_token = activation_token(&srv.notifier.sent(), "bob@x.com");

    let res = client
        .post(format!("{}/auth/activation-token-request", srv.base_url))
        .json(&json!({ "email": "bob@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(srv.notifier.sent().len(), 2);

    // Activation tokens are stateless: the first link still works.
    let res = client
        .post(format!("{}/auth/activation", srv.base_url))
        .json(&json!({ "token": first_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Unknown address on resend.
    let res = client
        .post(format!("{}/auth/activation-token-request", srv.base_url))
        .json(&json!({ "email": "nobody@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
