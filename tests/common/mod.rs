//! Shared fixtures for the integration tests: an app wired to the
//! in-memory store with a handful of seeded accounts.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use tower::util::ServiceExt;
use uuid::Uuid;

use recruit_auth::{
    build_router,
    config::{
        AuthConfig, DatabaseConfig, Environment, JwtConfig, RateLimitConfig, RbacConfig,
        SecurityConfig,
    },
    middleware::create_ip_rate_limiter,
    services::{JwtService, RbacCache, RbacService, Sha256Hasher, TokenService},
    store::InMemoryStore,
    utils::{hash_password, Password},
    AppState,
};

pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        environment: Environment::Dev,
        service_name: "recruit-auth-test".to_string(),
        log_level: "debug".to_string(),
        port: 8080,
        database: DatabaseConfig {
            url: "postgres://unused-in-tests".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 1,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-integration-test-secret".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        },
        rbac: RbacConfig {
            cache_ttl_seconds: 60,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        rate_limit: RateLimitConfig {
            login_attempts: 100,
            login_window_seconds: 60,
        },
    }
}

pub struct SeededUsers {
    pub ceo: Uuid,
    pub manager: Uuid,
    pub recruiter: Uuid,
    pub viewer: Uuid,
    pub team_id: Uuid,
    pub other_team_id: Uuid,
}

pub fn seed_users(store: &InMemoryStore) -> SeededUsers {
    let hash = hash_password(&Password::new(TEST_PASSWORD.to_string()))
        .expect("password hash")
        .into_string();

    let ceo = store.add_user("ceo@agency.example", hash.clone(), Some("Cleo"));
    store.grant_role(ceo, "CEO", &["manage:all"]);

    let manager = store.add_user("manager@agency.example", hash.clone(), Some("Morgan"));
    store.grant_role(manager, "Manager", &["read:all", "read:candidates"]);

    let recruiter = store.add_user("recruiter@agency.example", hash.clone(), Some("Riley"));
    store.grant_role(recruiter, "Recruiter", &["read:candidates"]);

    let viewer = store.add_user("viewer@agency.example", hash, Some("Vic"));
    store.grant_role(viewer, "Viewer", &[]);

    let team_id = Uuid::new_v4();
    let other_team_id = Uuid::new_v4();
    store.add_team_member(recruiter, team_id);

    SeededUsers {
        ceo,
        manager,
        recruiter,
        viewer,
        team_id,
        other_team_id,
    }
}

pub fn app_state(config: AuthConfig, store: Arc<InMemoryStore>) -> AppState {
    let jwt = JwtService::new(&config.jwt);
    let tokens = TokenService::new(
        store.clone(),
        store.clone(),
        jwt.clone(),
        Arc::new(Sha256Hasher),
        config.jwt.refresh_token_expiry_days,
    );
    let rbac = RbacService::new(
        store.clone(),
        Arc::new(RbacCache::new(Duration::from_secs(
            config.rbac.cache_ttl_seconds,
        ))),
    );
    let login_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.login_attempts,
        config.rate_limit.login_window_seconds,
    );

    AppState {
        config,
        credentials: store,
        jwt,
        tokens,
        rbac,
        login_rate_limiter,
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub router: Router,
}

pub async fn spawn_app() -> (TestApp, SeededUsers) {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: AuthConfig) -> (TestApp, SeededUsers) {
    let store = Arc::new(InMemoryStore::new());
    let seeded = seed_users(&store);
    let state = app_state(config, store.clone());
    let router = build_router(state.clone()).await.expect("router");
    (
        TestApp {
            state,
            store,
            router,
        },
        seeded,
    )
}

pub async fn post_json(router: &Router, uri: &str, body: serde_json::Value) -> Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response")
}

pub async fn post_with_cookie(router: &Router, uri: &str, cookie: &str) -> Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::COOKIE, format!("refresh_token={cookie}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response")
}

pub async fn post_with_bearer(router: &Router, uri: &str, token: &str) -> Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response")
}

pub async fn get_with_bearer(router: &Router, uri: &str, token: &str) -> Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response")
}

pub async fn get_plain(router: &Router, uri: &str) -> Response {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response")
}

/// Value of the `refresh_token` cookie set on the response, if any.
pub fn refresh_cookie_value(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.split(';').next())
        .and_then(|pair| pair.strip_prefix("refresh_token="))
        .map(str::to_string)
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Login helper: returns (status, body, refresh cookie value).
pub async fn login(
    router: &Router,
    identifier: &str,
    password: &str,
) -> (StatusCode, serde_json::Value, Option<String>) {
    let response = post_json(
        router,
        "/auth/login",
        serde_json::json!({ "identifier": identifier, "password": password }),
    )
    .await;
    let status = response.status();
    let cookie = refresh_cookie_value(&response);
    let body = body_json(response).await;
    (status, body, cookie)
}
