mod common;

use axum::{
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use common::*;
use uuid::Uuid;

use recruit_auth::{
    middleware::{
        auth_middleware, permission_guard, role_guard, team_guard, PermissionRequirement,
        RoleRequirement,
    },
    store::CredentialStore,
    AppState,
};

async fn probe() -> &'static str {
    "ok"
}

/// A router shaped like the business services compose theirs: the
/// authentication layer outermost, then per-route authorization guards.
fn gated_router(state: AppState) -> Router {
    let candidates = Router::new()
        .route("/candidates", get(probe))
        .route_layer(from_fn_with_state(
            (
                state.clone(),
                PermissionRequirement::any_of(["read:candidates"]),
            ),
            permission_guard,
        ));

    let reports = Router::new()
        .route("/reports", get(probe))
        .route_layer(from_fn_with_state(
            (state.clone(), RoleRequirement::any_of(["Manager"])),
            role_guard,
        ));

    let team_scoped = Router::new()
        .route("/teams/:team_id/board", get(probe))
        .route("/projects", get(probe))
        .route_layer(from_fn_with_state(state.clone(), team_guard));

    Router::new()
        .merge(candidates)
        .merge(reports)
        .merge(team_scoped)
        .layer(from_fn_with_state(state, auth_middleware))
}

async fn access_token_for(app: &TestApp, user_id: Uuid) -> String {
    let user = app
        .store
        .find_user_by_id(user_id)
        .await
        .expect("store")
        .expect("seeded user");
    app.state
        .jwt
        .generate_access_token(&user)
        .expect("access token")
}

#[tokio::test]
async fn unauthenticated_requests_never_reach_authorization() {
    let (app, _seeded) = spawn_app().await;
    let router = gated_router(app.state.clone());

    let response = get_plain(&router, "/candidates").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_with_bearer(&router, "/candidates", "garbage").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn permission_gate_admits_holders_and_admins() {
    let (app, seeded) = spawn_app().await;
    let router = gated_router(app.state.clone());

    let recruiter = access_token_for(&app, seeded.recruiter).await;
    let ceo = access_token_for(&app, seeded.ceo).await;
    let viewer = access_token_for(&app, seeded.viewer).await;

    assert_eq!(
        get_with_bearer(&router, "/candidates", &recruiter).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        get_with_bearer(&router, "/candidates", &ceo).await.status(),
        StatusCode::OK
    );

    let denied = get_with_bearer(&router, "/candidates", &viewer).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    let body = body_json(denied).await;
    let message = body["error"].as_str().expect("error message");
    assert!(message.contains("read:candidates"));
}

#[tokio::test]
async fn role_gate_names_the_missing_roles() {
    let (app, seeded) = spawn_app().await;
    let router = gated_router(app.state.clone());

    let manager = access_token_for(&app, seeded.manager).await;
    let recruiter = access_token_for(&app, seeded.recruiter).await;
    let ceo = access_token_for(&app, seeded.ceo).await;

    assert_eq!(
        get_with_bearer(&router, "/reports", &manager).await.status(),
        StatusCode::OK
    );
    // CEO passes via the top-level shortcut despite not holding "Manager".
    assert_eq!(
        get_with_bearer(&router, "/reports", &ceo).await.status(),
        StatusCode::OK
    );

    let denied = get_with_bearer(&router, "/reports", &recruiter).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    let body = body_json(denied).await;
    assert!(body["error"].as_str().expect("error message").contains("Manager"));
}

#[tokio::test]
async fn team_gate_checks_membership_from_the_path() {
    let (app, seeded) = spawn_app().await;
    let router = gated_router(app.state.clone());

    let recruiter = access_token_for(&app, seeded.recruiter).await;
    let manager = access_token_for(&app, seeded.manager).await;
    let ceo = access_token_for(&app, seeded.ceo).await;

    let member_uri = format!("/teams/{}/board", seeded.team_id);
    let outsider_uri = format!("/teams/{}/board", seeded.other_team_id);

    assert_eq!(
        get_with_bearer(&router, &member_uri, &recruiter).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        get_with_bearer(&router, &outsider_uri, &recruiter).await.status(),
        StatusCode::FORBIDDEN
    );

    // Manager-with-read:all and global admin both bypass membership.
    assert_eq!(
        get_with_bearer(&router, &outsider_uri, &manager).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        get_with_bearer(&router, &outsider_uri, &ceo).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn team_gate_checks_membership_from_the_query() {
    let (app, seeded) = spawn_app().await;
    let router = gated_router(app.state.clone());

    let recruiter = access_token_for(&app, seeded.recruiter).await;

    let member_uri = format!("/projects?team_id={}", seeded.team_id);
    let outsider_uri = format!("/projects?team_id={}", seeded.other_team_id);

    assert_eq!(
        get_with_bearer(&router, &member_uri, &recruiter).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        get_with_bearer(&router, &outsider_uri, &recruiter).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn requests_without_a_team_reference_pass_the_team_gate() {
    let (app, seeded) = spawn_app().await;
    let router = gated_router(app.state.clone());

    let viewer = access_token_for(&app, seeded.viewer).await;
    assert_eq!(
        get_with_bearer(&router, "/projects", &viewer).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn malformed_team_ids_are_rejected_up_front() {
    let (app, seeded) = spawn_app().await;
    let router = gated_router(app.state.clone());

    let recruiter = access_token_for(&app, seeded.recruiter).await;
    let response = get_with_bearer(&router, "/teams/not-a-uuid/board", &recruiter).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn end_to_end_login_then_gated_call() {
    let (app, _seeded) = spawn_app().await;
    let router = gated_router(app.state.clone());

    let (status, body, _) = login(&app.router, "recruiter@agency.example", TEST_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);

    let access_token = body["access_token"].as_str().expect("access token");
    assert_eq!(
        get_with_bearer(&router, "/candidates", access_token).await.status(),
        StatusCode::OK
    );
}
