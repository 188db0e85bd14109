use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    dtos::auth::{AuthResponse, LoginRequest, MeResponse, MessageResponse},
    error::AppError,
    middleware::AuthUser,
    utils::{verify_password, Password, PasswordHashString, ValidatedJson},
    AppState,
};

/// Cookie carrying the refresh secret, restricted to the auth routes so
/// it only travels with refresh and logout requests.
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const REFRESH_COOKIE_PATH: &str = "/auth";

fn refresh_cookie(state: &AppState, secret: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, secret))
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .secure(state.config.environment.is_prod())
        .same_site(SameSite::Strict)
        .max_age(time::Duration::days(
            state.config.jwt.refresh_token_expiry_days,
        ))
        .build()
}

fn removal_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, ""))
        .path(REFRESH_COOKIE_PATH)
        .build()
}

/// Login with identifier and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .credentials
        .find_user_by_identifier(&req.identifier)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let password = Password::new(req.password);
    let stored = PasswordHashString::new(user.password_hash.clone());
    let verified = verify_password(&password, &stored).unwrap_or_else(|e| {
        tracing::error!(user_id = %user.user_id, error = %e, "Stored password hash unreadable");
        false
    });
    if !verified {
        return Err(AppError::InvalidCredentials);
    }

    let tokens = state.tokens.issue(&user).await?;

    tracing::info!(user_id = %user.user_id, "User logged in");

    let jar = jar.add(refresh_cookie(&state, tokens.refresh_secret.clone()));
    Ok((
        StatusCode::OK,
        jar,
        Json(AuthResponse::new(tokens, user.summary())),
    ))
}

/// Rotate the refresh token carried by the auth cookie
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Token refreshed", body = AuthResponse),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(AppError::InvalidToken)?;

    let (user, tokens) = state.tokens.rotate(&presented).await?;

    let jar = jar.add(refresh_cookie(&state, tokens.refresh_secret.clone()));
    Ok((
        StatusCode::OK,
        jar,
        Json(AuthResponse::new(tokens, user.summary())),
    ))
}

/// Logout everywhere: revoke all of the caller's refresh tokens
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    state.tokens.revoke_all_for_user(user.0.sub).await?;

    tracing::info!(user_id = %user.0.sub, "User logged out");

    let jar = jar.remove(removal_cookie());
    Ok((
        StatusCode::OK,
        jar,
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// The caller's resolved identity, roles and permissions
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Resolved identity", body = MeResponse),
        (status = 401, description = "Unauthenticated", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let grants = state.rbac.resolve(user.0.sub).await?;

    let mut roles: Vec<String> = grants.roles.into_iter().collect();
    let mut permissions: Vec<String> = grants.permissions.into_iter().collect();
    roles.sort();
    permissions.sort();

    Ok(Json(MeResponse {
        id: user.0.sub,
        identifier: user.0.identifier,
        roles,
        permissions,
    }))
}
