use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::services::AccessTokenClaims;
use crate::AppState;

/// Any-of role requirement declared on a route.
#[derive(Debug, Clone)]
pub struct RoleRequirement(pub Vec<String>);

impl RoleRequirement {
    pub fn any_of<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }
}

/// Any-of permission requirement declared on a route.
#[derive(Debug, Clone)]
pub struct PermissionRequirement(pub Vec<String>);

impl PermissionRequirement {
    pub fn any_of<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(permissions.into_iter().map(Into::into).collect())
    }
}

/// Role stage of the request chain. Requires the authentication stage to
/// have run; a missing identity fails closed as unauthenticated.
///
/// The rejection names the acceptable roles - the caller already knows
/// which endpoint they hit, so this aids diagnostics without leaking.
pub async fn role_guard(
    State((state, requirement)): State<(AppState, RoleRequirement)>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticated_claims(&req)?;

    if state.rbac.has_role(claims.sub, &requirement.0).await? {
        return Ok(next.run(req).await);
    }

    tracing::warn!(
        user_id = %claims.sub,
        required_roles = ?requirement.0,
        "Role check failed"
    );
    Err(AppError::Forbidden(format!(
        "Requires one of roles: {}",
        requirement.0.join(", ")
    )))
}

/// Permission stage of the request chain; same contract as [`role_guard`].
pub async fn permission_guard(
    State((state, requirement)): State<(AppState, PermissionRequirement)>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticated_claims(&req)?;

    if state.rbac.has_permission(claims.sub, &requirement.0).await? {
        return Ok(next.run(req).await);
    }

    tracing::warn!(
        user_id = %claims.sub,
        required_permissions = ?requirement.0,
        "Permission check failed"
    );
    Err(AppError::Forbidden(format!(
        "Requires one of permissions: {}",
        requirement.0.join(", ")
    )))
}

fn authenticated_claims(req: &Request) -> Result<AccessTokenClaims, AppError> {
    req.extensions()
        .get::<AccessTokenClaims>()
        .cloned()
        .ok_or_else(|| AppError::Unauthenticated("Missing authenticated identity".to_string()))
}
