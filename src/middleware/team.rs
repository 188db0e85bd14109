use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
    RequestExt,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::AccessTokenClaims;
use crate::AppState;

/// Team-scope stage of the request chain.
///
/// When the request names a team - a `team_id` path parameter or query
/// parameter - the caller must be a member or hold a cross-team shortcut.
/// Requests without a team identifier are global resources and pass
/// through untouched. Team ids carried in request bodies are checked by
/// the handler itself via `RbacService::check_team_access`.
pub async fn team_guard(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<AccessTokenClaims>()
        .cloned()
        .ok_or_else(|| AppError::Unauthenticated("Missing authenticated identity".to_string()))?;

    let team_id = match extract_team_id(&mut req).await? {
        Some(id) => id,
        None => return Ok(next.run(req).await),
    };

    if state.rbac.check_team_access(claims.sub, team_id).await? {
        return Ok(next.run(req).await);
    }

    tracing::warn!(user_id = %claims.sub, team_id = %team_id, "Team access denied");
    Err(AppError::Forbidden(format!("No access to team {team_id}")))
}

async fn extract_team_id(req: &mut Request) -> Result<Option<Uuid>, AppError> {
    if let Ok(Path(params)) = req.extract_parts::<Path<HashMap<String, String>>>().await {
        if let Some(raw) = params.get("team_id") {
            return parse_team_id(raw).map(Some);
        }
    }

    if let Some(query) = req.uri().query() {
        let params: HashMap<String, String> = serde_urlencoded::from_str(query)
            .map_err(|_| AppError::BadRequest("Invalid query string".to_string()))?;
        if let Some(raw) = params.get("team_id") {
            return parse_team_id(raw).map(Some);
        }
    }

    Ok(None)
}

fn parse_team_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid team id".to_string()))
}
