use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::UserSummary;
use crate::services::IssuedTokens;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Email address or phone number.
    #[validate(length(min = 3, message = "Identifier is required"))]
    #[schema(example = "recruiter@agency.example")]
    pub identifier: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "correct-horse-battery")]
    pub password: String,
}

/// Returned by login and refresh. The refresh token is also set as an
/// HTTP-only cookie scoped to the auth routes; the body copy exists for
/// clients that cannot use cookies.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 900)]
    pub expires_in: i64,
    pub user: UserSummary,
}

impl AuthResponse {
    pub fn new(tokens: IssuedTokens, user: UserSummary) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_secret,
            token_type: "Bearer".to_string(),
            expires_in: tokens.expires_in,
            user,
        }
    }
}

/// The caller's resolved identity: who am I, what can I do.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub id: Uuid,
    #[schema(example = "recruiter@agency.example")]
    pub identifier: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Logged out successfully")]
    pub message: String,
}
