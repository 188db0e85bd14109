//! User account as read from the credential store.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// User row. Owned by the credential store; this service only reads it.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    /// Login identifier - an email address or a phone number.
    pub identifier: String,
    /// Argon2 PHC string. Never serialized.
    pub password_hash: String,
    pub display_name: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.user_id,
            identifier: self.identifier.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Safe-to-return projection of a user, attached to token responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    #[schema(example = "recruiter@agency.example")]
    pub identifier: String,
    pub display_name: Option<String>,
}
