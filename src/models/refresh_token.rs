//! Refresh token ledger row.

use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{FamilyId, TokenId};

/// One refresh token issuance. The plaintext secret handed to the client
/// is never stored; `token_hash` is its one-way digest. Rows transition to
/// revoked exactly once and are never reactivated or deleted here.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRow {
    pub token_id: TokenId,
    pub family_id: FamilyId,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_utc: DateTime<Utc>,
    pub expires_utc: DateTime<Utc>,
    pub revoked_utc: Option<DateTime<Utc>>,
}

impl RefreshTokenRow {
    /// Create a fresh row in the given family with a configured lifetime.
    pub fn new(user_id: Uuid, family_id: FamilyId, token_hash: String, expiry_days: i64) -> Self {
        let now = Utc::now();
        Self {
            token_id: TokenId::generate(),
            family_id,
            user_id,
            token_hash,
            issued_utc: now,
            expires_utc: now + Duration::days(expiry_days),
            revoked_utc: None,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_utc
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_utc.is_some()
    }

    /// Usable for rotation: neither expired nor revoked.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && !self.is_revoked()
    }
}
