//! Store seams for the credential data and the refresh token ledger.
//!
//! Production uses the PostgreSQL implementation; integration tests run
//! against the in-memory one. Both sides of the seam return [`StoreError`]
//! so dependency failures stay distinguishable from authorization denials.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{FamilyId, RefreshTokenRow, RoleGrant, TokenId, User};

/// Read access to users, role assignments and team memberships. This
/// service never writes through this trait.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_user_by_identifier(&self, identifier: &str)
        -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    /// All (role, permission) pairs assigned to the user, one row per pair.
    async fn grants_for_user(&self, user_id: Uuid) -> Result<Vec<RoleGrant>, StoreError>;

    async fn is_team_member(&self, user_id: Uuid, team_id: Uuid) -> Result<bool, StoreError>;
}

/// Persistence for refresh token rows. The token service is the only
/// caller; rows are appended and revoked, never updated otherwise.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    async fn insert(&self, row: &RefreshTokenRow) -> Result<(), StoreError>;

    /// Every row that has not passed its expiry, revoked rows included -
    /// the rotation path needs those to spot reuse of a dead token.
    async fn unexpired_rows(&self, now: DateTime<Utc>) -> Result<Vec<RefreshTokenRow>, StoreError>;

    /// Atomically revoke `old` and insert `replacement`. The revocation is
    /// conditional on the row still being unrevoked; returns `false` when
    /// another rotation claimed it first, in which case nothing is written.
    async fn rotate(
        &self,
        old: TokenId,
        revoked_utc: DateTime<Utc>,
        replacement: &RefreshTokenRow,
    ) -> Result<bool, StoreError>;

    /// Revoke every live row for the user. Returns the number revoked.
    async fn revoke_user(
        &self,
        user_id: Uuid,
        revoked_utc: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Revoke every live row in the family. Returns the number revoked.
    async fn revoke_family(
        &self,
        family_id: FamilyId,
        revoked_utc: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}
