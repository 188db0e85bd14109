//! PostgreSQL implementation of the store seams.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{FamilyId, RefreshTokenRow, RoleGrant, TokenId, User};

use super::{CredentialStore, TokenLedger};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(identifier) = LOWER($1)",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn grants_for_user(&self, user_id: Uuid) -> Result<Vec<RoleGrant>, StoreError> {
        let grants = sqlx::query_as::<_, RoleGrant>(
            r#"
            SELECT r.role_name, p.permission_key
            FROM user_roles ur
            JOIN roles r ON r.role_id = ur.role_id
            LEFT JOIN role_permissions rp ON rp.role_id = r.role_id
            LEFT JOIN permissions p ON p.permission_id = rp.permission_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(grants)
    }

    async fn is_team_member(&self, user_id: Uuid, team_id: Uuid) -> Result<bool, StoreError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM user_teams WHERE user_id = $1 AND team_id = $2",
        )
        .bind(user_id)
        .bind(team_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl TokenLedger for PgStore {
    async fn insert(&self, row: &RefreshTokenRow) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens
                (token_id, family_id, user_id, token_hash, issued_utc, expires_utc, revoked_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(row.token_id)
        .bind(row.family_id)
        .bind(row.user_id)
        .bind(&row.token_hash)
        .bind(row.issued_utc)
        .bind(row.expires_utc)
        .bind(row.revoked_utc)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unexpired_rows(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshTokenRow>, StoreError> {
        let rows = sqlx::query_as::<_, RefreshTokenRow>(
            "SELECT * FROM refresh_tokens WHERE expires_utc > $1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn rotate(
        &self,
        old: TokenId,
        revoked_utc: DateTime<Utc>,
        replacement: &RefreshTokenRow,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Conditional claim: only one concurrent rotation of the same row
        // can observe revoked_utc IS NULL.
        let claimed = sqlx::query(
            "UPDATE refresh_tokens SET revoked_utc = $2 WHERE token_id = $1 AND revoked_utc IS NULL",
        )
        .bind(old)
        .bind(revoked_utc)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens
                (token_id, family_id, user_id, token_hash, issued_utc, expires_utc, revoked_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(replacement.token_id)
        .bind(replacement.family_id)
        .bind(replacement.user_id)
        .bind(&replacement.token_hash)
        .bind(replacement.issued_utc)
        .bind(replacement.expires_utc)
        .bind(replacement.revoked_utc)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn revoke_user(
        &self,
        user_id: Uuid,
        revoked_utc: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let affected = sqlx::query(
            "UPDATE refresh_tokens SET revoked_utc = $2 WHERE user_id = $1 AND revoked_utc IS NULL",
        )
        .bind(user_id)
        .bind(revoked_utc)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected)
    }

    async fn revoke_family(
        &self,
        family_id: FamilyId,
        revoked_utc: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let affected = sqlx::query(
            "UPDATE refresh_tokens SET revoked_utc = $2 WHERE family_id = $1 AND revoked_utc IS NULL",
        )
        .bind(family_id)
        .bind(revoked_utc)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected)
    }
}
