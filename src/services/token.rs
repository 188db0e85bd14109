use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{FamilyId, RefreshTokenRow, User};
use crate::services::{JwtService, SecretHasher};
use crate::store::{CredentialStore, TokenLedger};

/// Owns issuance, rotation and revocation of refresh tokens.
///
/// Refresh secrets are opaque random strings handed to the client exactly
/// once; the ledger keeps only their digest. Every failure on the rotation
/// path collapses into [`AppError::InvalidToken`] so a caller cannot probe
/// which condition applied.
#[derive(Clone)]
pub struct TokenService {
    credentials: Arc<dyn CredentialStore>,
    ledger: Arc<dyn TokenLedger>,
    jwt: JwtService,
    hasher: Arc<dyn SecretHasher>,
    refresh_token_expiry_days: i64,
}

/// Result of issuing or rotating a session.
#[derive(Debug)]
pub struct IssuedTokens {
    pub access_token: String,
    /// The plaintext refresh secret. Not retrievable again.
    pub refresh_secret: String,
    pub expires_in: i64,
}

impl TokenService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        ledger: Arc<dyn TokenLedger>,
        jwt: JwtService,
        hasher: Arc<dyn SecretHasher>,
        refresh_token_expiry_days: i64,
    ) -> Self {
        Self {
            credentials,
            ledger,
            jwt,
            hasher,
            refresh_token_expiry_days,
        }
    }

    /// Start a new session: fresh family, fresh secret, one ledger row.
    pub async fn issue(&self, user: &User) -> Result<IssuedTokens, AppError> {
        let (row, tokens) = self.mint(user, FamilyId::generate())?;
        self.ledger.insert(&row).await?;

        tracing::info!(
            user_id = %user.user_id,
            family_id = %row.family_id,
            "Issued refresh token"
        );

        Ok(tokens)
    }

    /// Exchange a presented refresh secret for a new token pair.
    ///
    /// The presented secret is verified against every unexpired ledger row
    /// without short-circuiting, so response timing does not act as a
    /// verification oracle. A match on an already-revoked row is treated
    /// as a compromise signal: the whole family is revoked before the
    /// uniform failure is returned.
    pub async fn rotate(&self, presented_secret: &str) -> Result<(User, IssuedTokens), AppError> {
        if presented_secret.is_empty() {
            return Err(AppError::InvalidToken);
        }

        let now = Utc::now();
        let rows = self.ledger.unexpired_rows(now).await?;

        let mut matched: Option<&RefreshTokenRow> = None;
        for row in &rows {
            let ok = self.hasher.verify(presented_secret, &row.token_hash);
            if ok && matched.is_none() {
                matched = Some(row);
            }
        }

        let Some(row) = matched else {
            return Err(AppError::InvalidToken);
        };

        if row.is_revoked() {
            let revoked = self.ledger.revoke_family(row.family_id, now).await?;
            tracing::warn!(
                user_id = %row.user_id,
                family_id = %row.family_id,
                revoked,
                "Revoked refresh token presented again; family revoked"
            );
            return Err(AppError::InvalidToken);
        }

        let user = self
            .credentials
            .find_user_by_id(row.user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        let (replacement, tokens) = self.mint(&user, row.family_id)?;

        let claimed = self.ledger.rotate(row.token_id, now, &replacement).await?;
        if !claimed {
            // Another request rotated this row first; fail closed.
            tracing::warn!(
                user_id = %user.user_id,
                token_id = %row.token_id,
                "Refresh token already claimed by a concurrent rotation"
            );
            return Err(AppError::InvalidToken);
        }

        tracing::info!(
            user_id = %user.user_id,
            family_id = %row.family_id,
            "Refresh token rotated"
        );

        Ok((user, tokens))
    }

    /// Logout semantics: revoke every live refresh token the user holds,
    /// across all devices and families.
    pub async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, AppError> {
        let revoked = self.ledger.revoke_user(user_id, Utc::now()).await?;
        tracing::info!(user_id = %user_id, revoked, "Revoked refresh tokens for user");
        Ok(revoked)
    }

    fn mint(
        &self,
        user: &User,
        family_id: FamilyId,
    ) -> Result<(RefreshTokenRow, IssuedTokens), AppError> {
        let refresh_secret = generate_refresh_secret();
        let row = RefreshTokenRow::new(
            user.user_id,
            family_id,
            self.hasher.hash(&refresh_secret),
            self.refresh_token_expiry_days,
        );
        let access_token = self.jwt.generate_access_token(user)?;

        Ok((
            row,
            IssuedTokens {
                access_token,
                refresh_secret,
                expires_in: self.jwt.access_token_expiry_seconds(),
            },
        ))
    }
}

fn generate_refresh_secret() -> String {
    let mut rng = rand::thread_rng();
    let secret_bytes: [u8; 32] = rng.gen();
    hex::encode(secret_bytes)
}
