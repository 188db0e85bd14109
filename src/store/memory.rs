//! In-memory store used by the integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{FamilyId, RefreshTokenRow, RoleGrant, TokenId, User};

use super::{CredentialStore, TokenLedger};

/// Process-local implementation of both store seams. Seeding goes through
/// the helper methods; the grant-query counter lets tests assert on cache
/// behavior without reaching into the resolver.
#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<Vec<User>>,
    grants: Mutex<HashMap<Uuid, Vec<RoleGrant>>>,
    memberships: Mutex<HashSet<(Uuid, Uuid)>>,
    tokens: Mutex<Vec<RefreshTokenRow>>,
    grant_queries: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|e| StoreError::Backend(format!("mutex poisoned: {e}")))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(
        &self,
        identifier: &str,
        password_hash: String,
        display_name: Option<&str>,
    ) -> Uuid {
        let user = User {
            user_id: Uuid::new_v4(),
            identifier: identifier.to_string(),
            password_hash,
            display_name: display_name.map(str::to_string),
            created_utc: Utc::now(),
        };
        let id = user.user_id;
        self.users
            .lock()
            .expect("user seed lock")
            .push(user);
        id
    }

    pub fn grant_role(&self, user_id: Uuid, role: &str, permissions: &[&str]) {
        let mut grants = self.grants.lock().expect("grant seed lock");
        let entry = grants.entry(user_id).or_default();
        if permissions.is_empty() {
            entry.push(RoleGrant {
                role_name: role.to_string(),
                permission_key: None,
            });
        }
        for key in permissions {
            entry.push(RoleGrant {
                role_name: role.to_string(),
                permission_key: Some(key.to_string()),
            });
        }
    }

    pub fn add_team_member(&self, user_id: Uuid, team_id: Uuid) {
        self.memberships
            .lock()
            .expect("membership seed lock")
            .insert((user_id, team_id));
    }

    /// Number of times `grants_for_user` hit this store.
    pub fn grant_query_count(&self) -> usize {
        self.grant_queries.load(Ordering::SeqCst)
    }

    /// Snapshot of the ledger for assertions.
    pub fn token_rows(&self) -> Vec<RefreshTokenRow> {
        self.tokens.lock().expect("token snapshot lock").clone()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<User>, StoreError> {
        let users = lock(&self.users)?;
        Ok(users
            .iter()
            .find(|u| u.identifier.eq_ignore_ascii_case(identifier))
            .cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let users = lock(&self.users)?;
        Ok(users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn grants_for_user(&self, user_id: Uuid) -> Result<Vec<RoleGrant>, StoreError> {
        self.grant_queries.fetch_add(1, Ordering::SeqCst);
        let grants = lock(&self.grants)?;
        Ok(grants.get(&user_id).cloned().unwrap_or_default())
    }

    async fn is_team_member(&self, user_id: Uuid, team_id: Uuid) -> Result<bool, StoreError> {
        let memberships = lock(&self.memberships)?;
        Ok(memberships.contains(&(user_id, team_id)))
    }
}

#[async_trait]
impl TokenLedger for InMemoryStore {
    async fn insert(&self, row: &RefreshTokenRow) -> Result<(), StoreError> {
        lock(&self.tokens)?.push(row.clone());
        Ok(())
    }

    async fn unexpired_rows(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshTokenRow>, StoreError> {
        let tokens = lock(&self.tokens)?;
        Ok(tokens.iter().filter(|t| !t.is_expired(now)).cloned().collect())
    }

    async fn rotate(
        &self,
        old: TokenId,
        revoked_utc: DateTime<Utc>,
        replacement: &RefreshTokenRow,
    ) -> Result<bool, StoreError> {
        let mut tokens = lock(&self.tokens)?;
        let Some(row) = tokens.iter_mut().find(|t| t.token_id == old) else {
            return Ok(false);
        };
        if row.revoked_utc.is_some() {
            return Ok(false);
        }
        row.revoked_utc = Some(revoked_utc);
        tokens.push(replacement.clone());
        Ok(true)
    }

    async fn revoke_user(
        &self,
        user_id: Uuid,
        revoked_utc: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut tokens = lock(&self.tokens)?;
        let mut revoked = 0;
        for row in tokens.iter_mut() {
            if row.user_id == user_id && row.revoked_utc.is_none() {
                row.revoked_utc = Some(revoked_utc);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn revoke_family(
        &self,
        family_id: FamilyId,
        revoked_utc: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut tokens = lock(&self.tokens)?;
        let mut revoked = 0;
        for row in tokens.iter_mut() {
            if row.family_id == family_id && row.revoked_utc.is_none() {
                row.revoked_utc = Some(revoked_utc);
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}
