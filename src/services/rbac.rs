use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::role::{
    is_admin_permission, is_global_admin_role, PERM_READ_ALL, ROLE_MANAGER,
};
use crate::store::CredentialStore;

/// A user's flattened role and permission sets.
#[derive(Debug, Clone, Default)]
pub struct ResolvedGrants {
    pub roles: HashSet<String>,
    pub permissions: HashSet<String>,
}

impl ResolvedGrants {
    /// Holds one of the designated top-level roles.
    pub fn is_global_admin(&self) -> bool {
        self.roles.iter().any(|r| is_global_admin_role(r))
    }

    /// Holds a permission key that passes every permission check.
    pub fn has_admin_permission(&self) -> bool {
        self.permissions.iter().any(|p| is_admin_permission(p))
    }
}

struct CacheEntry {
    grants: ResolvedGrants,
    cached_at: Instant,
}

/// TTL cache for resolved grants, keyed by user id.
///
/// An explicit component rather than ambient state: the TTL is injected,
/// and invalidation is part of the public surface. Entries self-expire, so
/// any role change is visible after at most one TTL period even without an
/// explicit invalidation.
pub struct RbacCache {
    entries: DashMap<Uuid, CacheEntry>,
    ttl: Duration,
}

impl RbacCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    fn get(&self, user_id: Uuid) -> Option<ResolvedGrants> {
        let entry = self.entries.get(&user_id)?;
        if entry.cached_at.elapsed() < self.ttl {
            Some(entry.grants.clone())
        } else {
            drop(entry);
            self.entries.remove(&user_id);
            None
        }
    }

    fn insert(&self, user_id: Uuid, grants: ResolvedGrants) {
        self.entries.insert(
            user_id,
            CacheEntry {
                grants,
                cached_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, user_id: Uuid) {
        self.entries.remove(&user_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Resolves roles and permissions and answers access questions.
#[derive(Clone)]
pub struct RbacService {
    credentials: Arc<dyn CredentialStore>,
    cache: Arc<RbacCache>,
}

impl RbacService {
    pub fn new(credentials: Arc<dyn CredentialStore>, cache: Arc<RbacCache>) -> Self {
        Self { credentials, cache }
    }

    /// Flattened role and permission sets for the user, served from the
    /// cache when a fresh entry exists.
    pub async fn resolve(&self, user_id: Uuid) -> Result<ResolvedGrants, AppError> {
        if let Some(grants) = self.cache.get(user_id) {
            return Ok(grants);
        }

        let rows = self.credentials.grants_for_user(user_id).await?;
        let mut grants = ResolvedGrants::default();
        for row in rows {
            grants.roles.insert(row.role_name);
            if let Some(key) = row.permission_key {
                grants.permissions.insert(key);
            }
        }

        self.cache.insert(user_id, grants.clone());
        Ok(grants)
    }

    /// True when the user holds a top-level role, or any of `required`.
    pub async fn has_role<S: AsRef<str>>(
        &self,
        user_id: Uuid,
        required: &[S],
    ) -> Result<bool, AppError> {
        let grants = self.resolve(user_id).await?;
        if grants.is_global_admin() {
            return Ok(true);
        }
        Ok(required.iter().any(|r| grants.roles.contains(r.as_ref())))
    }

    /// True when the user holds an all-access key, or any of `required`.
    pub async fn has_permission<S: AsRef<str>>(
        &self,
        user_id: Uuid,
        required: &[S],
    ) -> Result<bool, AppError> {
        let grants = self.resolve(user_id).await?;
        if grants.has_admin_permission() {
            return Ok(true);
        }
        Ok(required
            .iter()
            .any(|p| grants.permissions.contains(p.as_ref())))
    }

    /// Team visibility. Global admins pass, as do managers holding the
    /// cross-team read permission. Everyone else needs a membership row -
    /// checked live on every call, because team assignment churns faster
    /// than role assignment.
    pub async fn check_team_access(&self, user_id: Uuid, team_id: Uuid) -> Result<bool, AppError> {
        let grants = self.resolve(user_id).await?;
        if grants.is_global_admin() || grants.has_admin_permission() {
            return Ok(true);
        }
        if grants.roles.contains(ROLE_MANAGER) && grants.permissions.contains(PERM_READ_ALL) {
            return Ok(true);
        }

        let member = self.credentials.is_team_member(user_id, team_id).await?;
        Ok(member)
    }

    /// Drop one user's cache entry. Called by whatever mutates their roles.
    pub fn invalidate_user(&self, user_id: Uuid) {
        self.cache.invalidate(user_id);
    }

    /// Drop every cache entry. For bulk role-schema changes.
    pub fn invalidate_all(&self) {
        self.cache.clear();
    }
}
