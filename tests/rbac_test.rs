mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;

use recruit_auth::{
    services::{RbacCache, RbacService},
    store::InMemoryStore,
};

fn resolver(store: &Arc<InMemoryStore>, ttl: Duration) -> RbacService {
    RbacService::new(store.clone(), Arc::new(RbacCache::new(ttl)))
}

#[tokio::test]
async fn top_level_role_passes_any_role_or_permission_check() {
    let store = Arc::new(InMemoryStore::new());
    let seeded = seed_users(&store);
    let rbac = resolver(&store, Duration::from_secs(60));

    // Not literally assigned, but the shortcut applies.
    assert!(rbac
        .has_role(seeded.ceo, &["Recruiter", "Sourcer"])
        .await
        .expect("has_role"));
    assert!(rbac
        .has_permission(seeded.ceo, &["delete:projects"])
        .await
        .expect("has_permission"));
}

#[tokio::test]
async fn unprivileged_user_fails_unmatched_checks() {
    let store = Arc::new(InMemoryStore::new());
    let seeded = seed_users(&store);
    let rbac = resolver(&store, Duration::from_secs(60));

    assert!(!rbac
        .has_role(seeded.viewer, &["Manager"])
        .await
        .expect("has_role"));
    assert!(!rbac
        .has_permission(seeded.viewer, &["read:candidates"])
        .await
        .expect("has_permission"));

    // Matching grants still work without shortcuts.
    assert!(rbac
        .has_role(seeded.recruiter, &["Recruiter"])
        .await
        .expect("has_role"));
    assert!(rbac
        .has_permission(seeded.recruiter, &["read:candidates"])
        .await
        .expect("has_permission"));
}

#[tokio::test]
async fn cache_serves_repeat_queries_without_store_access() {
    let store = Arc::new(InMemoryStore::new());
    let seeded = seed_users(&store);
    let rbac = resolver(&store, Duration::from_secs(60));

    rbac.resolve(seeded.recruiter).await.expect("resolve");
    rbac.resolve(seeded.recruiter).await.expect("resolve");
    rbac.has_permission(seeded.recruiter, &["read:candidates"])
        .await
        .expect("has_permission");

    assert_eq!(store.grant_query_count(), 1);
}

#[tokio::test]
async fn expired_cache_entries_refetch_from_the_store() {
    let store = Arc::new(InMemoryStore::new());
    let seeded = seed_users(&store);
    // Zero TTL: every entry is already expired when read back.
    let rbac = resolver(&store, Duration::ZERO);

    rbac.resolve(seeded.recruiter).await.expect("resolve");
    rbac.resolve(seeded.recruiter).await.expect("resolve");

    assert_eq!(store.grant_query_count(), 2);
}

#[tokio::test]
async fn invalidation_makes_grant_changes_visible() {
    let store = Arc::new(InMemoryStore::new());
    let seeded = seed_users(&store);
    let rbac = resolver(&store, Duration::from_secs(60));

    assert!(!rbac
        .has_role(seeded.viewer, &["Manager"])
        .await
        .expect("has_role"));

    // Promote the viewer; the cached answer is intentionally stale...
    store.grant_role(seeded.viewer, "Manager", &["read:all"]);
    assert!(!rbac
        .has_role(seeded.viewer, &["Manager"])
        .await
        .expect("has_role"));

    // ...until the entry is dropped.
    rbac.invalidate_user(seeded.viewer);
    assert!(rbac
        .has_role(seeded.viewer, &["Manager"])
        .await
        .expect("has_role"));
}

#[tokio::test]
async fn invalidate_all_clears_every_entry() {
    let store = Arc::new(InMemoryStore::new());
    let seeded = seed_users(&store);
    let rbac = resolver(&store, Duration::from_secs(60));

    rbac.resolve(seeded.recruiter).await.expect("resolve");
    rbac.resolve(seeded.viewer).await.expect("resolve");
    assert_eq!(store.grant_query_count(), 2);

    rbac.invalidate_all();
    rbac.resolve(seeded.recruiter).await.expect("resolve");
    rbac.resolve(seeded.viewer).await.expect("resolve");
    assert_eq!(store.grant_query_count(), 4);
}

#[tokio::test]
async fn team_access_requires_membership_or_a_shortcut() {
    let store = Arc::new(InMemoryStore::new());
    let seeded = seed_users(&store);
    let rbac = resolver(&store, Duration::from_secs(60));

    // Member of exactly one team.
    assert!(rbac
        .check_team_access(seeded.recruiter, seeded.team_id)
        .await
        .expect("team access"));
    assert!(!rbac
        .check_team_access(seeded.recruiter, seeded.other_team_id)
        .await
        .expect("team access"));

    // Manager with the cross-team read permission sees every team.
    assert!(rbac
        .check_team_access(seeded.manager, seeded.other_team_id)
        .await
        .expect("team access"));

    // Global admin sees every team.
    assert!(rbac
        .check_team_access(seeded.ceo, seeded.other_team_id)
        .await
        .expect("team access"));

    // No role, no membership, no access.
    assert!(!rbac
        .check_team_access(seeded.viewer, seeded.team_id)
        .await
        .expect("team access"));
}
