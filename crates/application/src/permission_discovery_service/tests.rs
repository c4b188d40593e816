use std::collections::BTreeSet;
use std::sync::Arc;

use permbit_core::{AppError, PersonId};
use permbit_domain::{PermissionBitfield, RouteDeclaration, SUPER_ADMIN_ROLE_NAME};

use crate::EffectivePermissionService;
use crate::permission_ports::StaticRouteCatalog;
use crate::test_support::{Harness, code, harness};

use super::PermissionDiscoveryService;

fn discovery(harness: &Harness, routes: Vec<RouteDeclaration>) -> PermissionDiscoveryService {
    PermissionDiscoveryService::new(
        Arc::new(StaticRouteCatalog::new(routes)),
        harness.store.clone(),
        Arc::new(harness.cache.clone()),
    )
}

fn user_routes() -> Vec<RouteDeclaration> {
    vec![
        RouteDeclaration::new("list_users_handler", "GET", "/api/users", &["users.read"]),
        RouteDeclaration::new(
            "update_user_handler",
            "PUT",
            "/api/users/{user_id}",
            &["users.read", "users.write"],
        ),
        RouteDeclaration::new("health_handler", "GET", "/health", &[]),
    ]
}

#[tokio::test]
async fn empty_registry_assigns_consecutive_bits() {
    let harness = harness(300);
    let discovered = discovery(&harness, user_routes()).discover_permissions().await;

    let Ok(discovered) = discovered else {
        panic!("discovery should succeed");
    };
    let summary: Vec<(&str, String, i32, bool)> = discovered
        .iter()
        .map(|permission| {
            (
                permission.code.as_str(),
                permission.bitfield.to_decimal(),
                permission.sort_order,
                permission.is_new,
            )
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            ("users.read", "1".to_owned(), 1, true),
            ("users.write", "2".to_owned(), 2, true),
        ]
    );
    assert_eq!(discovered[0].category, "users");
    assert_eq!(discovered[0].name, "Read");
}

#[tokio::test]
async fn new_codes_double_from_the_highest_stored_bit() {
    let harness = harness(300);
    for (value, bit) in [("accounts.read", 1_u64), ("accounts.update", 2), ("accounts.delete", 4)] {
        harness
            .store
            .seed_permission(value, PermissionBitfield::from(bit))
            .await;
    }

    let routes = vec![
        RouteDeclaration::new("list_accounts_handler", "GET", "/api/accounts", &["accounts.read"]),
        RouteDeclaration::new("list_banks_handler", "GET", "/api/banks", &["banks.read"]),
        RouteDeclaration::new("create_bank_handler", "POST", "/api/banks", &["banks.create"]),
    ];
    let discovered = discovery(&harness, routes).discover_permissions().await;
    let Ok(discovered) = discovered else {
        panic!("discovery should succeed");
    };

    let new_bits: Vec<(&str, String)> = discovered
        .iter()
        .filter(|permission| permission.is_new)
        .map(|permission| (permission.code.as_str(), permission.bitfield.to_decimal()))
        .collect();
    assert_eq!(
        new_bits,
        vec![("banks.create", "8".to_owned()), ("banks.read", "16".to_owned())]
    );

    let existing = discovered
        .iter()
        .find(|permission| permission.code.as_str() == "accounts.read");
    assert!(matches!(existing, Some(permission) if !permission.is_new && permission.bitfield == PermissionBitfield::from(1)));
}

#[tokio::test]
async fn malformed_codes_are_skipped() {
    let harness = harness(300);
    let routes = vec![
        RouteDeclaration::new("a_handler", "GET", "/a", &["Users.Read", "users", "users.read"]),
        RouteDeclaration::new("b_handler", "GET", "/b", &["users.read.extra", ".read"]),
    ];

    let discovered = discovery(&harness, routes).discover_permissions().await;
    let codes: Option<Vec<String>> = discovered.ok().map(|permissions| {
        permissions
            .iter()
            .map(|permission| permission.code.to_string())
            .collect()
    });
    assert_eq!(codes, Some(vec!["users.read".to_owned()]));
}

#[tokio::test]
async fn every_discovered_bit_is_unique_and_single() {
    let harness = harness(300);
    let actions: Vec<String> = (0..80).map(|index| format!("reports.export_{index:02}")).collect();
    let required: Vec<&str> = actions.iter().map(String::as_str).collect();
    let routes = vec![RouteDeclaration::new("bulk_handler", "GET", "/bulk", &required)];

    let service = discovery(&harness, routes);
    assert!(service.sync_permissions().await.is_ok());

    let permissions = harness.store.permissions().await;
    assert_eq!(permissions.len(), 80);
    assert!(permissions
        .iter()
        .all(|permission| permission.bitfield.is_single_bit()));

    let distinct: BTreeSet<String> = permissions
        .iter()
        .map(|permission| permission.bitfield.to_decimal())
        .collect();
    assert_eq!(distinct.len(), 80);
    assert!(permissions
        .iter()
        .any(|permission| permission.bitfield == PermissionBitfield::from_bit_position(79)));
}

#[tokio::test]
async fn second_sync_without_changes_is_a_noop() {
    let harness = harness(300);
    let service = discovery(&harness, user_routes());

    let first = service.sync_permissions().await;
    assert!(matches!(first, Ok(ref report) if report.inserted.len() == 2));
    let mutations = harness.store.mutations();
    let snapshot = harness.store.permissions().await;

    let second = service.sync_permissions().await;
    assert!(matches!(second, Ok(ref report) if report.is_noop()));
    assert_eq!(harness.store.mutations(), mutations);
    assert_eq!(harness.store.permissions().await, snapshot);
}

#[tokio::test]
async fn sync_refreshes_code_cache_entries() {
    let harness = harness(300);
    let service = discovery(&harness, user_routes());

    assert!(service.sync_permissions().await.is_ok());

    assert_eq!(
        harness.cache_store.raw("perm:bitfield:users.write").await,
        Some("2".to_owned())
    );
    assert_eq!(
        harness.cache_store.raw("perm:category:users").await,
        Some("users.read,users.write".to_owned())
    );
}

#[tokio::test]
async fn new_codes_are_granted_to_super_admin() {
    let harness = harness(300);
    let super_admin = harness
        .store
        .seed_role(SUPER_ADMIN_ROLE_NAME, true, &[])
        .await;

    let report = discovery(&harness, user_routes()).sync_permissions().await;
    assert!(matches!(report, Ok(ref report) if report.super_admin_grants == 2));

    let role = harness.store.role(super_admin.as_str()).await;
    assert!(matches!(
        role,
        Some(role) if role.permissions == vec![code("users.read"), code("users.write")]
    ));
}

#[tokio::test]
async fn undeclared_codes_are_deprecated_and_restored_with_their_bit() {
    let harness = harness(300);
    harness
        .store
        .seed_permission("legacy.export", PermissionBitfield::from(1))
        .await;

    let report = discovery(&harness, user_routes()).sync_permissions().await;
    assert!(matches!(
        report,
        Ok(ref report) if report.deprecated == vec![code("legacy.export")]
    ));
    assert!(matches!(
        harness.store.permission("legacy.export").await,
        Some(permission) if permission.is_deprecated
    ));
    // Deprecated bits are never handed out again.
    assert!(matches!(
        harness.store.permission("users.read").await,
        Some(permission) if permission.bitfield == PermissionBitfield::from(2)
    ));

    let mut routes = user_routes();
    routes.push(RouteDeclaration::new(
        "export_handler",
        "GET",
        "/api/legacy/export",
        &["legacy.export"],
    ));
    let report = discovery(&harness, routes).sync_permissions().await;
    assert!(matches!(
        report,
        Ok(ref report) if report.restored == vec![code("legacy.export")] && report.inserted.is_empty()
    ));
    assert!(matches!(
        harness.store.permission("legacy.export").await,
        Some(permission) if permission.is_active() && permission.bitfield == PermissionBitfield::from(1)
    ));
}

#[tokio::test]
async fn super_admin_holders_see_new_grants_right_after_sync() {
    let harness = harness(300);
    let super_admin = harness
        .store
        .seed_role(SUPER_ADMIN_ROLE_NAME, true, &[])
        .await;
    let person_id = PersonId::new();
    harness
        .store
        .seed_assignment(person_id, super_admin.as_str())
        .await;

    let effective = EffectivePermissionService::new(harness.store.clone(), harness.cache.clone());
    let before = effective.calculate_effective_permissions(person_id).await;
    assert!(matches!(before, Ok(ref bits) if bits.is_zero()));

    let report = discovery(&harness, user_routes()).sync_permissions().await;
    assert!(matches!(
        report,
        Ok(ref report) if report.super_admin_grants == 2
            && report.affected_role_ids == vec![super_admin.clone()]
    ));

    let after = effective.calculate_effective_permissions(person_id).await;
    assert!(matches!(after, Ok(ref bits) if bits.to_decimal() == "3"));
    assert!(matches!(
        effective.has_permission(person_id, "users.read").await,
        Ok(true)
    ));
}

#[tokio::test]
async fn deprecation_and_restore_clear_holders_of_granting_roles() {
    let harness = harness(300);
    harness
        .store
        .seed_permission("legacy.export", PermissionBitfield::from(1))
        .await;
    let exporter = harness
        .store
        .seed_role("EXPORTER", false, &["legacy.export"])
        .await;
    let bystander = harness.store.seed_role("VIEWER", false, &[]).await;
    let person_id = PersonId::new();
    harness
        .store
        .seed_assignment(person_id, exporter.as_str())
        .await;

    let effective = EffectivePermissionService::new(harness.store.clone(), harness.cache.clone());
    let warmed = effective.calculate_effective_permissions(person_id).await;
    assert!(matches!(warmed, Ok(ref bits) if bits.to_decimal() == "1"));

    let report = discovery(&harness, user_routes()).sync_permissions().await;
    assert!(matches!(
        report,
        Ok(ref report) if report.affected_role_ids == vec![exporter.clone()]
            && !report.affected_role_ids.contains(&bystander)
    ));
    let deprecated = effective.calculate_effective_permissions(person_id).await;
    assert!(matches!(deprecated, Ok(ref bits) if bits.is_zero()));

    let mut routes = user_routes();
    routes.push(RouteDeclaration::new(
        "export_handler",
        "GET",
        "/api/legacy/export",
        &["legacy.export"],
    ));
    let report = discovery(&harness, routes).sync_permissions().await;
    assert!(matches!(
        report,
        Ok(ref report) if report.restored == vec![code("legacy.export")]
            && report.affected_role_ids == vec![exporter.clone()]
    ));
    assert!(matches!(
        effective.has_permission(person_id, "legacy.export").await,
        Ok(true)
    ));
}

#[tokio::test]
async fn failed_sync_leaves_registry_and_cache_untouched() {
    let harness = harness(300);
    harness.store.set_fail_sync(true);
    let service = discovery(&harness, user_routes());

    let result = service.sync_permissions().await;
    assert!(matches!(result, Err(AppError::Internal(_))));
    assert!(harness.store.permissions().await.is_empty());
    assert_eq!(harness.store.mutations(), 0);
    assert_eq!(harness.cache_store.operations(), 0);

    assert!(service.sync_on_startup().await.is_none());

    harness.store.set_fail_sync(false);
    assert!(service.sync_on_startup().await.is_some());
    assert_eq!(harness.store.permissions().await.len(), 2);
}
