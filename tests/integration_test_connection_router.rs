mod common;

use std::sync::Arc;
use std::time::Duration;

use booking_admin_core::domain::services::connection_router::{ConnectionRegistry, RouterState, TenantConnectionRouter};
use common::{tenant_record, MockMirror, TestApp, TestConnector, MIRROR_TENANT};

#[tokio::test]
async fn test_concurrent_activation_builds_one_connection() {
    let app = TestApp::new().await;
    let mut connector = TestConnector::new(Arc::new(MockMirror::default()));
    connector.connect_delay = Duration::from_millis(50);
    let connector = Arc::new(connector);

    let router = Arc::new(TenantConnectionRouter::new(Arc::new(ConnectionRegistry::new(connector.clone()))));
    let tenant = tenant_record(MIRROR_TENANT, "mexicuts_admin", &app.db_url(MIRROR_TENANT), false).config;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let router = router.clone();
        let tenant = tenant.clone();
        handles.push(tokio::spawn(async move { router.activate(&tenant).await.unwrap() }));
    }

    let mut connections = Vec::new();
    for handle in handles {
        connections.push(handle.await.unwrap());
    }

    assert_eq!(connector.connect_count(), 1);
    assert!(connections.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(router.registry().tenant_ids().await, vec![MIRROR_TENANT.to_string()]);
    assert!(router.current().is_some());
}

#[tokio::test]
async fn test_deactivate_keeps_cache() {
    let app = TestApp::new().await;
    let router = TenantConnectionRouter::new(Arc::new(ConnectionRegistry::new(app.connector.clone())));
    let tenant = tenant_record(MIRROR_TENANT, "mexicuts_admin", &app.db_url(MIRROR_TENANT), true).config;

    let first = router.activate(&tenant).await.unwrap();
    assert!(first.mirror.is_some());

    router.deactivate();
    assert!(router.current().is_none());
    assert!(matches!(router.state(), RouterState::NoSession));
    assert!(router.registry().tenant_ids().await.contains(&MIRROR_TENANT.to_string()));

    let second = router.activate(&tenant).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(app.connector.connect_count(), 1);
}

#[tokio::test]
async fn test_failed_connect_returns_to_no_session() {
    let app = TestApp::new().await;
    let router = TenantConnectionRouter::new(Arc::new(ConnectionRegistry::new(app.connector.clone())));
    let tenant = tenant_record("broken", "broken_admin", "sqlite:///definitely/not/a/dir/broken.db", false).config;

    assert!(router.activate(&tenant).await.is_err());
    assert!(matches!(router.state(), RouterState::NoSession));
    assert!(router.registry().tenant_ids().await.is_empty());
}
