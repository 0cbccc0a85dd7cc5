mod common;

use booking_admin_core::domain::services::connection_router::RouterState;
use booking_admin_core::error::{AppError, LOGIN_FAILED_MESSAGE};
use common::{TestApp, BROKEN_TENANT, MIRROR_TENANT, PASSWORD, PLAIN_TENANT};

#[tokio::test]
async fn test_login_resolves_tenant_and_persists_it() {
    let app = TestApp::new().await;

    let session = app.state.sessions.login("  mexicuts_admin ", PASSWORD).await.unwrap();
    assert_eq!(session.tenant_id(), MIRROR_TENANT);
    assert!(session.is_live());
    assert_eq!(app.session_store.current().as_deref(), Some(MIRROR_TENANT));
    assert!(matches!(app.state.sessions.router().state(), RouterState::Active(_)));

    let active = app.state.sessions.active().await.unwrap();
    assert_eq!(active.tenant_id(), MIRROR_TENANT);
}

#[tokio::test]
async fn test_unknown_tenant_and_wrong_password_look_the_same() {
    let app = TestApp::new().await;

    let unknown = app.state.sessions.login("acme_admin", PASSWORD).await.err().unwrap();
    let wrong_password = app.state.sessions.login("mexicuts_admin", "nope").await.err().unwrap();
    let wrong_username = app.state.sessions.login("mexicuts_owner", PASSWORD).await.err().unwrap();

    assert!(matches!(unknown, AppError::TenantNotFound(_)));
    assert!(matches!(wrong_password, AppError::InvalidCredentials));
    assert!(matches!(wrong_username, AppError::InvalidCredentials));
    assert_eq!(unknown.to_string(), LOGIN_FAILED_MESSAGE);
    assert_eq!(wrong_password.to_string(), unknown.to_string());

    assert!(matches!(app.state.sessions.active().await, Err(AppError::NoActiveSession)));
    assert_eq!(app.connector.connect_count(), 0);
    assert_eq!(app.session_store.current(), None);
}

#[tokio::test]
async fn test_logout_drops_domain_state_but_keeps_connection() {
    let app = TestApp::new().await;
    let session = app.login().await;

    app.state.sessions.logout().await.unwrap();

    assert!(!session.is_live());
    assert!(matches!(app.state.sessions.active().await, Err(AppError::NoActiveSession)));
    assert!(matches!(app.state.sessions.router().state(), RouterState::NoSession));
    assert_eq!(app.session_store.current(), None);
    assert_eq!(app.state.sessions.router().registry().tenant_ids().await, vec![MIRROR_TENANT.to_string()]);

    // Logging back in reuses the cached connection.
    let again = app.login().await;
    assert_eq!(app.connector.connect_count(), 1);
    assert!(std::sync::Arc::ptr_eq(&session.connection, &again.connection));

    // A second logout with nothing active is harmless.
    app.state.sessions.logout().await.unwrap();
    app.state.sessions.logout().await.unwrap();
}

#[tokio::test]
async fn test_switching_tenants_tears_down_previous_session() {
    let app = TestApp::new().await;
    let first = app.login().await;
    let second = app.login_plain().await;

    assert!(!first.is_live());
    assert!(second.is_live());
    assert_eq!(app.state.sessions.active().await.unwrap().tenant_id(), PLAIN_TENANT);
    assert_eq!(app.session_store.current().as_deref(), Some(PLAIN_TENANT));
    assert_eq!(app.state.sessions.router().registry().tenant_ids().await.len(), 2);
}

#[tokio::test]
async fn test_failed_login_keeps_current_session() {
    let app = TestApp::new().await;
    let session = app.login().await;

    assert!(app.state.sessions.login("fadeco_owner", "wrong").await.is_err());

    assert!(session.is_live());
    assert_eq!(app.state.sessions.active().await.unwrap().tenant_id(), MIRROR_TENANT);
}

#[tokio::test]
async fn test_switch_to_unopenable_tenant_keeps_current_session() {
    let app = TestApp::new().await;
    let session = app.login().await;

    let result = app.state.sessions.login("brokenco_admin", PASSWORD).await;
    assert!(matches!(result, Err(AppError::Database(_))));

    assert!(session.is_live());
    assert_eq!(app.state.sessions.active().await.unwrap().tenant_id(), MIRROR_TENANT);
    assert_eq!(app.session_store.current().as_deref(), Some(MIRROR_TENANT));
    match app.state.sessions.router().state() {
        RouterState::Active(connection) => assert!(std::sync::Arc::ptr_eq(&connection, &session.connection)),
        _ => panic!("router should still point at the current tenant"),
    }
    assert!(!app.state.sessions.router().registry().tenant_ids().await.contains(&BROKEN_TENANT.to_string()));
}

#[tokio::test]
async fn test_failed_first_login_leaves_no_session() {
    let app = TestApp::new().await;

    assert!(app.state.sessions.login("brokenco_admin", PASSWORD).await.is_err());
    assert!(matches!(app.state.sessions.active().await, Err(AppError::NoActiveSession)));
    assert!(matches!(app.state.sessions.router().state(), RouterState::NoSession));
    assert_eq!(app.session_store.current(), None);
}

#[tokio::test]
async fn test_restore_reactivates_without_credentials() {
    let app = TestApp::new().await;
    app.session_store.set(Some(MIRROR_TENANT));

    let restored = app.state.sessions.restore().await.unwrap().expect("session should be restored");
    assert_eq!(restored.tenant_id(), MIRROR_TENANT);
    assert!(restored.is_live());
    assert_eq!(app.state.sessions.active().await.unwrap().tenant_id(), MIRROR_TENANT);
}

#[tokio::test]
async fn test_restore_with_nothing_persisted() {
    let app = TestApp::new().await;
    assert!(app.state.sessions.restore().await.unwrap().is_none());
    assert_eq!(app.connector.connect_count(), 0);
}

#[tokio::test]
async fn test_restore_clears_unknown_tenant() {
    let app = TestApp::new().await;
    app.session_store.set(Some("acme"));

    assert!(app.state.sessions.restore().await.unwrap().is_none());
    assert_eq!(app.session_store.current(), None);
    assert!(matches!(app.state.sessions.active().await, Err(AppError::NoActiveSession)));
}
