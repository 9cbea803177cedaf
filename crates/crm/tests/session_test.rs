use std::sync::Arc;

use crm::lifecycle::CrmSystem;
use crm::model::{EmployeeUpdate, Role};
use crm::session::{FileTokenStore, TokenStore};
use crm::testing::{self, PlainTextHasher, TestCrm, ADMIN_NUMBER, TEST_PASSWORD};
use crm::ErrorKind;
use entity_store::DatabaseConfig;
use secrecy::SecretString;

fn wrong() -> SecretString {
    SecretString::from("Wrong-Passw0rd!")
}

#[test]
fn test_unknown_user_and_bad_password_look_the_same() {
    let crm = TestCrm::new().unwrap();
    let sessions = &crm.system.sessions;

    let unknown = sessions.login("NOBODY", &wrong()).unwrap_err();
    let bad = sessions.login(ADMIN_NUMBER, &wrong()).unwrap_err();
    assert_eq!(unknown.kind(), ErrorKind::Unauthenticated);
    assert_eq!(unknown.to_string(), bad.to_string());
}

#[test]
fn test_account_locks_after_repeated_failures() {
    let crm = TestCrm::new().unwrap();
    crm.hire("EMP001", Role::Sales).unwrap();
    let sessions = &crm.system.sessions;

    for _ in 0..4 {
        let err = sessions.login("EMP001", &wrong()).unwrap_err();
        assert!(!err.to_string().contains("locked"));
    }
    let err = sessions.login("EMP001", &wrong()).unwrap_err();
    assert!(err.to_string().contains("locked"), "got: {err}");

    // Even the right password is refused while locked
    let err = sessions
        .login("EMP001", &SecretString::from(TEST_PASSWORD))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
    assert!(err.to_string().contains("locked"));

    let employee = crm
        .system
        .employees
        .find_by_number(&crm.admin, "EMP001")
        .unwrap()
        .expect("employee exists");
    assert_eq!(employee.failed_attempts, 5);
    assert!(employee.locked_until.is_some());
}

#[test]
fn test_successful_login_resets_failure_count() {
    let crm = TestCrm::new().unwrap();
    crm.hire("EMP001", Role::Sales).unwrap();
    let sessions = &crm.system.sessions;

    for _ in 0..3 {
        sessions.login("EMP001", &wrong()).unwrap_err();
    }
    crm.login_as("EMP001").unwrap();

    let employee = crm
        .system
        .employees
        .find_by_number(&crm.admin, "EMP001")
        .unwrap()
        .unwrap();
    assert_eq!(employee.failed_attempts, 0);
    assert_eq!(employee.locked_until, None);
}

#[test]
fn test_logout_ends_the_session() {
    let crm = TestCrm::new().unwrap();
    assert!(crm.system.current_principal().is_ok());

    crm.system.sessions.logout().unwrap();
    let err = crm.system.current_principal().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

#[test]
fn test_session_survives_restart_through_token_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = testing::test_config();
    config.database = DatabaseConfig {
        path: dir.path().join("crm.db"),
        ..DatabaseConfig::default()
    };
    config.session.token_path = dir.path().join("token");

    let open = || {
        CrmSystem::new(
            &config,
            Arc::new(PlainTextHasher),
            Box::new(FileTokenStore::new(config.session.token_path.clone())),
        )
        .expect("Failed to open CRM")
    };

    let principal = {
        let system = open();
        system
            .employees
            .bootstrap_admin(testing::employee(ADMIN_NUMBER, Role::Admin))
            .unwrap();
        let (principal, token) = system
            .sessions
            .login(ADMIN_NUMBER, &SecretString::from(TEST_PASSWORD))
            .unwrap();
        let stored = FileTokenStore::new(&config.session.token_path).load().unwrap();
        assert_eq!(stored.as_deref(), Some(token.as_str()));
        principal
    };

    let system = open();
    assert_eq!(system.current_principal().unwrap(), principal);

    system.sessions.logout().unwrap();
    assert!(!config.session.token_path.exists());
    assert!(system.current_principal().is_err());
}

#[test]
fn test_token_from_another_secret_is_rejected() {
    let crm = TestCrm::new().unwrap();
    let mut config = testing::test_config();
    config.session.secret = SecretString::from("some-other-secret");
    let other = CrmSystem::new(
        &config,
        Arc::new(PlainTextHasher),
        Box::new(crm::session::MemoryTokenStore::default()),
    )
    .unwrap();

    let token = crm.system.sessions.issue(&crm.admin).unwrap();
    let err = other.sessions.resolve(token.as_str()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

#[test]
fn test_removed_admin_loses_their_session() {
    let crm = TestCrm::new().unwrap();
    let second = crm.hire("ADM002", Role::Admin).unwrap();
    crm.login_as("ADM002").unwrap();
    assert!(crm.system.current_principal().is_ok());

    crm.system.employees.delete(&crm.admin, second.id).unwrap();

    let err = crm.system.current_principal().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}

#[test]
fn test_demoted_admin_acts_with_their_new_role() {
    let crm = TestCrm::new().unwrap();
    let second = crm.hire("ADM002", Role::Admin).unwrap();
    crm.login_as("ADM002").unwrap();

    crm.system
        .employees
        .update(
            &crm.admin,
            second.id,
            EmployeeUpdate {
                role: Some(Role::Support),
                ..EmployeeUpdate::default()
            },
        )
        .unwrap();

    let principal = crm.system.current_principal().unwrap();
    assert_eq!(principal.role(), Role::Support);
    let err = crm
        .system
        .employees
        .create(&principal, testing::employee("EMP999", Role::Sales))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}
