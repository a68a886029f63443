use std::path::PathBuf;

use operator_accounts::admin::{self, AdminConsole};
use operator_accounts::auth::{CredentialChangeForm, LoginForm, NewAccountForm, PasswordService};
use operator_accounts::config::{AccountsConfig, CorruptStorePolicy, HashingConfig};
use operator_accounts::error::{AccountsError, AuthError, StoreError, ValidationError};
use operator_accounts::storage::{AccountRecord, AccountSet};
use operator_accounts::{AuthService, CredentialStore};
use tempfile::TempDir;

// Helper to build a config pointing at a fresh temporary store with cheap hashing
fn test_config() -> (TempDir, AccountsConfig) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let mut config = AccountsConfig::with_store_path(dir.path().join("users.json"));
    config.hashing = HashingConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    };
    (dir, config)
}

async fn initialized_service() -> (TempDir, AccountsConfig, AuthService) {
    let (dir, config) = test_config();
    let service = AuthService::new(&config).unwrap();
    service.initialize().await.unwrap();
    (dir, config, service)
}

fn store_file(config: &AccountsConfig) -> PathBuf {
    config.store.path.clone()
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let (_dir, config) = test_config();
    let service = AuthService::new(&config).unwrap();

    let first = service.initialize().await.unwrap();
    let on_disk = std::fs::read(store_file(&config)).unwrap();
    let second = service.initialize().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(std::fs::read(store_file(&config)).unwrap(), on_disk);
}

#[tokio::test]
async fn test_fresh_store_scenario() {
    let (_dir, config) = test_config();
    let service = AuthService::new(&config).unwrap();

    let accounts = service.initialize().await.unwrap();
    assert_eq!(accounts.keys().collect::<Vec<_>>(), vec!["admin"]);
    let admin = &accounts["admin"];
    assert!(admin.is_admin);
    assert_eq!(admin.display_name, "Administrador");

    let ok = service.authenticate("admin", "admin123").await.unwrap();
    assert!(ok.login_successful);
    let account = ok.account.unwrap();
    assert_eq!(account.username, "admin");
    assert_eq!(account.credential_hash, admin.credential_hash);

    let bad = service.authenticate("admin", "wrong").await.unwrap();
    assert!(!bad.login_successful);
    assert!(bad.account.is_none());
}

#[tokio::test]
async fn test_persisted_document_layout() {
    let (_dir, config, _service) = initialized_service().await;

    let text = std::fs::read_to_string(store_file(&config)).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let admin = &json["admin"];
    assert_eq!(admin["displayName"], "Administrador");
    assert_eq!(admin["isAdmin"], true);
    let hash = admin["credentialHash"].as_str().unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(!text.contains("admin123"));
}

#[tokio::test]
async fn test_duplicate_username_is_rejected() {
    let (_dir, _config, service) = initialized_service().await;

    service.create_account("a", "first-pw", "First", false).await.unwrap();
    let err = service.create_account("a", "second-pw", "Second", true).await;
    assert!(matches!(err, Err(AuthError::AlreadyExists(name)) if name == "a"));

    let summary = service.list_accounts().await.unwrap();
    let a = summary.iter().find(|s| s.username == "a").unwrap();
    assert_eq!(a.display_name, "First");
    assert!(!a.is_admin);
    assert!(service.authenticate("a", "first-pw").await.unwrap().login_successful);
    assert!(!service.authenticate("a", "second-pw").await.unwrap().login_successful);
}

#[tokio::test]
async fn test_admin_cannot_be_deleted() {
    let (_dir, _config, service) = initialized_service().await;

    for _ in 0..2 {
        assert!(matches!(
            service.delete_account("admin").await,
            Err(AuthError::IsProtected(_))
        ));
    }
    assert!(service.authenticate("admin", "admin123").await.unwrap().login_successful);
}

#[tokio::test]
async fn test_credential_round_trip() {
    let (_dir, _config, service) = initialized_service().await;

    for (user, pw) in [("u1", "pw123"), ("u2", "pässwörd"), ("u3", "  spaced  ")] {
        service.create_account(user, pw, "User", false).await.unwrap();
        assert!(service.authenticate(user, pw).await.unwrap().login_successful);
        assert!(!service.authenticate(user, &format!("{pw}x")).await.unwrap().login_successful);
    }

    // Credentials are compared exactly, surrounding whitespace included
    assert!(!service.authenticate("u3", "spaced").await.unwrap().login_successful);
}

#[tokio::test]
async fn test_change_credential_gate() {
    let (_dir, _config, service) = initialized_service().await;
    service.create_account("bob", "old-pw", "Bob", false).await.unwrap();

    let err = service.change_credential("bob", "not-it", "new-pw").await;
    assert!(matches!(err, Err(AuthError::WrongCredential(_))));
    assert!(service.authenticate("bob", "old-pw").await.unwrap().login_successful);
    assert!(!service.authenticate("bob", "new-pw").await.unwrap().login_successful);

    service.change_credential("bob", "old-pw", "new-pw").await.unwrap();
    assert!(!service.authenticate("bob", "old-pw").await.unwrap().login_successful);
    assert!(service.authenticate("bob", "new-pw").await.unwrap().login_successful);
}

#[tokio::test]
async fn test_deleted_account_cannot_log_in() {
    let (_dir, _config, service) = initialized_service().await;

    service.create_account("bob", "pw123", "Bob", false).await.unwrap();
    service.delete_account("bob").await.unwrap();

    let result = service.authenticate("bob", "pw123").await.unwrap();
    assert!(!result.login_successful);
    assert!(result.account.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_lose_nothing() {
    let (_dir, _config, service) = initialized_service().await;
    const N: usize = 24;

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create_account(&format!("user{i}"), "pw123", "Operator", false)
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let accounts = service.store().load().await.unwrap();
    assert_eq!(accounts.len(), N + 1);
    for i in 0..N {
        assert!(accounts.contains_key(&format!("user{i}")));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_services_on_one_file_lose_nothing() {
    let (_dir, config) = test_config();
    let first = AuthService::new(&config).unwrap();
    let second = AuthService::new(&config).unwrap();
    first.initialize().await.unwrap();
    second.initialize().await.unwrap();
    const N: usize = 40;

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let service = if i % 2 == 0 { first.clone() } else { second.clone() };
            tokio::spawn(async move {
                service
                    .create_account(&format!("op{i}"), "pw123", "Operator", false)
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let accounts = AuthService::new(&config).unwrap().store().load().await.unwrap();
    assert_eq!(accounts.len(), N + 1);
    for i in 0..N {
        assert!(accounts.contains_key(&format!("op{i}")));
    }
}

#[tokio::test]
async fn test_store_survives_restart() {
    let (_dir, config, service) = initialized_service().await;
    service.create_account("carol", "pw1234", "Carol", true).await.unwrap();
    drop(service);

    let reopened = AuthService::new(&config).unwrap();
    reopened.initialize().await.unwrap();
    let result = reopened.authenticate("carol", "pw1234").await.unwrap();
    assert!(result.login_successful);
    assert!(AuthService::is_administrator(result.account.as_ref()));
}

#[tokio::test]
async fn test_corrupt_store_treated_as_empty_then_reseeded() {
    let (_dir, config) = test_config();
    std::fs::write(store_file(&config), "{\"admin\": ").unwrap();
    let service = AuthService::new(&config).unwrap();

    assert!(service.store().load().await.unwrap().is_empty());
    let accounts = service.initialize().await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert!(service.authenticate("admin", "admin123").await.unwrap().login_successful);
}

#[tokio::test]
async fn test_corrupt_store_surfaces_error_when_strict() {
    let (_dir, mut config) = test_config();
    config.store.on_corrupt = CorruptStorePolicy::Fail;
    std::fs::write(store_file(&config), "not json").unwrap();
    let service = AuthService::new(&config).unwrap();

    assert!(matches!(
        service.initialize().await,
        Err(AuthError::Store(StoreError::Corrupt { .. }))
    ));
    assert!(matches!(
        service.authenticate("admin", "admin123").await,
        Err(AuthError::Store(StoreError::Corrupt { .. }))
    ));
    // The damaged file is left for an operator to inspect
    assert_eq!(std::fs::read_to_string(store_file(&config)).unwrap(), "not json");
}

#[tokio::test]
async fn test_legacy_store_is_upgraded_on_login() {
    let (_dir, config) = test_config();
    let legacy = r#"{
  "admin": {
    "password_hash": "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9",
    "nome": "Administrador",
    "is_admin": true
  },
  "bob": {
    "password_hash": "23d47445adfb8991789b459b6ba1b974d727d310aa9d80b7c2875b9430c0ba25",
    "nome": "Bob",
    "is_admin": false
  }
}"#;
    std::fs::write(store_file(&config), legacy).unwrap();
    let service = AuthService::new(&config).unwrap();
    service.initialize().await.unwrap();

    assert!(!service.authenticate("bob", "wrong").await.unwrap().login_successful);
    assert!(service.authenticate("bob", "pw123").await.unwrap().login_successful);

    let accounts = service.store().load().await.unwrap();
    assert!(accounts["bob"].credential_hash.starts_with("$argon2id$"));
    assert_eq!(accounts["bob"].display_name, "Bob");
    // Untouched until its own next login
    assert_eq!(accounts["admin"].credential_hash.len(), 64);
    assert!(service.authenticate("bob", "pw123").await.unwrap().login_successful);
}

#[tokio::test]
async fn test_save_replaces_whole_set() {
    let (_dir, config) = test_config();
    let passwords = PasswordService::new(&config.hashing).unwrap();
    let store = CredentialStore::new(&config);
    store.initialize(&passwords).await.unwrap();

    let mut replacement = AccountSet::new();
    replacement.insert(
        "admin".into(),
        AccountRecord {
            credential_hash: passwords.hash_password("rotated").unwrap(),
            display_name: "Root".into(),
            is_admin: true,
        },
    );
    store.save(&replacement).await.unwrap();

    assert_eq!(store.load().await.unwrap(), replacement);
}

#[tokio::test]
async fn test_admin_console_requires_administrator() {
    let (_dir, config, service) = initialized_service().await;
    service.create_account("bob", "pw123", "Bob", false).await.unwrap();

    let form = LoginForm {
        username: "bob".into(),
        credential: "pw123".into(),
    };
    let session = admin::login(&service, &form).await.unwrap();
    assert!(matches!(
        AdminConsole::open(&service, &session, &config.policy),
        Err(AccountsError::Auth(AuthError::PermissionDenied))
    ));
}

#[tokio::test]
async fn test_admin_console_workflow() {
    let (_dir, config, service) = initialized_service().await;

    let login = LoginForm {
        username: "admin".into(),
        credential: "admin123".into(),
    };
    let session = admin::login(&service, &login).await.unwrap();
    let console = AdminConsole::open(&service, &session, &config.policy).unwrap();
    assert_eq!(console.operator().username(), "admin");

    let mut form = NewAccountForm {
        username: "dave".into(),
        display_name: "Dave".into(),
        credential: "abc".into(),
        confirmation: "abc".into(),
        is_admin: false,
    };
    assert!(matches!(
        console.create_account(&form).await,
        Err(AccountsError::Validation(ValidationError::CredentialTooShort { min: 4 }))
    ));

    form.credential = "abcd".into();
    form.confirmation = "abcd".into();
    let created = console.create_account(&form).await.unwrap();
    assert_eq!(created.username, "dave");
    assert_eq!(console.deletable_accounts().await.unwrap(), vec!["dave"]);

    let change = CredentialChangeForm {
        username: "dave".into(),
        current: "abcd".into(),
        new: "efgh".into(),
        confirmation: "efgh".into(),
    };
    console.change_credential(&change).await.unwrap();
    assert!(service.authenticate("dave", "efgh").await.unwrap().login_successful);

    assert!(matches!(
        console.delete_account("admin").await,
        Err(AccountsError::Auth(AuthError::IsProtected(_)))
    ));
    console.delete_account("dave").await.unwrap();
    assert_eq!(console.list_accounts().await.unwrap().len(), 1);

    session.logout();
}

#[tokio::test]
async fn test_login_form_rejects_blank_fields() {
    let (_dir, _config, service) = initialized_service().await;
    let form = LoginForm {
        username: String::new(),
        credential: "admin123".into(),
    };
    assert!(matches!(
        admin::login(&service, &form).await,
        Err(AccountsError::Validation(ValidationError::MissingField("Username")))
    ));
}
