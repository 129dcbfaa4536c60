//! Integration tests for the authentication service.

use std::collections::HashSet;
use std::sync::Arc;

use nexus_auth::config::{AuthConfig, HashParams};
use nexus_auth::error::AuthError;
use nexus_auth::password;
use nexus_auth::service::{AuthService, LoginInput, RegisterInput};
use nexus_core::repository::UserRepository;
use nexus_db::repository::{SurrealSessionRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

type Service = AuthService<SurrealUserRepository<Db>, SurrealSessionRepository<Db>>;

fn test_config() -> AuthConfig {
    AuthConfig {
        password_hash: HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        ..AuthConfig::default()
    }
}

/// Spin up in-memory DB, run migrations, and wire the service.
async fn setup_with(config: AuthConfig) -> (Service, SurrealUserRepository<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    nexus_db::run_migrations(&db).await.unwrap();

    let user_repo = SurrealUserRepository::new(db.clone());
    let session_repo = SurrealSessionRepository::new(db);
    (
        AuthService::new(user_repo.clone(), session_repo, config),
        user_repo,
    )
}

async fn setup() -> (Service, SurrealUserRepository<Db>) {
    setup_with(test_config()).await
}

fn register(username: &str, password: &str) -> RegisterInput {
    RegisterInput {
        username: username.into(),
        password: password.into(),
    }
}

fn login(username: &str, password: &str) -> LoginInput {
    LoginInput {
        username: username.into(),
        password: password.into(),
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

#[tokio::test]
async fn register_stores_a_verifiable_hash() {
    let (svc, users) = setup().await;

    let id = svc.register(register("alice", "secret123")).await.unwrap();

    let user = users.get_by_username("alice").await.unwrap();
    assert_eq!(user.id, id);
    assert_ne!(user.password_hash, "secret123");
    assert!(password::verify_password("secret123", &user.password_hash, None));
    assert!(user.last_seen.is_some());
}

#[tokio::test]
async fn register_duplicate_username() {
    let (svc, users) = setup().await;
    let first = svc.register(register("alice", "secret123")).await.unwrap();

    let err = svc
        .register(register("alice", "other-password"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DuplicateUsername), "got: {err:?}");

    // The first record still verifies against the original password.
    let user = users.get_by_username("alice").await.unwrap();
    assert_eq!(user.id, first);
    assert!(password::verify_password("secret123", &user.password_hash, None));
}

#[tokio::test]
async fn register_rejects_empty_and_oversized_input() {
    let (svc, users) = setup().await;

    for (username, password) in [("", "secret123"), ("alice", ""), ("", "")] {
        let err = svc.register(register(username, password)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)), "got: {err:?}");
    }

    let long_name = "a".repeat(256);
    let err = svc
        .register(register(&long_name, "secret123"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidInput(_)));

    let long_password = "p".repeat(1025);
    let err = svc
        .register(register("alice", &long_password))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidInput(_)));

    // Nothing was persisted.
    assert!(users.get_by_username("alice").await.is_err());
}

#[tokio::test]
async fn login_happy_path() {
    let (svc, _) = setup().await;
    let user_id = svc.register(register("alice", "secret123")).await.unwrap();

    let out = svc.login(login("alice", "secret123")).await.unwrap();

    assert_eq!(out.token.len(), 64);
    assert!(is_lower_hex(&out.token));
    assert_eq!(out.expires_in, 86_400);
    assert_eq!(out.user_id, user_id);
}

#[tokio::test]
async fn wrong_password_and_unknown_user_are_indistinguishable() {
    let (svc, _) = setup().await;
    svc.register(register("alice", "secret123")).await.unwrap();

    let wrong = svc.login(login("alice", "wrong")).await.unwrap_err();
    let unknown = svc.login(login("bob", "x")).await.unwrap_err();

    assert!(matches!(wrong, AuthError::InvalidCredentials));
    assert!(matches!(unknown, AuthError::InvalidCredentials));
    assert_eq!(wrong.to_string(), unknown.to_string());
}

#[tokio::test]
async fn login_rejects_empty_input() {
    let (svc, _) = setup().await;

    let err = svc.login(login("", "secret123")).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidInput(_)));

    let err = svc.login(login("alice", "")).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidInput(_)));
}

#[tokio::test]
async fn each_login_issues_a_distinct_session() {
    let (svc, _) = setup().await;
    svc.register(register("alice", "secret123")).await.unwrap();

    let a = svc.login(login("alice", "secret123")).await.unwrap();
    let b = svc.login(login("alice", "secret123")).await.unwrap();

    assert_ne!(a.token, b.token);
    assert_ne!(a.session_id, b.session_id);
}

#[tokio::test]
async fn pepper_must_match_between_register_and_login() {
    let config = AuthConfig {
        pepper: Some("server-pepper".into()),
        ..test_config()
    };
    let (svc, users) = setup_with(config).await;
    svc.register(register("alice", "secret123")).await.unwrap();

    let user = users.get_by_username("alice").await.unwrap();
    assert!(!password::verify_password("secret123", &user.password_hash, None));
    assert!(svc.login(login("alice", "secret123")).await.is_ok());
}

#[tokio::test]
async fn validate_session_returns_owner() {
    let (svc, users) = setup().await;
    let user_id = svc.register(register("alice", "secret123")).await.unwrap();
    let before = users.get_by_id(user_id).await.unwrap().last_seen;

    let out = svc.login(login("alice", "secret123")).await.unwrap();
    let session = svc.validate_session(&out.token).await.unwrap();

    assert_eq!(session.session_id, out.session_id);
    assert_eq!(session.user_id, user_id);
    assert!(session.expires_in(chrono::Utc::now()) <= 86_400);

    let after = users.get_by_id(user_id).await.unwrap().last_seen;
    assert!(after >= before);
}

#[tokio::test]
async fn validate_unknown_or_empty_token() {
    let (svc, _) = setup().await;

    let err = svc.validate_session("").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidSession));

    let err = svc.validate_session(&"0".repeat(64)).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidSession));
}

#[tokio::test]
async fn expired_session_is_invalid() {
    let config = AuthConfig {
        session_ttl_secs: 0,
        ..test_config()
    };
    let (svc, _) = setup_with(config).await;
    svc.register(register("alice", "secret123")).await.unwrap();

    let out = svc.login(login("alice", "secret123")).await.unwrap();
    assert_eq!(out.expires_in, 0);

    let err = svc.validate_session(&out.token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidSession));
}

#[tokio::test]
async fn logout_revokes_and_is_idempotent() {
    let (svc, _) = setup().await;
    svc.register(register("alice", "secret123")).await.unwrap();
    let out = svc.login(login("alice", "secret123")).await.unwrap();

    svc.logout(&out.token).await.unwrap();
    let err = svc.validate_session(&out.token).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidSession));

    // Second logout is a no-op success.
    svc.logout(&out.token).await.unwrap();
}

#[tokio::test]
async fn logout_leaves_other_sessions_alive() {
    let (svc, _) = setup().await;
    svc.register(register("alice", "secret123")).await.unwrap();
    let a = svc.login(login("alice", "secret123")).await.unwrap();
    let b = svc.login(login("alice", "secret123")).await.unwrap();

    svc.logout(&a.token).await.unwrap();

    assert!(svc.validate_session(&b.token).await.is_ok());
}

#[tokio::test]
async fn logout_unknown_token() {
    let (svc, _) = setup().await;

    let err = svc.logout("no-such-token").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidSession));

    let err = svc.logout("").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidSession));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_of_one_username() {
    let (svc, users) = setup().await;
    let svc = Arc::new(svc);

    let mut handles = Vec::new();
    for i in 0..16 {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            svc.register(register("alice", &format!("secret{i}"))).await
        }));
    }

    let mut winners = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(id) => winners.push(id),
            Err(AuthError::DuplicateUsername) => {}
            Err(other) => panic!("expected DuplicateUsername, got {other:?}"),
        }
    }
    assert_eq!(winners.len(), 1);
    assert_eq!(users.get_by_username("alice").await.unwrap().id, winners[0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_logins_issue_distinct_live_sessions() {
    let (svc, _) = setup().await;
    let user_id = svc.register(register("alice", "secret123")).await.unwrap();
    let svc = Arc::new(svc);

    let mut handles = Vec::new();
    for _ in 0..32 {
        let svc = Arc::clone(&svc);
        handles.push(tokio::spawn(async move {
            svc.login(login("alice", "secret123")).await
        }));
    }

    let mut tokens = HashSet::new();
    for handle in handles {
        let out = handle.await.unwrap().unwrap();
        assert_eq!(out.user_id, user_id);
        assert!(tokens.insert(out.token));
    }
    assert_eq!(tokens.len(), 32);

    for token in &tokens {
        let session = svc.validate_session(token).await.unwrap();
        assert_eq!(session.user_id, user_id);
    }
}
