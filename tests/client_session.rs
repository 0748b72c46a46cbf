//! Client session tests against a live server
//!
//! The server is the production router bound to an ephemeral port, so the
//! client's real HTTP stack is exercised end to end.

use devconnect::api::{build_router, AppState};
use devconnect::client::{
    ApiClient, ClientError, FileTokenStorage, MemoryTokenStorage, RegisterForm, SessionManager,
    SessionState, TokenStorage,
};
use devconnect::config::Config;
use devconnect::db::{create_test_pool, migrations};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let mut config = Config::default();
        config.auth.token_secret = Some("client-test-secret".to_string());
        let state = AppState::new(pool, &config).expect("Failed to build state");
        let app = build_router(state, &config.server.cors_origin);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            handle,
        }
    }

    fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn test_register_persists_token_and_bootstrap_restores_session() {
    let server = TestServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("session.json");

    let mut session = SessionManager::new(server.client(), FileTokenStorage::new(&token_path));
    session
        .register(&RegisterForm::new("Ada", "ada@example.com", "password123").with_bio("Rustacean"))
        .await
        .expect("Registration should succeed");
    assert!(session.is_authenticated());
    let user_id = session.user().unwrap().id;

    // A fresh manager over the same file picks the session back up
    let mut restored = SessionManager::new(server.client(), FileTokenStorage::new(&token_path));
    restored.bootstrap().await;

    match restored.state() {
        SessionState::Authenticated { user, .. } => {
            assert_eq!(user.id, user_id);
            assert_eq!(user.bio, "Rustacean");
        }
        other => panic!("expected authenticated session, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bootstrap_with_rejected_token_clears_storage() {
    let server = TestServer::spawn().await;

    let mut session = SessionManager::new(
        server.client(),
        MemoryTokenStorage::with_token("not.a-valid-token"),
    );
    session.bootstrap().await;

    assert_eq!(session.state(), &SessionState::Unauthenticated);
    assert_eq!(session.storage().load().unwrap(), None);
}

#[tokio::test]
async fn test_bootstrap_with_unreachable_server_clears_storage() {
    let api = ApiClient::new("http://127.0.0.1:1/api").unwrap();
    let mut session = SessionManager::new(api, MemoryTokenStorage::with_token("some-token"));
    session.bootstrap().await;

    assert_eq!(session.state(), &SessionState::Unauthenticated);
    assert_eq!(session.storage().load().unwrap(), None);
}

#[tokio::test]
async fn test_failed_login_reports_server_message_and_keeps_state() {
    let server = TestServer::spawn().await;

    let mut session = SessionManager::new(server.client(), MemoryTokenStorage::new());
    session
        .register(&RegisterForm::new("Ada", "ada@example.com", "password123"))
        .await
        .unwrap();
    let before = session.state().clone();

    let err = session
        .login("ada@example.com", "wrong-password")
        .await
        .expect_err("Login should fail");
    match &err {
        ClientError::Api { status, code, .. } => {
            assert_eq!(*status, 400);
            assert_eq!(code, "INVALID_CREDENTIALS");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.to_string(), "Invalid Credentials");
    assert_eq!(session.state(), &before);
}

#[tokio::test]
async fn test_duplicate_registration_surfaces_conflict() {
    let server = TestServer::spawn().await;

    let mut first = SessionManager::new(server.client(), MemoryTokenStorage::new());
    first
        .register(&RegisterForm::new("Ada", "ada@example.com", "password123"))
        .await
        .unwrap();

    let mut second = SessionManager::new(server.client(), MemoryTokenStorage::new());
    let err = second
        .register(&RegisterForm::new("Ada Again", "ada@example.com", "password123"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some("DUPLICATE_EMAIL"));
    assert_eq!(second.state(), &SessionState::Unauthenticated);
    assert_eq!(second.storage().load().unwrap(), None);
}

#[tokio::test]
async fn test_logout_clears_file_storage() {
    let server = TestServer::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let storage = FileTokenStorage::new(dir.path().join("session.json"));

    let mut session = SessionManager::new(server.client(), storage);
    session
        .register(&RegisterForm::new("Ada", "ada@example.com", "password123"))
        .await
        .unwrap();
    assert!(session.storage().load().unwrap().is_some());

    session.logout();
    assert_eq!(session.state(), &SessionState::Unauthenticated);
    assert_eq!(session.storage().load().unwrap(), None);
}

#[tokio::test]
async fn test_session_token_drives_feed_calls() {
    let server = TestServer::spawn().await;

    let mut ada = SessionManager::new(server.client(), MemoryTokenStorage::new());
    ada.register(&RegisterForm::new("Ada", "ada@example.com", "password123"))
        .await
        .unwrap();
    let mut grace = SessionManager::new(server.client(), MemoryTokenStorage::new());
    grace
        .register(&RegisterForm::new("Grace", "grace@example.com", "password123"))
        .await
        .unwrap();

    let ada_token = ada.token().unwrap().to_string();
    let grace_token = grace.token().unwrap().to_string();

    ada.api().create_post(&ada_token, "first").await.unwrap();
    grace.api().create_post(&grace_token, "second").await.unwrap();

    let feed = ada.api().list_posts(&ada_token).await.unwrap();
    let contents: Vec<&str> = feed.iter().map(|p| p.post.content.as_str()).collect();
    assert_eq!(contents, vec!["second", "first"]);

    let grace_id = grace.user().unwrap().id;
    let grace_posts = ada.api().list_posts_by_user(&ada_token, grace_id).await.unwrap();
    assert_eq!(grace_posts.len(), 1);

    let profile = ada.api().get_user(&ada_token, grace_id).await.unwrap();
    assert_eq!(profile.name, "Grace");

    let err = ada.api().create_post(&ada_token, "   ").await.unwrap_err();
    assert_eq!(err.code(), Some("VALIDATION_ERROR"));

    let suggestion = ada.api().suggest_post(&ada_token, "draft").await.unwrap();
    assert!(!suggestion.is_empty());
}
