use keepalley::{
    repositories::SqliteUserRepository,
    services::{
        auth_service::{AuthService, AuthServiceError, LoginRequest},
        user_service::{RegisterRequest, UserService, UserServiceError},
    },
    test_utils::test_helpers,
};
use std::sync::Arc;

fn request(username: &str, email: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: "password123".to_string(),
        password_confirm: Some("password123".to_string()),
        neighborhood: Some("Lakewood".to_string()),
    }
}

#[tokio::test]
async fn test_register_and_authenticate() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let user_service = UserService::new(repository.clone());
    let auth_service = AuthService::new(repository);

    let user = user_service
        .register(request("alice", "alice@example.com"))
        .await
        .unwrap();
    assert!(!user.is_admin);
    assert_ne!(user.password_hash, "password123");

    let authenticated = auth_service
        .authenticate(LoginRequest {
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(authenticated.id, user.id);

    let wrong = auth_service
        .authenticate(LoginRequest {
            email: "alice@example.com".to_string(),
            password: "wrong-password".to_string(),
        })
        .await;
    assert!(matches!(wrong, Err(AuthServiceError::InvalidCredentials)));
}

#[tokio::test]
async fn test_duplicate_username_creates_no_row() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let user_service = UserService::new(Arc::new(SqliteUserRepository::new(pool.clone())));

    user_service
        .register(request("alice", "alice@example.com"))
        .await
        .unwrap();

    let result = user_service
        .register(request("alice", "other@example.com"))
        .await;

    match result {
        Err(UserServiceError::Invalid(errors)) => {
            assert!(errors.has("username"));
            assert!(!errors.has("email"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(test_helpers::count_rows(&pool, "users").await.unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_email_is_case_insensitive() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let user_service = UserService::new(Arc::new(SqliteUserRepository::new(pool.clone())));

    user_service
        .register(request("alice", "alice@example.com"))
        .await
        .unwrap();

    let result = user_service
        .register(request("bob", "Alice@Example.com"))
        .await;

    match result {
        Err(UserServiceError::Invalid(errors)) => assert!(errors.has("email")),
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(test_helpers::count_rows(&pool, "users").await.unwrap(), 1);
}

#[tokio::test]
async fn test_both_conflicts_reported_username_first() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let user_service = UserService::new(Arc::new(SqliteUserRepository::new(pool.clone())));

    user_service
        .register(request("alice", "alice@example.com"))
        .await
        .unwrap();

    match user_service
        .register(request("alice", "alice@example.com"))
        .await
    {
        Err(UserServiceError::Invalid(errors)) => {
            let fields: Vec<_> = errors.errors().iter().map(|e| e.field).collect();
            assert_eq!(fields, vec!["username", "email"]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_admin_flag_set_out_of_band() {
    let pool = test_helpers::create_test_db().await.unwrap();
    let user_service = UserService::new(Arc::new(SqliteUserRepository::new(pool.clone())));

    user_service
        .register(request("alice", "alice@example.com"))
        .await
        .unwrap();

    let promoted = user_service.set_admin("alice@example.com", true).await.unwrap();
    assert!(promoted.is_admin);

    let reloaded = user_service
        .find_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.is_admin);
}
