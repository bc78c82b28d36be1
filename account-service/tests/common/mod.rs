use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use account_service::config::RateLimitConfig;
use account_service::domain::authentication::models::AuthPolicy;
use account_service::domain::authentication::service::AuthService;
use account_service::domain::user::models::EmailAddress;
use account_service::domain::user::models::Projection;
use account_service::domain::user::models::Role;
use account_service::domain::user::models::User;
use account_service::domain::user::models::UserId;
use account_service::domain::user::models::UserMeta;
use account_service::domain::user::ports::UserRepository;
use account_service::domain::user::service::UserService;
use account_service::inbound::http::router::create_router;
use account_service::inbound::http::router::AppState;
use account_service::outbound::cache::InMemoryRefreshTokenStore;
use account_service::user::errors::UserError;
use async_trait::async_trait;
use auth::PasswordHasher;
use auth::TokenCodec;
use auth::TokenSettings;
use parking_lot::Mutex;
use serde_json::Value;

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub repository: Arc<InMemoryUserRepository>,
    pub refresh_tokens: Arc<InMemoryRefreshTokenStore>,
}

impl TestApp {
    /// Spawn the application with limits high enough to never trigger
    pub async fn spawn() -> Self {
        Self::spawn_with(RateLimitConfig {
            window_secs: 60,
            login_max_requests: 1_000,
            refresh_max_requests: 1_000,
        })
        .await
    }

    /// Spawn the application in a background task and return TestApp
    pub async fn spawn_with(rate_limit: RateLimitConfig) -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let repository = Arc::new(InMemoryUserRepository::default());
        let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new());
        let password_hasher = PasswordHasher::with_cost(1024, 1, 1).expect("Invalid hasher cost");
        let codec = Arc::new(TokenCodec::new(
            &TokenSettings {
                secret: "test-access-secret-for-jwt-signing-at-least-32-bytes".to_string(),
                expires_in_secs: 86_400,
            },
            &TokenSettings {
                secret: "test-refresh-secret-for-jwt-signing-at-least-32-bytes".to_string(),
                expires_in_secs: 604_800,
            },
        )
        .expect("Invalid token settings"));

        let user_service = Arc::new(UserService::new(
            Arc::clone(&repository),
            password_hasher.clone(),
        ));
        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&repository),
            Arc::clone(&refresh_tokens),
            codec,
            password_hasher,
            AuthPolicy::default(),
        ));

        let router = create_router(AppState::new(user_service, auth_service, &rate_limit));

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            repository,
            refresh_tokens,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register a user and return the response body
    pub async fn register(&self, email: &str, password: &str, email_verified: bool) -> Value {
        let response = self
            .post("/api/users")
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "firstName": "Test",
                "lastName": "User",
                "emailVerified": email_verified,
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }

    /// Login and return the response body
    pub async fn login(&self, email: &str, password: &str) -> Value {
        let response = self
            .post("/api/auth")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Failed to parse response")
    }
}

/// Test-only user store standing in for PostgreSQL
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn set_roles(&self, id: &str, roles: Vec<Role>) {
        self.modify(id, |user| user.roles = roles);
    }

    pub fn set_active(&self, id: &str, active: bool) {
        self.modify(id, |user| user.active = active);
    }

    pub fn set_auth_errors(&self, id: &str, auth_errors: u32) {
        self.modify(id, |user| {
            user.meta.get_or_insert_with(UserMeta::default).auth_errors = auth_errors
        });
    }

    pub fn auth_errors(&self, id: &str) -> u32 {
        let id = UserId::from_string(id).expect("Invalid user id");
        self.users
            .lock()
            .get(&id)
            .map(|user| user.auth_errors())
            .expect("Unknown user")
    }

    fn modify(&self, id: &str, f: impl FnOnce(&mut User)) {
        let id = UserId::from_string(id).expect("Invalid user id");
        let mut users = self.users.lock();
        f(users.get_mut(&id).expect("Unknown user"));
    }
}

fn project(user: &User, projection: Projection) -> User {
    let mut user = user.clone();
    if projection == Projection::Slim {
        user.password_hash = None;
        user.meta = None;
    }
    user
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock();
        if users.values().any(|existing| existing.email == user.email) {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(
        &self,
        id: &UserId,
        projection: Projection,
    ) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .lock()
            .get(id)
            .map(|user| project(user, projection)))
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
        projection: Projection,
    ) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .lock()
            .values()
            .find(|user| user.email == *email)
            .map(|user| project(user, projection)))
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        Ok(self
            .users
            .lock()
            .values()
            .map(|user| project(user, Projection::Slim))
            .collect())
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock();
        let stored = users
            .get_mut(&user.id)
            .ok_or(UserError::NotFound(user.id.to_string()))?;

        let password_hash = user.password_hash.clone().or(stored.password_hash.take());
        let meta = user.meta.clone().or(stored.meta.take());
        *stored = User {
            password_hash,
            meta,
            ..user
        };
        Ok(stored.clone())
    }

    async fn record_auth_failure(&self, id: &UserId) -> Result<u32, UserError> {
        let mut users = self.users.lock();
        let user = users
            .get_mut(id)
            .ok_or(UserError::NotFound(id.to_string()))?;
        let meta = user.meta.get_or_insert_with(UserMeta::default);
        meta.auth_errors += 1;
        Ok(meta.auth_errors)
    }

    async fn clear_auth_failures(&self, id: &UserId) -> Result<(), UserError> {
        if let Some(meta) = self
            .users
            .lock()
            .get_mut(id)
            .and_then(|user| user.meta.as_mut())
        {
            meta.auth_errors = 0;
        }
        Ok(())
    }
}
