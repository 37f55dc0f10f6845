//! Shared harness for router-level tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use credential_gate::{
    auth::{Claims, InMemoryRevocationStore, KeyMaterial, RevocationStore, Role, StoreError, SubjectId},
    clock::FixedClock,
    config::UserConfig,
    gateway::{AppState, StaticUserDirectory, create_router},
};
use serde_json::Value;
use tower::ServiceExt;

pub const PRIVATE_PEM: &str = include_str!("../fixtures/private.pem");
pub const PUBLIC_PEM: &str = include_str!("../fixtures/public.pem");
pub const ISSUER: &str = "github.com/gitwub5/go_todo_app";
pub const TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

pub fn keys() -> Arc<KeyMaterial> {
    Arc::new(KeyMaterial::from_pem(PRIVATE_PEM.as_bytes(), PUBLIC_PEM.as_bytes()).unwrap())
}

pub fn users() -> Vec<UserConfig> {
    vec![
        UserConfig {
            id: 7,
            name: "alice".to_string(),
            password: "wonderland".to_string(),
            role: Role::Admin,
        },
        UserConfig {
            id: 8,
            name: "bob".to_string(),
            password: "builder".to_string(),
            role: Role::Standard,
        },
    ]
}

/// In-memory store whose reads and writes can be switched off.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryRevocationStore,
    down: AtomicBool,
    read_only: AtomicBool,
}

impl FlakyStore {
    pub fn go_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    pub fn refuse_writes(&self) {
        self.read_only.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn remove(&self, credential_id: &str) -> bool {
        self.inner.remove(credential_id)
    }
}

#[async_trait::async_trait]
impl RevocationStore for FlakyStore {
    async fn save(&self, credential_id: &str, subject: SubjectId, ttl: Duration) -> Result<(), StoreError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("READONLY replica".to_string()));
        }
        self.inner.save(credential_id, subject, ttl).await
    }

    async fn load(&self, credential_id: &str) -> Result<SubjectId, StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection refused".to_string()));
        }
        self.inner.load(credential_id).await
    }
}

pub struct Harness {
    pub router: Router,
    pub clock: FixedClock,
    pub store: Arc<FlakyStore>,
    pub keys: Arc<KeyMaterial>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = FixedClock::default();
        let store = Arc::new(FlakyStore::default());
        let keys = keys();
        let state = AppState::build(
            Arc::clone(&keys),
            Arc::clone(&store) as Arc<dyn RevocationStore>,
            Arc::new(clock.clone()),
            Arc::new(StaticUserDirectory::from_config(&users()).unwrap()),
            ISSUER,
            TOKEN_TTL,
        );
        let router = create_router(Arc::new(state), Duration::from_secs(5));
        Self {
            router,
            clock,
            store,
            keys,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn login(&self, user_name: &str, password: &str) -> (StatusCode, Value) {
        let body = serde_json::json!({ "user_name": user_name, "password": password });
        let request = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Log in and return the access token, panicking on failure.
    pub async fn token_for(&self, user_name: &str, password: &str) -> String {
        let (status, body) = self.login(user_name, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::get(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub fn claims(&self, token: &str) -> Claims {
        self.keys.verify(token).unwrap()
    }
}
