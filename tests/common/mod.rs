#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};
use reqwest::StatusCode;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use videohub_api::config::{AppConfig, Environment};
use videohub_api::database::models::User;
use videohub_api::database::{DatabaseError, DocumentStore, FindOptions, MemoryStore, Repository};
use videohub_api::server::serve;
use videohub_api::AppState;

/// In-process API server on a free port, backed by in-memory stores.
/// Each test gets its own server and its own data.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub users: Repository<User>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(environment: Environment) -> Result<Self> {
        Self::start_with_store(environment, Arc::new(MemoryStore::<User>::new())).await
    }

    pub async fn start_with_store(environment: Environment, store: Arc<dyn DocumentStore<User>>) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;

        let state = AppState::new(AppConfig::for_tests(environment), Arc::clone(&store));
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _ = serve(listener, state, async {
                let _ = rx.await;
            })
            .await;
        });

        let server = Self {
            port,
            base_url,
            users: Repository::new(store),
            shutdown: Some(tx),
            handle,
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Inserts a valid user through the repository and returns the stored record.
    pub async fn seed_user(&self, username: &str, email: &str) -> Result<User> {
        let user = User {
            id: None,
            organization: ObjectId::new(),
            role: ObjectId::new(),
            name: "Test User".to_string(),
            email: email.to_string(),
            username: username.to_string(),
            password: "secret-password".to_string(),
            refresh_token: Some("refresh-token".to_string()),
            created_at: None,
            updated_at: None,
        };
        Ok(self.users.create(user).await?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

/// Store whose every call fails with the given error kind.
pub struct FailingStore {
    pub kind: FailureKind,
}

#[derive(Clone, Copy)]
pub enum FailureKind {
    Query,
    Connection,
    Panic,
}

impl FailingStore {
    pub fn new(kind: FailureKind) -> Arc<dyn DocumentStore<User>> {
        Arc::new(Self { kind })
    }

    fn fail<T>(&self) -> Result<T, DatabaseError> {
        match self.kind {
            FailureKind::Query => Err(DatabaseError::QueryError("cursor exhausted unexpectedly".to_string())),
            FailureKind::Connection => Err(DatabaseError::Connection("no reachable servers".to_string())),
            FailureKind::Panic => panic!("store exploded"),
        }
    }
}

#[async_trait]
impl DocumentStore<User> for FailingStore {
    async fn insert(&self, _record: &User) -> Result<(), DatabaseError> {
        self.fail()
    }

    async fn find_by_id(&self, _id: ObjectId) -> Result<Option<User>, DatabaseError> {
        self.fail()
    }

    async fn find_many(&self, _filter: Document, _options: FindOptions) -> Result<Vec<User>, DatabaseError> {
        self.fail()
    }

    async fn update_by_id(&self, _id: ObjectId, _changes: Document) -> Result<Option<User>, DatabaseError> {
        self.fail()
    }

    async fn delete_by_id(&self, _id: ObjectId) -> Result<Option<User>, DatabaseError> {
        self.fail()
    }

    async fn count(&self, _filter: Document) -> Result<u64, DatabaseError> {
        self.fail()
    }
}
