//! SurrealDB connection configuration
//!
//! Resolves where the audit store lives and opens a connection to it.
//! Supports in-memory, local (SurrealKV), plain URL and cloud (WebSocket)
//! connections.

use std::path::PathBuf;

use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::info;

use crate::error::StateError;
use crate::migrations;
use crate::Result;

const DEFAULT_NAMESPACE: &str = "imagegen";
const DEFAULT_DATABASE: &str = "audit";
const DEFAULT_LOCAL_PATH: &str = ".imagegen/db";

/// Configuration for SurrealDB Cloud connection
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// WebSocket endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud")
    pub endpoint: String,
    /// Database username
    pub username: String,
    /// Database password
    pub password: String,
    /// Namespace (default: "imagegen")
    pub namespace: String,
    /// Database name (default: "audit")
    pub database: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

impl CloudConfig {
    /// Create a new cloud configuration for a database user
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            is_root: false,
        }
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Set whether this is a root user
    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - SURREALDB_ENDPOINT (required)
    /// - SURREALDB_USERNAME (required)
    /// - SURREALDB_PASSWORD (required)
    /// - SURREALDB_NAMESPACE (optional, default: "imagegen")
    /// - SURREALDB_DATABASE (optional, default: "audit")
    /// - SURREALDB_ROOT (optional, default: "false") - set to "true" for root users
    pub fn from_env() -> std::result::Result<Self, String> {
        let endpoint =
            std::env::var("SURREALDB_ENDPOINT").map_err(|_| "SURREALDB_ENDPOINT not set")?;
        let username =
            std::env::var("SURREALDB_USERNAME").map_err(|_| "SURREALDB_USERNAME not set")?;
        let password =
            std::env::var("SURREALDB_PASSWORD").map_err(|_| "SURREALDB_PASSWORD not set")?;
        let namespace =
            std::env::var("SURREALDB_NAMESPACE").unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
        let database =
            std::env::var("SURREALDB_DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let is_root = std::env::var("SURREALDB_ROOT")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            username,
            password,
            namespace,
            database,
            is_root,
        })
    }
}

/// Where the audit store lives.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    /// Volatile `mem://` database
    Memory,
    /// Authenticated cloud connection
    Cloud(CloudConfig),
    /// Any URL understood by `surrealdb::engine::any` (no auth)
    Url(String),
    /// On-disk SurrealKV directory
    Local(PathBuf),
}

impl StoreConfig {
    /// Resolve from the environment.
    ///
    /// Order: cloud credentials, then `SURREALDB_URL`, then local
    /// persistence in `.imagegen/db`.
    pub fn from_env() -> Self {
        if let Ok(config) = CloudConfig::from_env() {
            return StoreConfig::Cloud(config);
        }
        if let Ok(url) = std::env::var("SURREALDB_URL") {
            return StoreConfig::Url(url);
        }
        StoreConfig::Local(PathBuf::from(DEFAULT_LOCAL_PATH))
    }

    /// Open a connection, select namespace/database and initialize the schema.
    pub async fn connect(&self) -> Result<Surreal<Any>> {
        let (db, namespace, database) = match self {
            StoreConfig::Memory => (open("mem://").await?, DEFAULT_NAMESPACE, DEFAULT_DATABASE),
            StoreConfig::Url(url) => (open(url).await?, DEFAULT_NAMESPACE, DEFAULT_DATABASE),
            StoreConfig::Local(path) => {
                std::fs::create_dir_all(path).map_err(|e| {
                    StateError::Connection(format!(
                        "Failed to create database directory {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let url = format!("surrealkv://{}", path.display());
                (open(&url).await?, DEFAULT_NAMESPACE, DEFAULT_DATABASE)
            }
            StoreConfig::Cloud(config) => {
                let db = open(&config.endpoint).await?;
                if config.is_root {
                    db.signin(Root {
                        username: &config.username,
                        password: &config.password,
                    })
                    .await
                    .map_err(|e| StateError::Connection(format!("Root auth failed: {e}")))?;
                } else {
                    db.signin(Database {
                        namespace: &config.namespace,
                        database: &config.database,
                        username: &config.username,
                        password: &config.password,
                    })
                    .await
                    .map_err(|e| StateError::Connection(format!("DB auth failed: {e}")))?;
                }
                (db, config.namespace.as_str(), config.database.as_str())
            }
        };

        db.use_ns(namespace)
            .use_db(database)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        info!(store = %self.describe(), "Audit store connected");
        Ok(db)
    }

    /// Short description for logs; never includes credentials.
    pub fn describe(&self) -> String {
        match self {
            StoreConfig::Memory => "mem://".to_string(),
            StoreConfig::Cloud(c) => format!("cloud {} ({}/{})", c.endpoint, c.namespace, c.database),
            StoreConfig::Url(url) => url.clone(),
            StoreConfig::Local(path) => format!("surrealkv://{}", path.display()),
        }
    }
}

async fn open(url: &str) -> Result<Surreal<Any>> {
    surrealdb::engine::any::connect(url)
        .await
        .map_err(|e| StateError::Connection(format!("Failed to connect to {}: {}", url, e)))
}
