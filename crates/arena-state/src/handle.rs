//! SurrealDB connection handle
//!
//! Resolves a connection from the environment, selects the Arena namespace
//! and runs schema initialization. Stores are built from the handle.

use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::info;

use crate::error::StateError;
use crate::migrations;
use crate::surreal_store::{SurrealAgentStore, SurrealScenarioArchive};
use crate::Result;

const DEFAULT_NAMESPACE: &str = "arena";
const DEFAULT_DATABASE: &str = "main";
const LOCAL_DB_PATH: &str = ".arena/db";

/// Credentials for a remote, authenticated SurrealDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    /// `wss://` or `ws://` endpoint.
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
    /// Sign in as root instead of a database user.
    pub is_root: bool,
}

impl CloudConfig {
    /// Read `SURREALDB_ENDPOINT`, `SURREALDB_USERNAME` and `SURREALDB_PASSWORD`
    /// (all required) plus optional `SURREALDB_NAMESPACE` (`arena`),
    /// `SURREALDB_DATABASE` (`main`) and `SURREALDB_ROOT`.
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<Self, String> {
        let required = |key: &str| lookup(key).ok_or_else(|| format!("{key} not set"));

        Ok(Self {
            endpoint: required("SURREALDB_ENDPOINT")?,
            username: required("SURREALDB_USERNAME")?,
            password: required("SURREALDB_PASSWORD")?,
            namespace: lookup("SURREALDB_NAMESPACE")
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
            database: lookup("SURREALDB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            is_root: lookup("SURREALDB_ROOT").is_some_and(|v| v.eq_ignore_ascii_case("true")),
        })
    }
}

/// Connected, schema-initialized SurrealDB handle
#[derive(Clone)]
pub struct SurrealHandle {
    db: Surreal<Any>,
}

impl SurrealHandle {
    /// Connect to `mem://`. Data lives as long as the handle.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("mem://").await
    }

    /// Connect to any URL the `any` engine accepts (`mem://`,
    /// `surrealkv://path`, `ws://host`).
    pub async fn connect(url: &str) -> Result<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StateError::Connection(format!("Failed to connect to {url}: {e}")))?;
        Self::select(db, DEFAULT_NAMESPACE, DEFAULT_DATABASE).await
    }

    /// Connect with credentials.
    pub async fn connect_cloud(config: &CloudConfig) -> Result<Self> {
        let db = surrealdb::engine::any::connect(&config.endpoint)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

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

        Self::select(db, &config.namespace, &config.database).await
    }

    /// Resolve a connection from the environment.
    ///
    /// Order: cloud credentials, then `SURREALDB_URL`, then a local
    /// SurrealKV database under `.arena/db`.
    pub async fn setup_from_env() -> Result<Self> {
        if let Ok(config) = CloudConfig::from_env() {
            info!(endpoint = %config.endpoint, "connecting to SurrealDB (cloud)");
            return Self::connect_cloud(&config).await;
        }

        if let Ok(url) = std::env::var("SURREALDB_URL") {
            info!(url = %url, "connecting to SurrealDB");
            return Self::connect(&url).await;
        }

        std::fs::create_dir_all(LOCAL_DB_PATH).map_err(|e| {
            StateError::Connection(format!(
                "Failed to create database directory {LOCAL_DB_PATH}: {e}"
            ))
        })?;
        let url = format!("surrealkv://{LOCAL_DB_PATH}");
        info!(url = %url, "no SurrealDB config found, using local persistence");
        Self::connect(&url).await
    }

    async fn select(db: Surreal<Any>, namespace: &str, database: &str) -> Result<Self> {
        db.use_ns(namespace)
            .use_db(database)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db)
            .await
            .map_err(|e| StateError::SchemaSetup(e.to_string()))?;
        Ok(Self { db })
    }

    pub fn agent_store(&self) -> SurrealAgentStore {
        SurrealAgentStore::new(self.db.clone())
    }

    pub fn scenario_archive(&self) -> SurrealScenarioArchive {
        SurrealScenarioArchive::new(self.db.clone())
    }
}
