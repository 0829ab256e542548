use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;
use crate::packaging::PackagingConfig;
use crate::quota::QuotaConfig;
use crate::sweeper::SweeperConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    #[serde(default)]
    pub packaging: PackagingConfig,
    #[serde(default)]
    pub sweeper: SweeperConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Static bearer tokens, each mapping to a user id (required when
    /// method = "token")
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    Token,
    // Future: Jwt (verify upstream identity provider tokens directly)
}

/// One configured bearer token and the user it authenticates as.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenEntry {
    pub token: String,
    pub user_id: String,
}

/// Database configuration (quota ledger + session registry)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("stemsplit.db")
}

/// Session filesystem layout configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionsConfig {
    /// Base directory holding `sessions/` and `uploads/`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl SessionsConfig {
    /// Root directory for per-session output directories.
    pub fn sessions_root(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    /// Root directory for transient per-session upload directories.
    pub fn uploads_root(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

/// Remote separation worker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// Worker base URL (e.g., "http://localhost:8100")
    #[serde(default)]
    pub url: String,
    /// Optional bearer token sent with every worker request
    #[serde(default)]
    pub api_token: Option<String>,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_worker_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_token: None,
            request_timeout_secs: default_worker_timeout(),
        }
    }
}

fn default_worker_timeout() -> u64 {
    30
}

/// Remote object storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Storage service base URL (e.g., "https://xyz.supabase.co")
    pub url: String,
    /// Service-role key used for list/remove operations
    pub service_key: String,
    /// Bucket holding per-session stem objects (default: "stems")
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

fn default_bucket() -> String {
    "stems".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub sessions: SessionsConfig,
    pub worker: SanitizedWorkerConfig,
    pub orchestrator: OrchestratorConfig,
    pub quota: QuotaConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<SanitizedStorageConfig>,
    pub packaging: PackagingConfig,
    pub sweeper: SweeperConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub token_count: usize,
}

/// Sanitized worker config (API token redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedWorkerConfig {
    pub url: String,
    pub api_token_configured: bool,
    pub request_timeout_secs: u64,
}

/// Sanitized storage config (service key redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub url: String,
    pub bucket: String,
    pub service_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::Token => "token".to_string(),
                },
                token_count: config.auth.tokens.len(),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            sessions: config.sessions.clone(),
            worker: SanitizedWorkerConfig {
                url: config.worker.url.clone(),
                api_token_configured: config
                    .worker
                    .api_token
                    .as_ref()
                    .is_some_and(|t| !t.is_empty()),
                request_timeout_secs: config.worker.request_timeout_secs,
            },
            orchestrator: config.orchestrator.clone(),
            quota: config.quota.clone(),
            storage: config.storage.as_ref().map(|s| SanitizedStorageConfig {
                url: s.url.clone(),
                bucket: s.bucket.clone(),
                service_key_configured: !s.service_key.is_empty(),
            }),
            packaging: config.packaging.clone(),
            sweeper: config.sweeper.clone(),
        }
    }
}
