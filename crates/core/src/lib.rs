pub mod auth;
pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod packaging;
pub mod quota;
pub mod session;
pub mod storage;
pub mod sweeper;
pub mod testing;
pub mod worker;

pub use auth::{
    create_authenticator, AuthError, AuthRequest, Authenticator, Identity, NoneAuthenticator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config,
    ConfigError, DatabaseConfig, SanitizedConfig, ServerConfig, SessionsConfig, StorageConfig,
    TokenEntry, WorkerConfig,
};
pub use orchestrator::{
    OrchestratorConfig, OrchestratorError, SessionOrchestrator, SubmissionResult,
};
pub use packaging::{Archive, AudioEncoder, AudioFormat, FfmpegEncoder, StemPackager};
pub use quota::{PlanTier, QuotaLedger, SqliteQuotaLedger, UsageReport};
pub use session::{
    CleanupOutcome, FsSessionStore, SessionRecord, SessionRegistry, SessionStore,
    SqliteSessionRegistry,
};
pub use storage::{ObjectStore, SupabaseStorageClient};
pub use sweeper::{ExpirySweeper, SweepReport, SweeperRunner};
pub use worker::{HttpSeparationWorker, SeparationWorker};
