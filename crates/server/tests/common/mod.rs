//! Common test utilities for E2E testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with mock dependencies injected, enabling comprehensive E2E testing
//! without a real separation worker, object storage or ffmpeg.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use stemsplit_core::packaging::{PackagingConfig, StemPackager};
use stemsplit_core::quota::{QuotaConfig, QuotaLedger, SqliteQuotaLedger};
use stemsplit_core::session::{FsSessionStore, SessionRegistry, SessionStore};
use stemsplit_core::storage::ObjectStore;
use stemsplit_core::sweeper::SweeperConfig;
use stemsplit_core::testing::{MockEncoder, MockObjectStore, MockSeparationWorker};
use stemsplit_core::worker::SeparationWorker;
use stemsplit_core::{
    create_authenticator, AuthConfig, AuthMethod, Authenticator, Config, DatabaseConfig,
    ExpirySweeper, OrchestratorConfig, ServerConfig, SessionOrchestrator, SessionsConfig,
    SqliteSessionRegistry, SweeperRunner, TokenEntry,
};

use stemsplit_server::api::create_router;
use stemsplit_server::state::AppState;

/// Boundary used by the hand-built multipart bodies below.
const MULTIPART_BOUNDARY: &str = "fixture-boundary-7MA4YWxkTrZu0gW";

/// Test fixture for E2E testing with mock dependencies.
///
/// Provides an in-process server with fully controllable mocks for:
/// - The separation worker (MockSeparationWorker)
/// - Remote object storage (MockObjectStore)
/// - Audio encoding (MockEncoder)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_process() {
///     let fixture = TestFixture::new().await;
///     fixture.worker.complete_with_stems(&["vocals"]).await;
///
///     let response = fixture
///         .post_multipart("/api/v1/process", Some(b"RIFF..."), Some("vocals"))
///         .await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock separation worker - script statuses and stem downloads
    pub worker: Arc<MockSeparationWorker>,
    /// Mock object store - seed remote artifacts, observe removals
    pub object_store: Arc<MockObjectStore>,
    /// Quota ledger (in-memory) - adjust plans for premium tests
    pub ledger: Arc<SqliteQuotaLedger>,
    /// Local session store rooted in the temp dir
    pub store: Arc<FsSessionStore>,
    /// Temporary directory backing session and upload dirs
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
    pub body: Value,
}

impl TestResponse {
    /// Value of a response header, empty string when absent.
    pub fn header(&self, name: &str) -> String {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }
}

impl TestFixture {
    /// Create a new test fixture with default mocks and no authentication.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        // Create mocks
        let worker = Arc::new(MockSeparationWorker::new());
        let object_store = Arc::new(MockObjectStore::new());
        let encoder = Arc::new(MockEncoder::new());

        // Create config
        let auth = if test_config.tokens.is_empty() {
            AuthConfig {
                method: AuthMethod::None,
                tokens: vec![],
            }
        } else {
            AuthConfig {
                method: AuthMethod::Token,
                tokens: test_config.tokens.clone(),
            }
        };
        let config = Config {
            auth,
            server: ServerConfig::default(),
            database: DatabaseConfig {
                path: temp_dir.path().join("test.db"),
            },
            sessions: SessionsConfig {
                data_dir: temp_dir.path().join("data"),
            },
            worker: Default::default(),
            // Poll instantly so scripted jobs resolve without wall-clock waits
            orchestrator: OrchestratorConfig::default()
                .with_poll_interval(0)
                .with_separation_timeout(5),
            quota: test_config.quota.clone(),
            storage: None,
            packaging: PackagingConfig::default().with_work_dir(temp_dir.path().join("work")),
            sweeper: SweeperConfig::default(),
        };

        // Create stores (in-memory SQLite, temp-dir filesystem)
        let ledger = Arc::new(
            SqliteQuotaLedger::in_memory(config.quota.clone())
                .expect("Failed to create quota ledger"),
        );
        let registry =
            Arc::new(SqliteSessionRegistry::in_memory().expect("Failed to create registry"));
        let store = Arc::new(FsSessionStore::new(&config.sessions));

        let authenticator: Arc<dyn Authenticator> = Arc::from(
            create_authenticator(&config.auth).expect("Failed to create authenticator"),
        );

        let packager = Arc::new(StemPackager::new(config.packaging.clone(), encoder));

        let orchestrator = Arc::new(SessionOrchestrator::new(
            config.orchestrator.clone(),
            Arc::clone(&ledger) as Arc<dyn QuotaLedger>,
            Arc::clone(&worker) as Arc<dyn SeparationWorker>,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            Arc::clone(&registry) as Arc<dyn SessionRegistry>,
            Some(Arc::clone(&object_store) as Arc<dyn ObjectStore>),
            packager,
        ));

        let sweeper = Arc::new(ExpirySweeper::new(
            Arc::clone(&store) as Arc<dyn SessionStore>,
            Arc::clone(&registry) as Arc<dyn SessionRegistry>,
            Some(Arc::clone(&object_store) as Arc<dyn ObjectStore>),
        ));
        let sweeper_runner = Arc::new(SweeperRunner::new(
            config.sweeper.clone(),
            Arc::clone(&sweeper),
        ));

        // Create app state with mocks
        let state = Arc::new(AppState::new(
            config,
            authenticator,
            orchestrator,
            Arc::clone(&ledger) as Arc<dyn QuotaLedger>,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            sweeper,
            sweeper_runner,
        ));

        // Create router
        let router = create_router(state);

        Self {
            router,
            worker,
            object_store,
            ledger,
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, None).await
    }

    /// Send a GET request with a bearer token.
    pub async fn get_auth(&self, path: &str, token: &str) -> TestResponse {
        self.request("GET", path, None, Some(token)).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), None).await
    }

    /// Send a POST request with no body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None, None).await
    }

    /// Send a multipart POST carrying an optional `file` part and an optional
    /// `stems` field, the shape the process endpoint expects.
    pub async fn post_multipart(
        &self,
        path: &str,
        file: Option<&[u8]>,
        stems: Option<&str>,
    ) -> TestResponse {
        self.post_multipart_auth(path, file, stems, None).await
    }

    /// Multipart POST with a bearer token.
    pub async fn post_multipart_auth(
        &self,
        path: &str,
        file: Option<&[u8]>,
        stems: Option<&str>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut body: Vec<u8> = Vec::new();
        if let Some(bytes) = file {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"file\"; \
                     filename=\"input.wav\"\r\nContent-Type: audio/wav\r\n\r\n",
                    MULTIPART_BOUNDARY
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        if let Some(stems) = stems {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"stems\"\r\n\r\n{}\r\n",
                    MULTIPART_BOUNDARY, stems
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

        let mut request_builder = Request::builder().method("POST").uri(path).header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        );
        if let Some(token) = token {
            request_builder =
                request_builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = request_builder.body(Body::from(body)).unwrap();

        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            request_builder =
                request_builder.header("Authorization", format!("Bearer {}", token));
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    /// Send a prebuilt request, for tests that need full header control.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Bearer tokens; empty means auth method "none"
    pub tokens: Vec<TokenEntry>,
    /// Quota limits for the in-memory ledger
    pub quota: QuotaConfig,
}

impl TestConfig {
    /// Config with token auth for the given (token, user_id) pairs.
    pub fn with_tokens(pairs: &[(&str, &str)]) -> Self {
        Self {
            tokens: pairs
                .iter()
                .map(|(token, user_id)| TokenEntry {
                    token: token.to_string(),
                    user_id: user_id.to_string(),
                })
                .collect(),
            quota: QuotaConfig::default(),
        }
    }

    /// Config with a custom standard-plan monthly limit.
    pub fn with_monthly_limit(limit: u32) -> Self {
        Self {
            tokens: vec![],
            quota: QuotaConfig {
                monthly_limit: limit,
                ..QuotaConfig::default()
            },
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
