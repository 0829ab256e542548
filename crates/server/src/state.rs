use std::sync::Arc;

use stemsplit_core::quota::QuotaLedger;
use stemsplit_core::session::SessionStore;
use stemsplit_core::{
    Authenticator, Config, ExpirySweeper, SanitizedConfig, SessionOrchestrator, SweeperRunner,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    orchestrator: Arc<SessionOrchestrator>,
    ledger: Arc<dyn QuotaLedger>,
    store: Arc<dyn SessionStore>,
    sweeper: Arc<ExpirySweeper>,
    sweeper_runner: Arc<SweeperRunner>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        orchestrator: Arc<SessionOrchestrator>,
        ledger: Arc<dyn QuotaLedger>,
        store: Arc<dyn SessionStore>,
        sweeper: Arc<ExpirySweeper>,
        sweeper_runner: Arc<SweeperRunner>,
    ) -> Self {
        Self {
            config,
            authenticator,
            orchestrator,
            ledger,
            store,
            sweeper,
            sweeper_runner,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn orchestrator(&self) -> &SessionOrchestrator {
        &self.orchestrator
    }

    pub fn ledger(&self) -> &dyn QuotaLedger {
        self.ledger.as_ref()
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    pub fn sweeper(&self) -> &ExpirySweeper {
        &self.sweeper
    }

    pub fn sweeper_runner(&self) -> &SweeperRunner {
        &self.sweeper_runner
    }
}
