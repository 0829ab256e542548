//! Background sweep loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

use super::config::SweeperConfig;
use super::sweep::ExpirySweeper;

/// Runs the expiry sweeper on an interval until stopped.
pub struct SweeperRunner {
    config: SweeperConfig,
    sweeper: Arc<ExpirySweeper>,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl SweeperRunner {
    /// Create a new runner.
    pub fn new(config: SweeperConfig, sweeper: Arc<ExpirySweeper>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            sweeper,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Whether the background loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start the sweep loop (spawns a background task).
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Sweeper already running");
            return;
        }

        info!(
            "Starting expiry sweeper (every {}s, max age {}h)",
            self.config.interval_secs, self.config.max_age_hours
        );

        let running = Arc::clone(&self.running);
        let sweeper = Arc::clone(&self.sweeper);
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Sweep loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Sweep loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(config.interval_secs)) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        sweeper.sweep(config.max_age_hours).await;
                    }
                }
            }
            info!("Sweep loop stopped");
        });
    }

    /// Stop the sweep loop gracefully.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Sweeper not running");
            return;
        }

        info!("Stopping expiry sweeper");
        let _ = self.shutdown_tx.send(());
    }
}
