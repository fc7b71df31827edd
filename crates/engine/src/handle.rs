//! Lazily started, shared engine process.
//!
//! The first search spawns the engine; later searches reuse it. All access
//! goes through one async mutex, so concurrent first use launches the
//! process once and concurrent searches queue behind each other.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::stockfish::{EngineConfig, SearchLimits, SearchResult, StockfishEngine};

/// Slack on top of the engine's own `movetime` before a search is abandoned
pub const SEARCH_GRACE: Duration = Duration::from_secs(5);

pub struct EngineHandle {
    config: EngineConfig,
    slot: Mutex<Option<StockfishEngine>>,
    /// Set once a process has finished its handshake, cleared when it is discarded
    ready: AtomicBool,
    launches: AtomicUsize,
}

impl EngineHandle {
    /// Create an empty handle. No process is started until the first search.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(None),
            ready: AtomicBool::new(false),
            launches: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of engine processes successfully started so far
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::Acquire)
    }

    /// Whether a started engine process is held, busy or idle.
    /// An engine still in its handshake is not ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Run one search, starting the engine first if needed.
    ///
    /// Startup failures leave the handle empty so the next call retries.
    /// A failed or timed-out search discards the process for the same reason.
    pub async fn search(
        &self,
        fen: &str,
        limits: SearchLimits,
    ) -> Result<SearchResult, EngineError> {
        let mut slot = self.slot.lock().await;

        if slot.is_none() {
            info!(path = %self.config.path, "Starting engine");
            let engine = StockfishEngine::spawn(&self.config).await?;
            info!(name = engine.name().unwrap_or("unknown"), "Engine ready");
            *slot = Some(engine);
            self.ready.store(true, Ordering::Release);
            self.launches.fetch_add(1, Ordering::Release);
        }

        let Some(engine) = slot.as_mut() else {
            return Err(EngineError::Exited);
        };

        let ceiling = limits.movetime + SEARCH_GRACE;
        let outcome = match tokio::time::timeout(ceiling, engine.search(fen, limits)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(ceiling)),
        };

        if let Err(e) = &outcome {
            warn!(error = %e, "Discarding engine after failed search");
            // Drop kills the process
            slot.take();
            self.ready.store(false, Ordering::Release);
        }

        outcome
    }

    /// Quit the engine if one is running. Gives up after `grace`.
    pub async fn shutdown(&self, grace: Duration) {
        let stop = async {
            let engine = self.slot.lock().await.take();
            self.ready.store(false, Ordering::Release);
            if let Some(mut engine) = engine {
                info!("Stopping engine");
                engine.quit().await;
                info!("Engine stopped");
            }
        };

        if tokio::time::timeout(grace, stop).await.is_err() {
            warn!(?grace, "Engine did not stop in time, abandoning it");
        }
    }
}
