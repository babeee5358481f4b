use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SweepConfig;
use crate::engine::Engine;

/// Periodic task that flags deadline-passed modules.
///
/// Owned by the process lifecycle: spawned on boot, stopped through the
/// shutdown token. Each tick is fire-and-forget — the next tick is scheduled
/// regardless of what the previous one did.
pub struct TimeoutSweeper {
    engine: Arc<Engine>,
    config: SweepConfig,
}

impl TimeoutSweeper {
    pub fn new(engine: Arc<Engine>, config: SweepConfig) -> Self {
        Self { engine, config }
    }

    /// Spawn the sweep loop on the runtime and return its handle.
    pub fn spawn(engine: Arc<Engine>, config: SweepConfig, token: CancellationToken) -> JoinHandle<()> {
        let sweeper = Self::new(engine, config);
        tokio::spawn(async move { sweeper.run(token).await })
    }

    /// Run sweeps until the token is cancelled.
    pub async fn run(self, token: CancellationToken) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            "Timeout sweeper started"
        );
        loop {
            let wait = self.next_wait();
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!("Timeout sweeper stopping");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            let flagged = self.engine.sweep_timeouts().await;
            if flagged > 0 {
                tracing::info!(flagged, "Timeout sweep flagged modules");
            }
        }
    }

    /// Base interval plus a random jitter so co-started processes spread
    /// their sweeps out.
    fn next_wait(&self) -> Duration {
        if self.config.max_jitter.is_zero() {
            return self.config.interval;
        }
        let jitter_ms = rand::thread_rng().gen_range(0..=self.config.max_jitter.as_millis() as u64);
        self.config.interval + Duration::from_millis(jitter_ms)
    }
}
