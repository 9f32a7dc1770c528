use super::replay_service::ReplayEngine;
use crate::application::ports::network_status::{NetworkSignal, NetworkStatus};
use crate::domain::entities::offline::{DrainOutcome, DrainTrigger};
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Decides when the replay engine drains: on a timer, when connectivity comes back,
/// and when the app returns to the foreground.
pub struct TriggerScheduler {
    engine: Arc<ReplayEngine>,
    network: Arc<dyn NetworkStatus>,
    interval: Duration,
    timer_enabled: bool,
}

impl TriggerScheduler {
    pub fn new(engine: Arc<ReplayEngine>, network: Arc<dyn NetworkStatus>) -> Self {
        Self {
            engine,
            network,
            interval: DEFAULT_SYNC_INTERVAL,
            timer_enabled: true,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Disables the periodic drain; signal-driven and manual drains still run.
    pub fn with_timer(mut self, enabled: bool) -> Self {
        self.timer_enabled = enabled;
        self
    }

    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let engine = Arc::clone(&self.engine);
        let task = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle {
            engine,
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut signals = self.network.subscribe();
        let mut signals_open = true;
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut drains = JoinSet::new();

        tracing::info!(
            target: "offline::scheduler",
            interval_secs = self.interval.as_secs(),
            timer = self.timer_enabled,
            "sync scheduler started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick(), if self.timer_enabled => {
                    if self.network.is_reachable() {
                        self.spawn_drain(&mut drains, DrainTrigger::Timer);
                    } else {
                        tracing::debug!(target: "offline::scheduler", "timer fired while offline");
                    }
                }
                signal = signals.recv(), if signals_open => match signal {
                    Ok(NetworkSignal::ConnectivityChanged { reachable: true }) => {
                        self.spawn_drain(&mut drains, DrainTrigger::ConnectivityRestored);
                    }
                    Ok(NetworkSignal::Foreground) => {
                        if self.network.is_reachable() {
                            self.spawn_drain(&mut drains, DrainTrigger::Refocus);
                        }
                    }
                    Ok(NetworkSignal::ConnectivityChanged { reachable: false })
                    | Ok(NetworkSignal::Background) => {}
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(target: "offline::scheduler", missed, "network signals lagged");
                    }
                    Err(RecvError::Closed) => {
                        tracing::warn!(target: "offline::scheduler", "network signal source closed");
                        signals_open = false;
                    }
                },
                Some(_) = drains.join_next(), if !drains.is_empty() => {}
            }
        }

        // In-flight drains are allowed to finish.
        while drains.join_next().await.is_some() {}
        tracing::info!(target: "offline::scheduler", "sync scheduler stopped");
    }

    fn spawn_drain(&self, drains: &mut JoinSet<()>, trigger: DrainTrigger) {
        let engine = Arc::clone(&self.engine);
        drains.spawn(async move {
            if let Err(err) = engine.drain(trigger).await {
                tracing::error!(
                    target: "offline::scheduler",
                    trigger = %trigger,
                    error = %err,
                    "drain cycle failed"
                );
            }
        });
    }
}

/// Owns the running scheduler task.
pub struct SchedulerHandle {
    engine: Arc<ReplayEngine>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Runs a drain now, outside the timer. Collapses into any cycle already running.
    pub async fn request_drain(&self) -> Result<DrainOutcome, AppError> {
        self.engine.drain(DrainTrigger::Manual).await
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            tracing::error!(target: "offline::scheduler", error = %err, "scheduler task panicked");
        }
    }
}
