use super::dispatch::{CommandDispatcher, DispatchOutcome, server_id};
use crate::application::ports::{
    CommandQueueStore, CredentialSource, DeliveryContext, FailureNotifier,
};
use crate::domain::entities::offline::{
    Command, DrainOutcome, DrainReport, DrainTrigger, PermanentFailure, QueuedCommand,
};
use crate::domain::value_objects::{PlaceholderResolution, is_placeholder};
use crate::infrastructure::offline::metrics::{ReplayMetrics, ReplayMetricsSnapshot};
use crate::shared::error::AppError;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Releases the single-flight flag when a cycle ends, including on early return.
struct DrainGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> DrainGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Option<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { running })
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

enum ParentResolution {
    Ready(Command),
    /// Parent placeholder still queued ahead in this cycle.
    Deferred(String),
    /// Retirement reason for a child whose parent can never be resolved.
    Orphaned(String),
}

/// Drains the durable queue against the server, oldest command first.
pub struct ReplayEngine {
    store: Arc<dyn CommandQueueStore>,
    dispatcher: CommandDispatcher,
    credentials: Arc<dyn CredentialSource>,
    notifier: Option<Arc<dyn FailureNotifier>>,
    metrics: Arc<ReplayMetrics>,
    max_retries: u32,
    running: AtomicBool,
}

impl ReplayEngine {
    pub fn new(
        store: Arc<dyn CommandQueueStore>,
        dispatcher: CommandDispatcher,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            credentials,
            notifier: None,
            metrics: Arc::new(ReplayMetrics::new()),
            max_retries: DEFAULT_MAX_RETRIES,
            running: AtomicBool::new(false),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn FailureNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn metrics(&self) -> ReplayMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Runs one drain cycle. Returns [`DrainOutcome::AlreadyRunning`] without touching the
    /// queue when another cycle holds the guard.
    pub async fn drain(&self, trigger: DrainTrigger) -> Result<DrainOutcome, AppError> {
        let Some(_guard) = DrainGuard::acquire(&self.running) else {
            self.metrics.record_skipped();
            tracing::debug!(
                target: "offline::replay",
                trigger = %trigger,
                "drain already running; trigger ignored"
            );
            return Ok(DrainOutcome::AlreadyRunning);
        };

        let report = self.run_cycle(trigger).await?;
        self.metrics.record_cycle(&report);

        if report.attempted > 0 || !report.permanently_failed.is_empty() {
            tracing::info!(
                target: "offline::replay",
                trigger = %report.trigger,
                attempted = report.attempted,
                synced = report.synced,
                failed = report.failed,
                deferred = report.deferred,
                skipped = report.skipped,
                retired = report.permanently_failed.len(),
                remaining = report.remaining,
                "drain cycle finished"
            );
        } else {
            tracing::debug!(
                target: "offline::replay",
                trigger = %report.trigger,
                remaining = report.remaining,
                unauthenticated = report.unauthenticated,
                "drain cycle finished without deliveries"
            );
        }

        Ok(DrainOutcome::Completed(report))
    }

    async fn run_cycle(&self, trigger: DrainTrigger) -> Result<DrainReport, AppError> {
        let mut report = DrainReport::new(trigger);
        let commands = self.store.list_all().await?;
        if commands.is_empty() {
            return Ok(report.finish(0));
        }

        // Placeholders whose creating command is still waiting in this snapshot.
        let mut pending_parents: HashSet<String> = commands
            .iter()
            .filter_map(|command| command.placeholder_id.as_ref())
            .map(|placeholder| placeholder.as_str().to_string())
            .collect();

        for queued in &commands {
            let Some(token) = self.credentials.bearer_token().await else {
                tracing::warn!(
                    target: "offline::replay",
                    pending = commands.len(),
                    "no session credential; leaving queue untouched"
                );
                report.unauthenticated = true;
                break;
            };

            let command = match self.resolve_parent(queued.command(), &pending_parents).await? {
                ParentResolution::Ready(command) => command,
                ParentResolution::Deferred(parent) => {
                    tracing::debug!(
                        target: "offline::replay",
                        command_id = %queued.id,
                        parent = %parent,
                        "parent not yet synced; deferring"
                    );
                    report.deferred += 1;
                    continue;
                }
                ParentResolution::Orphaned(reason) => {
                    self.retire(queued, queued.retry_count, &reason, &mut report)
                        .await?;
                    continue;
                }
            };

            let ctx = DeliveryContext::replay(token, queued.idempotency_key.clone());
            match self.dispatcher.dispatch(&command, &ctx).await {
                Ok(DispatchOutcome::Delivered(response)) => {
                    report.attempted += 1;
                    self.store.remove(queued.id).await?;
                    report.synced += 1;
                    if command.creates_entity()
                        && let Some(placeholder) = &queued.placeholder_id
                    {
                        pending_parents.remove(placeholder.as_str());
                        let created_id = server_id(&response);
                        if created_id.is_none() {
                            tracing::warn!(
                                target: "offline::replay",
                                command_id = %queued.id,
                                placeholder = %placeholder,
                                "created entity response carried no id"
                            );
                        }
                        self.store
                            .record_placeholder(placeholder.as_str(), created_id.as_deref())
                            .await?;
                    }
                    tracing::debug!(
                        target: "offline::replay",
                        command_id = %queued.id,
                        command_type = %queued.command_type,
                        key = %queued.idempotency_key,
                        "command synced"
                    );
                }
                Ok(DispatchOutcome::Unsupported(reason)) => {
                    tracing::warn!(
                        target: "offline::replay",
                        command_id = %queued.id,
                        command_type = %queued.command_type,
                        reason = %reason,
                        "skipping command this build cannot dispatch"
                    );
                    report.skipped += 1;
                }
                Err(err) if err.is_auth_failure() => {
                    report.attempted += 1;
                    report.unauthenticated = true;
                    tracing::warn!(
                        target: "offline::replay",
                        command_id = %queued.id,
                        error = %err,
                        "credential refused; command left queued"
                    );
                }
                Err(err) => {
                    report.attempted += 1;
                    report.failed += 1;
                    self.handle_failure(queued, &err, &mut report).await?;
                }
            }
        }

        let remaining = self.store.list_all().await?.len();
        Ok(report.finish(u32::try_from(remaining).unwrap_or(u32::MAX)))
    }

    async fn resolve_parent(
        &self,
        command: Command,
        pending_parents: &HashSet<String>,
    ) -> Result<ParentResolution, AppError> {
        let parent = command
            .parent_id()
            .filter(|id| is_placeholder(id))
            .map(str::to_string);
        let Some(parent) = parent else {
            return Ok(ParentResolution::Ready(command));
        };

        match self.store.resolve_placeholder(&parent).await? {
            Some(PlaceholderResolution::Resolved(server_id)) => {
                Ok(ParentResolution::Ready(command.with_parent_id(server_id)))
            }
            Some(PlaceholderResolution::MissingServerId) => Ok(ParentResolution::Orphaned(
                format!("parent {parent} synced but the server returned no id"),
            )),
            None if pending_parents.contains(&parent) => Ok(ParentResolution::Deferred(parent)),
            None => Ok(ParentResolution::Orphaned(format!(
                "parent {parent} was never created on the server"
            ))),
        }
    }

    async fn handle_failure(
        &self,
        queued: &QueuedCommand,
        err: &AppError,
        report: &mut DrainReport,
    ) -> Result<(), AppError> {
        let Some(attempts) = self
            .store
            .record_failure(queued.id, &err.to_string())
            .await?
        else {
            return Ok(());
        };

        if attempts >= self.max_retries {
            let exhausted = AppError::MaxRetriesExceeded {
                command_id: queued.id.value(),
                attempts,
            };
            let reason = format!("{exhausted}; last error: {err}");
            return self.retire(queued, attempts, &reason, report).await;
        }

        tracing::debug!(
            target: "offline::replay",
            command_id = %queued.id,
            attempts,
            max_retries = self.max_retries,
            error = %err,
            "delivery failed; will retry"
        );
        Ok(())
    }

    async fn retire(
        &self,
        queued: &QueuedCommand,
        attempts: u32,
        reason: &str,
        report: &mut DrainReport,
    ) -> Result<(), AppError> {
        let mut archived = queued.clone();
        archived.retry_count = attempts;
        self.store.retire(&archived, reason).await?;

        tracing::error!(
            target: "offline::replay",
            command_id = %queued.id,
            command_type = %queued.command_type,
            key = %queued.idempotency_key,
            attempts,
            reason = %reason,
            "command permanently failed"
        );

        let failure = PermanentFailure {
            command_id: queued.id,
            command_type: queued.command_type.clone(),
            idempotency_key: queued.idempotency_key.clone(),
            attempts,
            reason: reason.to_string(),
        };
        if let Some(notifier) = &self.notifier
            && let Err(err) = notifier.notify_permanent_failure(&failure)
        {
            tracing::warn!(
                target: "offline::replay",
                command_id = %queued.id,
                error = %err,
                "failed to notify permanent failure"
            );
        }
        report.permanently_failed.push(failure);
        Ok(())
    }
}
