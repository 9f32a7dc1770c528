use crate::domain::value_objects::{CommandId, CommandType, IdempotencyKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What asked for a drain cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainTrigger {
    Timer,
    ConnectivityRestored,
    Refocus,
    Manual,
}

impl DrainTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrainTrigger::Timer => "timer",
            DrainTrigger::ConnectivityRestored => "connectivity_restored",
            DrainTrigger::Refocus => "refocus",
            DrainTrigger::Manual => "manual",
        }
    }
}

impl fmt::Display for DrainTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermanentFailure {
    pub command_id: CommandId,
    pub command_type: CommandType,
    pub idempotency_key: IdempotencyKey,
    pub attempts: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    pub trigger: DrainTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub attempted: u32,
    pub synced: u32,
    pub failed: u32,
    pub deferred: u32,
    pub skipped: u32,
    /// Set when the credential was missing or refused; affected commands were left untouched.
    pub unauthenticated: bool,
    pub permanently_failed: Vec<PermanentFailure>,
    pub remaining: u32,
}

impl DrainReport {
    pub fn new(trigger: DrainTrigger) -> Self {
        let now = Utc::now();
        Self {
            trigger,
            started_at: now,
            finished_at: now,
            attempted: 0,
            synced: 0,
            failed: 0,
            deferred: 0,
            skipped: 0,
            unauthenticated: false,
            permanently_failed: Vec::new(),
            remaining: 0,
        }
    }

    pub fn finish(mut self, remaining: u32) -> Self {
        self.remaining = remaining;
        self.finished_at = Utc::now();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    Completed(DrainReport),
    /// Another cycle held the single-flight guard; this request was dropped.
    AlreadyRunning,
}

impl DrainOutcome {
    pub fn report(&self) -> Option<&DrainReport> {
        match self {
            DrainOutcome::Completed(report) => Some(report),
            DrainOutcome::AlreadyRunning => None,
        }
    }

    pub fn into_report(self) -> Option<DrainReport> {
        match self {
            DrainOutcome::Completed(report) => Some(report),
            DrainOutcome::AlreadyRunning => None,
        }
    }
}
