use super::{CommandPayload, CommandType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

const HASH_BYTES: usize = 8;

/// Retry-stable key letting the server collapse duplicate deliveries of one command.
///
/// Format: `{type}-{first_submit_millis}-{hash}` where `hash` is the first eight bytes of
/// the SHA-256 digest of the canonical payload, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(value: String) -> Result<Self, String> {
        Self::validate(&value)?;
        Ok(Self(value))
    }

    /// Mints the key for a command first submitted at `submitted_at`.
    pub fn mint(
        command_type: &CommandType,
        payload: &CommandPayload,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self(format!(
            "{}-{}-{}",
            command_type.as_str(),
            submitted_at.timestamp_millis(),
            payload_hash(payload)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("Idempotency key cannot be empty".to_string());
        }
        if value.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err("Idempotency key must not contain whitespace".to_string());
        }
        Ok(())
    }
}

fn payload_hash(payload: &CommandPayload) -> String {
    let digest = Sha256::digest(payload.to_canonical_string().as_bytes());
    digest[..HASH_BYTES]
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<IdempotencyKey> for String {
    fn from(key: IdempotencyKey) -> Self {
        key.0
    }
}

/// Hands out strictly increasing first-submit stamps so two submissions never share one,
/// even when they land in the same millisecond.
#[derive(Debug, Default)]
pub struct SubmitClock {
    last_millis: AtomicI64,
}

impl SubmitClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let now_millis = now.timestamp_millis();
        let mut last = self.last_millis.load(Ordering::Relaxed);
        loop {
            let stamp = now_millis.max(last.saturating_add(1));
            match self.last_millis.compare_exchange_weak(
                last,
                stamp,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return DateTime::<Utc>::from_timestamp_millis(stamp).unwrap_or(now),
                Err(current) => last = current,
            }
        }
    }
}
