use crate::domain::entities::offline::PermanentFailure;

/// Receives commands that were dropped for good so they can be surfaced to operators.
pub trait FailureNotifier: Send + Sync {
    fn notify_permanent_failure(&self, failure: &PermanentFailure) -> Result<(), String>;
}
