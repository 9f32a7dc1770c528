pub mod action_outcome;
pub mod commands;
pub mod drain_report;
pub mod optimistic_record;
pub mod queued_command;

pub use action_outcome::{ActionData, ActionMode, ActionOutcome};
pub use commands::Command;
pub use drain_report::{DrainOutcome, DrainReport, DrainTrigger, PermanentFailure};
pub use optimistic_record::OptimisticRecord;
pub use queued_command::{FailedCommand, QueuedCommand, QueuedCommandDraft};
