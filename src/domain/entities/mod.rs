pub mod offline;

pub use offline::{
    ActionData, ActionMode, ActionOutcome, Command, DrainOutcome, DrainReport, DrainTrigger,
    FailedCommand, OptimisticRecord, PermanentFailure, QueuedCommand, QueuedCommandDraft,
};
