pub mod entities;
pub mod value_objects;

pub use entities::{ActionOutcome, Command, QueuedCommand};
pub use value_objects::{CommandId, CommandType, IdempotencyKey, PlaceholderId};
