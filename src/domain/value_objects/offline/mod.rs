pub mod command_id;
pub mod command_type;
pub mod idempotency_key;
pub mod payload;
pub mod placeholder_id;

pub use command_id::CommandId;
pub use command_type::CommandType;
pub use idempotency_key::{IdempotencyKey, SubmitClock};
pub use payload::{CURRENT_PAYLOAD_VERSION, CommandPayload};
pub use placeholder_id::{
    OFFLINE_ID_PREFIX, PlaceholderId, PlaceholderResolution, is_placeholder,
};
