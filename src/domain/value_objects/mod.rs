pub mod offline;

pub use offline::{
    CURRENT_PAYLOAD_VERSION, CommandId, CommandPayload, CommandType, IdempotencyKey,
    OFFLINE_ID_PREFIX, PlaceholderId, PlaceholderResolution, SubmitClock, is_placeholder,
};
