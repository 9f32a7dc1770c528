pub mod error;
pub mod remote_api;

pub use error::DispatchError;
pub use remote_api::{HttpRemoteApi, IDEMPOTENCY_KEY_HEADER, OFFLINE_REPLAY_HEADER};
