pub mod command_queue;
pub mod credentials;
pub mod failure_notifier;
pub mod network_status;
pub mod remote_api;

pub use command_queue::CommandQueueStore;
pub use credentials::CredentialSource;
pub use failure_notifier::FailureNotifier;
pub use network_status::{NetworkSignal, NetworkStatus};
pub use remote_api::{DeliveryContext, RemoteApi};
