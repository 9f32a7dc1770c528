pub mod status;

pub use status::ChannelNetworkStatus;
