use tokio::sync::broadcast;

/// Transitions published by the device's connectivity and lifecycle sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkSignal {
    ConnectivityChanged { reachable: bool },
    Foreground,
    Background,
}

pub trait NetworkStatus: Send + Sync {
    /// Current belief about whether the remote service is reachable.
    fn is_reachable(&self) -> bool;
    fn subscribe(&self) -> broadcast::Receiver<NetworkSignal>;
}
