use crate::application::ports::network_status::{NetworkSignal, NetworkStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

const SIGNAL_CAPACITY: usize = 64;

/// Network status fed by the host platform's connectivity and lifecycle callbacks.
pub struct ChannelNetworkStatus {
    reachable: AtomicBool,
    sender: broadcast::Sender<NetworkSignal>,
}

impl ChannelNetworkStatus {
    pub fn new(initially_reachable: bool) -> Self {
        let (sender, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            reachable: AtomicBool::new(initially_reachable),
            sender,
        }
    }

    /// Updates reachability and publishes a signal only on an actual transition.
    pub fn set_reachable(&self, reachable: bool) {
        let previous = self.reachable.swap(reachable, Ordering::SeqCst);
        if previous == reachable {
            return;
        }
        tracing::info!(target: "offline::scheduler", reachable, "connectivity changed");
        self.publish(NetworkSignal::ConnectivityChanged { reachable });
    }

    pub fn app_foregrounded(&self) {
        self.publish(NetworkSignal::Foreground);
    }

    pub fn app_backgrounded(&self) {
        self.publish(NetworkSignal::Background);
    }

    fn publish(&self, signal: NetworkSignal) {
        // No subscribers yet is fine; the scheduler subscribes when it starts.
        let _ = self.sender.send(signal);
    }
}

impl Default for ChannelNetworkStatus {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NetworkStatus for ChannelNetworkStatus {
    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<NetworkSignal> {
        self.sender.subscribe()
    }
}
