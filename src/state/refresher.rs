use crate::state::messages::NetworkRequest;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Watch mode: re-issues the same request on a fixed interval.
pub struct PeriodicRefresher {
    network_requests: mpsc::Sender<NetworkRequest>,
    request: NetworkRequest,
    every: Duration,
}

impl PeriodicRefresher {
    pub fn new(network_requests: mpsc::Sender<NetworkRequest>, request: NetworkRequest, every: Duration) -> Self {
        Self { network_requests, request, every }
    }

    pub async fn run(self) {
        let mut ticker = interval(self.every);
        // Skip the immediate first tick so startup loading isn't double-triggered.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if self.network_requests.send(self.request.clone()).await.is_err() {
                break;
            }
        }
    }
}
