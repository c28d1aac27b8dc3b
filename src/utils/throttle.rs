//! Per-host request spacing for concurrent scans.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

use crate::utils::get_domain;

/// Keeps at least `delay` between two requests to the same host. Requests
/// to different hosts are not held back.
#[derive(Debug, Clone)]
pub struct HostThrottle {
    delay: Duration,
    next_slot: Arc<Mutex<HashMap<String, Instant>>>,
}

impl HostThrottle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.delay.is_zero()
    }

    /// Wait until the host of `url` may be contacted again.
    pub async fn acquire(&self, url: &str) {
        if !self.is_enabled() {
            return;
        }
        let host = get_domain(url)
            .map(|h| h.to_lowercase())
            .unwrap_or_default();

        // Reserve a slot under the lock, sleep outside it.
        let wait = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = slots.get(&host).copied().filter(|t| *t > now).unwrap_or(now);
            slots.insert(host.clone(), slot + self.delay);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            log::debug!("Throttling {host} for {wait:?}");
            sleep(wait).await;
        }
    }
}
