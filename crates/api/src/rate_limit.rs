use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sliding-window limiter keyed by client identity (forwarded IP).
#[derive(Debug, Clone)]
pub struct ClientRateLimiter {
    hits: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    window: Duration,
    max_requests: usize,
}

impl ClientRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            hits: Arc::new(Mutex::new(HashMap::new())),
            window,
            max_requests,
        }
    }

    pub fn allow(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut guard = self.hits.lock();
        let window = guard.entry(client.to_string()).or_default();

        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) > self.window {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() >= self.max_requests {
            return false;
        }

        window.push_back(now);
        true
    }
}
