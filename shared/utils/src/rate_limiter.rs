use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Idle clients are swept once every this many checks
const SWEEP_INTERVAL: usize = 256;

type Windows = HashMap<String, VecDeque<Instant>>;

/// Sliding-window rate limiter keyed by client (usually the remote IP)
pub struct RateLimiter {
    windows: Arc<Mutex<Windows>>,
    max_requests: usize,
    window: Duration,
    checks: AtomicUsize,
}

#[derive(Error, Debug, PartialEq)]
pub enum RateLimitError {
    #[error("Rate limit exceeded. Try again in {}s", retry_after.as_secs().max(1))]
    Exceeded { retry_after: Duration },
}

impl RateLimitError {
    pub fn retry_after(&self) -> Duration {
        match self {
            RateLimitError::Exceeded { retry_after } => *retry_after,
        }
    }
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests: max_requests.max(1),
            window,
            checks: AtomicUsize::new(0),
        }
    }

    /// Record a request for `key` if it fits in the current window
    pub fn check(&self, key: &str) -> Result<(), RateLimitError> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), RateLimitError> {
        let mut windows = self.windows.lock();
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            sweep(&mut windows, now, self.window);
        }

        let hits = windows.entry(key.to_string()).or_default();

        while let Some(oldest) = hits.front() {
            if now.duration_since(*oldest) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        if hits.len() >= self.max_requests {
            let retry_after = hits
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);

            tracing::warn!(client = %key, retry_after_secs = retry_after.as_secs(), "Rate limit exceeded");
            return Err(RateLimitError::Exceeded { retry_after });
        }

        hits.push_back(now);
        Ok(())
    }

    /// Requests left for `key` in the current window
    pub fn remaining(&self, key: &str) -> usize {
        let now = Instant::now();
        let windows = self.windows.lock();
        let used = windows
            .get(key)
            .map(|hits| hits.iter().filter(|t| now.duration_since(**t) < self.window).count())
            .unwrap_or(0);
        self.max_requests.saturating_sub(used)
    }

    /// Forget clients whose window is empty
    pub fn prune(&self) {
        sweep(&mut self.windows.lock(), Instant::now(), self.window);
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().len()
    }
}

fn sweep(windows: &mut Windows, now: Instant, window: Duration) {
    windows.retain(|_, hits| hits.back().is_some_and(|t| now.duration_since(*t) < window));
}
