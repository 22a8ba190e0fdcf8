//! Request pacing
//!
//! The limiter enforces a minimum interval between the end of one request
//! and the start of the next one under the same key. A key is either a host
//! or a source: a paced source waits between its own requests whatever
//! hosts they go to, and a paced host is shared by every source. While a
//! request is in flight the next one under the same key waits for it to
//! complete. There is no token bucket and no adaptive backoff.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};
use url::Url;

/// What a request is paced by
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaceKey {
    /// The host (and port) the request goes to
    Host(String),

    /// The source issuing the request
    Source(String),
}

impl PaceKey {
    pub fn host(url: &str) -> Self {
        Self::Host(host_key(url))
    }

    pub fn source(source_id: &str) -> Self {
        Self::Source(source_id.to_string())
    }
}

impl fmt::Display for PaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(host) => write!(f, "host {}", host),
            Self::Source(id) => write!(f, "source {}", id),
        }
    }
}

/// Pacing state for one key
#[derive(Debug, Clone, Default)]
struct PaceState {
    /// Number of requests issued under this key
    request_count: u32,

    /// A request under this key has started and not completed yet
    in_flight: bool,

    /// When the last request under this key completed
    last_completion_time: Option<Instant>,
}

impl PaceState {
    /// Time left before the next request may start, `None` if it may start now
    fn time_until_next_request(&self, interval: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_completion_time?;
        let elapsed = now.duration_since(last);
        if elapsed < interval {
            Some(interval - elapsed)
        } else {
            None
        }
    }
}

/// Minimum-interval limiter keyed by host or source
#[derive(Debug)]
pub struct RateLimiter {
    host_interval: Duration,
    source_intervals: HashMap<String, Duration>,
    states: Mutex<HashMap<PaceKey, PaceState>>,
    released: Notify,
}

impl RateLimiter {
    /// Creates a limiter applying `host_interval` to every host and leaving
    /// sources unpaced
    pub fn new(host_interval: Duration) -> Self {
        Self {
            host_interval,
            source_intervals: HashMap::new(),
            states: Mutex::new(HashMap::new()),
            released: Notify::new(),
        }
    }

    /// Creates a limiter that never waits
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Paces the requests issued by `source_id`
    pub fn with_source_interval(mut self, source_id: &str, interval: Duration) -> Self {
        self.source_intervals.insert(source_id.to_string(), interval);
        self
    }

    /// The interval applying to `key`
    pub fn interval_for(&self, key: &PaceKey) -> Duration {
        match key {
            PaceKey::Host(_) => self.host_interval,
            PaceKey::Source(id) => self
                .source_intervals
                .get(id)
                .copied()
                .unwrap_or(Duration::ZERO),
        }
    }

    /// Waits until a request under `key` may start, then records it
    ///
    /// Every successful `acquire` must be followed by `complete` for the
    /// same key.
    ///
    /// # Returns
    ///
    /// The total time spent waiting
    pub async fn acquire(&self, key: &PaceKey) -> Duration {
        let interval = self.interval_for(key);
        if interval.is_zero() {
            return Duration::ZERO;
        }

        let mut waited = Duration::ZERO;
        loop {
            // Registered before the state is checked so a completion in
            // between is not missed
            let released = self.released.notified();

            let wait = {
                let mut states = self.states.lock().await;
                let state = states.entry(key.clone()).or_default();

                if state.in_flight {
                    None
                } else {
                    match state.time_until_next_request(interval, Instant::now()) {
                        None => {
                            state.request_count += 1;
                            state.in_flight = true;
                            tracing::debug!("Pacing {}: request #{}", key, state.request_count);
                            return waited;
                        }
                        Some(wait) => Some(wait),
                    }
                }
            };

            let start = Instant::now();
            match wait {
                Some(wait) => {
                    tracing::debug!("Pacing {}: waiting {:?}", key, wait);
                    tokio::time::sleep(wait).await;
                }
                None => {
                    tracing::debug!("Pacing {}: waiting for the request in flight", key);
                    released.await;
                }
            }
            waited += start.elapsed();
        }
    }

    /// Records that the request under `key` has finished, successful or not
    pub async fn complete(&self, key: &PaceKey) {
        if self.interval_for(key).is_zero() {
            return;
        }

        {
            let mut states = self.states.lock().await;
            let state = states.entry(key.clone()).or_default();
            state.in_flight = false;
            state.last_completion_time = Some(Instant::now());
        }
        self.released.notify_waiters();
    }

    #[cfg(test)]
    async fn request_count(&self, key: &PaceKey) -> u32 {
        let states = self.states.lock().await;
        states.get(key).map(|state| state.request_count).unwrap_or(0)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Hosts are keyed with their port so local test servers stay distinct
fn host_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => url.to_string(),
        },
        Err(_) => url.to_string(),
    }
}
