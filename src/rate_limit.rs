//! Per-origin sliding-window attempt log.
//!
//! Each origin maps to the timestamps (ms since epoch) of its recently
//! accepted submissions. Entries are pruned lazily when the origin is next
//! seen, or by the optional [`sweeper`].

use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::clock::Clock;

pub const WINDOW_MS: i64 = 60_000;
pub const MAX_PER_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_per_window: usize,
    pub window_ms: i64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_per_window: MAX_PER_WINDOW,
            window_ms: WINDOW_MS,
        }
    }
}

impl RateLimitPolicy {
    fn is_expired(&self, recorded: i64, now: i64) -> bool {
        now - recorded >= self.window_ms
    }
}

pub struct AttemptLog {
    entries: DashMap<String, Vec<i64>>,
    policy: RateLimitPolicy,
}

/// Locked, already-pruned view of one origin's attempts.
///
/// The shard lock is held until the guard drops, so everything done through
/// it is atomic with respect to other evaluations of the same origin.
pub struct Window<'a> {
    attempts: RefMut<'a, String, Vec<i64>>,
    max_per_window: usize,
}

impl Window<'_> {
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.attempts.len() >= self.max_per_window
    }

    pub fn record(&mut self, now: i64) {
        self.attempts.push(now);
    }
}

impl AttemptLog {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
        }
    }

    /// Lock `origin`, drop expired timestamps and hand back the pruned window.
    ///
    /// The pruned sequence stays stored even if the caller never records.
    /// Do not touch any other method of the log while holding the window:
    /// they lock shards too.
    pub fn window(&self, origin: &str, now: i64) -> Window<'_> {
        let mut attempts = self.entries.entry(origin.to_string()).or_default();
        let policy = self.policy;
        attempts.retain(|&t| !policy.is_expired(t, now));

        Window {
            attempts,
            max_per_window: self.policy.max_per_window,
        }
    }

    // Stored timestamps for an origin, expired ones included
    pub fn attempts(&self, origin: &str) -> usize {
        self.entries.get(origin).map_or(0, |a| a.len())
    }

    pub fn origins(&self) -> usize {
        self.entries.len()
    }

    /// Forget origins whose every attempt has expired. Returns how many went.
    pub fn sweep(&self, now: i64) -> usize {
        let before = self.entries.len();
        let policy = self.policy;
        self.entries
            .retain(|_, attempts| attempts.iter().any(|&t| !policy.is_expired(t, now)));
        before.saturating_sub(self.entries.len())
    }
}

// Periodic sweep of idle origins
pub async fn sweeper(log: Arc<AttemptLog>, clock: Arc<dyn Clock>, every: Duration) {
    let mut interval = interval(every);

    tracing::info!(interval = ?every, "Attempt log sweeper started");

    loop {
        interval.tick().await;

        let removed = log.sweep(clock.now_ms());
        if removed > 0 {
            tracing::debug!(removed, remaining = log.origins(), "Swept idle origins");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn log() -> AttemptLog {
        AttemptLog::new(RateLimitPolicy::default())
    }

    #[test]
    fn window_is_created_lazily_and_kept_when_empty() {
        let log = log();
        assert_eq!(log.origins(), 0);

        let window = log.window("10.0.0.1", 1_000);
        assert!(window.is_empty());
        drop(window);

        assert_eq!(log.origins(), 1);
        assert_eq!(log.attempts("10.0.0.1"), 0);
    }

    #[test]
    fn timestamp_exactly_one_window_old_is_pruned() {
        let log = log();
        log.window("a", 0).record(0);
        log.window("a", 10).record(10);

        let window = log.window("a", WINDOW_MS);
        assert_eq!(window.len(), 1);
        drop(window);
        assert_eq!(log.attempts("a"), 1);
    }

    #[test]
    fn window_fills_at_max_per_window() {
        let log = AttemptLog::new(RateLimitPolicy {
            max_per_window: 2,
            window_ms: 1_000,
        });

        let mut window = log.window("a", 0);
        window.record(0);
        assert!(!window.is_full());
        window.record(1);
        assert!(window.is_full());
    }

    #[test]
    fn sweep_drops_only_fully_expired_origins() {
        let log = log();
        log.window("stale", 0).record(0);
        log.window("fresh", 0).record(0);
        log.window("fresh", 50_000).record(50_000);
        let _ = log.window("never-accepted", 0);

        let removed = log.sweep(WINDOW_MS + 1);

        assert_eq!(removed, 2);
        assert_eq!(log.origins(), 1);
        assert_eq!(log.attempts("fresh"), 2);
        assert_eq!(log.attempts("stale"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_drops_stale_origins_on_each_tick() {
        let log = Arc::new(log());
        let clock = Arc::new(ManualClock::new(0));
        log.window("stale", 0).record(0);

        let task = tokio::spawn(sweeper(
            Arc::clone(&log),
            clock.clone(),
            Duration::from_secs(30),
        ));

        // First tick fires straight away; nothing has expired yet
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(log.origins(), 1);

        clock.set(WINDOW_MS);
        log.window("fresh", WINDOW_MS).record(WINDOW_MS);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(log.origins(), 1);
        assert_eq!(log.attempts("stale"), 0);
        assert_eq!(log.attempts("fresh"), 1);

        task.abort();
    }
}
