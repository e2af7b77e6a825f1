// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Time source and simulated latency for asset transitions.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Provides the current time and the simulated real-world latency of power
/// transitions.
///
/// Delays are awaited by the engine, so dropping an in-flight transition
/// future (e.g. through `tokio::time::timeout`) cancels it.
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Waits for the given duration.
    async fn delay(&self, duration: Duration);
}

/// The wall clock.  Delays are real Tokio timers.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A clock that never waits.
///
/// It reports a fixed time, which can be moved with [`InstantClock::set`],
/// and records every delay it was asked for.
#[derive(Debug)]
pub struct InstantClock {
    now: Mutex<DateTime<Utc>>,
    delays: Mutex<Vec<Duration>>,
}

impl InstantClock {
    /// Creates a clock that reports `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
            delays: Mutex::new(Vec::new()),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Returns the delays requested so far.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[async_trait]
impl Clock for InstantClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn delay(&self, duration: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_instant_clock() {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let clock = InstantClock::new(start);

        clock.delay(Duration::from_millis(500)).await;
        clock.delay(Duration::from_secs(2)).await;
        assert_eq!(
            clock.delays(),
            vec![Duration::from_millis(500), Duration::from_secs(2)]
        );
        assert_eq!(clock.now().timestamp(), 1_700_000_000);

        clock.set(start + chrono::Duration::seconds(30));
        assert_eq!(clock.now().timestamp(), 1_700_000_030);
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_clock_delay() {
        let started = tokio::time::Instant::now();
        SystemClock.delay(Duration::from_secs(5)).await;
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
