use std::time::{Duration, Instant};

/// Trailing-edge rate limiter for recomputation triggered by noisy event
/// streams (resize, scroll).
///
/// Events are submitted as they arrive and only the most recent one is kept.
/// The owner polls from its event loop; a poll executes the pending value at
/// most once per `interval`. `cancel` drops whatever is pending so a torn
/// down view is never recomputed.
#[derive(Debug)]
pub struct Throttle<T> {
    interval: Duration,
    pending: Option<T>,
    last_run: Option<Instant>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Throttle {
            interval,
            pending: None,
            last_run: None,
        }
    }

    /// Replace the pending value with the latest event.
    pub fn submit(&mut self, value: T) {
        self.pending = Some(value);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without running it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn poll(&mut self) -> Option<T> {
        self.poll_at(Instant::now())
    }

    /// Take the pending value if the minimum interval since the last
    /// execution has passed.
    pub fn poll_at(&mut self, now: Instant) -> Option<T> {
        self.pending.as_ref()?;
        if let Some(last) = self.last_run
            && now.duration_since(last) < self.interval
        {
            return None;
        }
        self.last_run = Some(now);
        self.pending.take()
    }
}
