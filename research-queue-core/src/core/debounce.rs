//! Restartable one-shot timer used to coalesce bursts of edits.
//!
//! A [`Debouncer`] holds at most one pending value. Scheduling a new value
//! before the deadline replaces the old one and restarts the delay, so at
//! most one value fires per quiet period. Nothing is spawned: the owner polls
//! with [`Debouncer::take_due`] or awaits [`Debouncer::wait_due`], and calls
//! [`Debouncer::flush`] on teardown so a pending value is never lost.

use std::time::{Duration, Instant};

/// Identifies one scheduling; stale handles cancel nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceHandle(u64);

#[derive(Debug)]
struct Pending<T> {
    handle: DebounceHandle,
    deadline: Instant,
    value: T,
}

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
    next_handle: u64,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            next_handle: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `value` to fire one delay after `now`, cancelling any pending value.
    ///
    /// Returns the new handle and the value it displaced, if any.
    pub fn schedule(&mut self, now: Instant, value: T) -> (DebounceHandle, Option<T>) {
        let handle = DebounceHandle(self.next_handle);
        self.next_handle += 1;
        let previous = self.pending.replace(Pending {
            handle,
            deadline: now + self.delay,
            value,
        });
        (handle, previous.map(|p| p.value))
    }

    /// Cancels the pending value if `handle` still refers to it.
    pub fn cancel(&mut self, handle: DebounceHandle) -> Option<T> {
        match &self.pending {
            Some(p) if p.handle == handle => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|p| &p.value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Takes the pending value if its deadline has passed at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(p) if p.deadline <= now => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Takes the pending value regardless of its deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    /// Sleeps until the pending deadline, then takes the value.
    ///
    /// Resolves immediately with `None` when nothing is pending.
    pub async fn wait_due(&mut self) -> Option<T> {
        let deadline = self.deadline()?;
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn test_fires_only_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule(start, "a");

        assert_eq!(debouncer.take_due(start + Duration::from_millis(299)), None);
        assert_eq!(debouncer.take_due(start + DELAY), Some("a"));
        assert_eq!(debouncer.take_due(start + DELAY * 2), None);
    }

    #[test]
    fn test_reschedule_restarts_the_delay() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule(start, 1);
        let (_, displaced) = debouncer.schedule(start + Duration::from_millis(200), 2);
        assert_eq!(displaced, Some(1));

        // The first deadline has passed but was cancelled by the restart.
        assert_eq!(debouncer.take_due(start + Duration::from_millis(350)), None);
        assert_eq!(debouncer.take_due(start + Duration::from_millis(500)), Some(2));
    }

    #[test]
    fn test_cancel_ignores_stale_handles() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        let (first, _) = debouncer.schedule(start, "a");
        let (second, _) = debouncer.schedule(start, "b");

        assert_eq!(debouncer.cancel(first), None);
        assert!(debouncer.is_pending());
        assert_eq!(debouncer.cancel(second), Some("b"));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn test_flush_takes_early() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        assert_eq!(debouncer.flush(), None::<u8>);
        debouncer.schedule(start, 7);
        assert_eq!(debouncer.pending(), Some(&7));
        assert_eq!(debouncer.flush(), Some(7));
        assert_eq!(debouncer.deadline(), None);
    }

    #[tokio::test]
    async fn test_wait_due_resolves_after_deadline() {
        let mut debouncer = Debouncer::new(Duration::from_millis(5));
        assert_eq!(debouncer.wait_due().await, None::<&str>);

        let scheduled_at = Instant::now();
        debouncer.schedule(scheduled_at, "edit");
        assert_eq!(debouncer.wait_due().await, Some("edit"));
        assert!(scheduled_at.elapsed() >= Duration::from_millis(5));
    }
}
