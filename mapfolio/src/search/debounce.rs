//! Per-field debounce timer.
//!
//! Each call to [`Debouncer::schedule`] supersedes the previous one: the
//! earlier timer (or its request, if the timer already fired) is cancelled
//! through its slot token, and only the surviving ticket can be finished.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::slot::{spawn_cancellable, RequestSlot, Ticket};

/// Default quiet period before a keystroke issues its request.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);
/// Shortest accepted debounce delay.
pub const MIN_DEBOUNCE: Duration = Duration::from_millis(300);
/// Longest accepted debounce delay.
pub const MAX_DEBOUNCE: Duration = Duration::from_millis(400);

/// One debounce timer bound to one input field.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    slot: RequestSlot,
}

impl Debouncer {
    /// Create a debouncer. `delay` is clamped to the 300-400 ms window.
    pub fn new(name: &'static str, delay: Duration, parent: &CancellationToken) -> Self {
        Self {
            delay: delay.clamp(MIN_DEBOUNCE, MAX_DEBOUNCE),
            slot: RequestSlot::new(name, parent),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the timer. When it elapses uninterrupted, `make` is called with
    /// the ticket and the returned future is driven to completion.
    pub fn schedule<F, Fut>(&mut self, make: F) -> Ticket
    where
        F: FnOnce(Ticket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (ticket, token) = self.slot.begin();
        let delay = self.delay;
        spawn_cancellable(token, async move {
            tokio::time::sleep(delay).await;
            make(ticket).await;
        });
        ticket
    }

    /// Drop the pending timer or request without scheduling a new one.
    pub fn cancel(&mut self) {
        self.slot.invalidate();
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.slot.is_current(ticket)
    }

    /// Accept the result of the surviving request; false for superseded tickets.
    pub fn finish(&mut self, ticket: Ticket) -> bool {
        self.slot.finish(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, CancellationToken) {
        (Arc::new(Mutex::new(Vec::new())), CancellationToken::new())
    }

    #[test]
    fn test_delay_is_clamped() {
        let root = CancellationToken::new();
        assert_eq!(
            Debouncer::new("f", Duration::from_millis(50), &root).delay(),
            MIN_DEBOUNCE
        );
        assert_eq!(
            Debouncer::new("f", Duration::from_secs(2), &root).delay(),
            MAX_DEBOUNCE
        );
        assert_eq!(
            Debouncer::new("f", DEFAULT_DEBOUNCE, &root).delay(),
            DEFAULT_DEBOUNCE
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_schedule_fires() {
        let (fired, root) = recorder();
        let mut debouncer = Debouncer::new("f", DEFAULT_DEBOUNCE, &root);

        for label in ["a", "ab", "abc"] {
            let fired = fired.clone();
            debouncer.schedule(move |_| async move { fired.lock().push(label) });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*fired.lock(), vec!["abc"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_fires_before_delay() {
        let (fired, root) = recorder();
        let mut debouncer = Debouncer::new("f", DEFAULT_DEBOUNCE, &root);
        let inner = fired.clone();
        debouncer.schedule(move |_| async move { inner.lock().push("x") });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(fired.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*fired.lock(), vec!["x"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_releases_timer() {
        let (fired, root) = recorder();
        let mut debouncer = Debouncer::new("f", DEFAULT_DEBOUNCE, &root);
        let inner = fired.clone();
        let ticket = debouncer.schedule(move |_| async move { inner.lock().push("x") });

        debouncer.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(fired.lock().is_empty());
        assert!(!debouncer.finish(ticket));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_teardown_releases_timer() {
        let (fired, root) = recorder();
        let mut debouncer = Debouncer::new("f", DEFAULT_DEBOUNCE, &root);
        let inner = fired.clone();
        debouncer.schedule(move |_| async move { inner.lock().push("x") });

        root.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(fired.lock().is_empty());
    }
}
