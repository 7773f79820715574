use futures::future::{FutureExt, Shared};
use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Future returned by [`WorkSignal::arm`]; resolves on the next notify
pub(crate) type WorkWait = Shared<oneshot::Receiver<()>>;

/// Single-slot "work or shutdown happened" signal.
///
/// The slot is created by the first waiter and cleared by the notifier, so
/// any number of notifies between two arms coalesce into one wake-up. The
/// engine arms only after seeing an empty queue and notifies only after
/// changing state, both under its state lock, which rules out lost wake-ups.
#[derive(Default)]
pub(crate) struct WorkSignal {
    slot: Mutex<Option<(oneshot::Sender<()>, WorkWait)>>,
}

impl WorkSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Join the current pending notification, creating it if needed
    pub(crate) fn arm(&self) -> WorkWait {
        let mut slot = self.slot.lock();
        let (_, wait) = slot.get_or_insert_with(|| {
            let (tx, rx) = oneshot::channel();
            (tx, rx.shared())
        });
        wait.clone()
    }

    /// Resume every armed waiter; no-op when nobody is waiting
    pub(crate) fn notify(&self) {
        if let Some((tx, _)) = self.slot.lock().take() {
            let _ = tx.send(());
        }
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.slot.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready};

    #[test]
    fn test_notify_without_waiters_is_noop() {
        let signal = WorkSignal::new();
        signal.notify();
        signal.notify();
        assert!(!signal.is_armed());
    }

    #[test]
    fn test_notify_wakes_every_armed_waiter() {
        let signal = WorkSignal::new();
        let mut first = tokio_test::task::spawn(signal.arm());
        let mut second = tokio_test::task::spawn(signal.arm());

        assert_pending!(first.poll());
        assert_pending!(second.poll());

        signal.notify();

        assert!(first.is_woken());
        assert!(second.is_woken());
        let _ = assert_ready!(first.poll());
        let _ = assert_ready!(second.poll());
        assert!(!signal.is_armed());
    }

    #[test]
    fn test_rearm_after_notify_blocks_until_next_notify() {
        let signal = WorkSignal::new();
        let stale = signal.arm();
        signal.notify();

        let mut fresh = tokio_test::task::spawn(signal.arm());
        assert_pending!(fresh.poll());

        // The stale wait belongs to the consumed notification.
        let mut stale = tokio_test::task::spawn(stale);
        let _ = assert_ready!(stale.poll());

        signal.notify();
        let _ = assert_ready!(fresh.poll());
    }

    #[tokio::test]
    async fn test_waiter_resumes_across_tasks() {
        let signal = std::sync::Arc::new(WorkSignal::new());
        let wait = signal.arm();

        let notifier = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            notifier.notify();
        });

        tokio::time::timeout(Duration::from_secs(1), wait)
            .await
            .expect("waiter was never woken")
            .unwrap();
    }
}
