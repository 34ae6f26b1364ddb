//! Registry of pending "wait for card" requests

use std::collections::BTreeMap;

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::error::WaitError;
use crate::uid::CardUid;

/// Terminal outcome delivered to a waiter
pub type WaitOutcome = Result<CardUid, WaitError>;

/// Handle identifying one registered waiter, ordered by arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WaiterId(u64);

#[derive(Debug)]
struct PendingWait {
    deadline: Instant,
    completion: oneshot::Sender<WaitOutcome>,
}

/// Pending wait requests, each with its own deadline
///
/// Every entry leaves the registry exactly once: drained by
/// [`resolve_all`](Self::resolve_all) or [`reject_all`](Self::reject_all),
/// expired, or cancelled by its owner.
#[derive(Debug, Default)]
pub struct WaiterRegistry {
    next_id: u64,
    pending: BTreeMap<WaiterId, PendingWait>,
}

impl WaiterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending waiters
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no waiter is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Add a waiter; its outcome arrives on the returned receiver
    pub fn register(&mut self, deadline: Instant) -> (WaiterId, oneshot::Receiver<WaitOutcome>) {
        let id = WaiterId(self.next_id);
        self.next_id += 1;

        let (completion, receiver) = oneshot::channel();
        self.pending.insert(
            id,
            PendingWait {
                deadline,
                completion,
            },
        );
        (id, receiver)
    }

    /// Remove a waiter without delivering anything
    ///
    /// Returns `false` if the waiter already left the registry, in which case
    /// its outcome is waiting on the receiver.
    pub fn cancel(&mut self, id: WaiterId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Deliver `uid` to every pending waiter and empty the registry
    ///
    /// Waiters already past their deadline receive [`WaitError::Timeout`]
    /// instead. Returns how many waiters received the identifier.
    pub fn resolve_all(&mut self, uid: &CardUid) -> usize {
        self.drain(|| Ok(uid.clone()))
    }

    /// Deliver `error` to every pending waiter and empty the registry
    ///
    /// Returns how many waiters received the error.
    pub fn reject_all(&mut self, error: WaitError) -> usize {
        self.drain(|| Err(error))
    }

    /// Time out every waiter whose deadline is at or before `now`
    pub fn expire(&mut self, now: Instant) -> usize {
        let expired: Vec<WaiterId> = self
            .pending
            .iter()
            .filter(|(_, wait)| wait.deadline <= now)
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            if let Some(wait) = self.pending.remove(id) {
                let _ = wait.completion.send(Err(WaitError::Timeout));
            }
        }
        expired.len()
    }

    fn drain(&mut self, outcome: impl Fn() -> WaitOutcome) -> usize {
        let now = Instant::now();
        let mut delivered = 0;

        for (_, wait) in std::mem::take(&mut self.pending) {
            if wait.deadline <= now {
                let _ = wait.completion.send(Err(WaitError::Timeout));
                continue;
            }
            // receiver may be gone if its caller hung up
            if wait.completion.send(outcome()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn uid(s: &str) -> CardUid {
        s.parse().unwrap()
    }

    fn later() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_all_reaches_every_waiter_once() {
        let mut registry = WaiterRegistry::new();
        let mut receivers: Vec<_> = (0..3).map(|_| registry.register(later()).1).collect();

        assert_eq!(registry.resolve_all(&uid("04A1B2C3")), 3);
        assert!(registry.is_empty());

        for rx in &mut receivers {
            assert_eq!(rx.try_recv().unwrap(), Ok(uid("04A1B2C3")));
        }

        // a second broadcast finds nobody
        assert_eq!(registry.resolve_all(&uid("04DEADBE")), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiters_registered_after_drain_are_untouched() {
        let mut registry = WaiterRegistry::new();
        let (_, mut before) = registry.register(later());
        registry.resolve_all(&uid("04A1B2C3"));
        let (_, mut after) = registry.register(later());

        assert_eq!(before.try_recv().unwrap(), Ok(uid("04A1B2C3")));
        assert!(after.try_recv().is_err());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_all_delivers_error() {
        let mut registry = WaiterRegistry::new();
        let (_, mut a) = registry.register(later());
        let (_, mut b) = registry.register(later());

        assert_eq!(registry.reject_all(WaitError::ReaderRemoved), 2);
        assert_eq!(a.try_recv().unwrap(), Err(WaitError::ReaderRemoved));
        assert_eq!(b.try_recv().unwrap(), Err(WaitError::ReaderRemoved));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_removes_only_once() {
        let mut registry = WaiterRegistry::new();
        let (id, _rx) = registry.register(later());
        assert!(registry.cancel(id));
        assert!(!registry.cancel(id));
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_drain_reports_outcome_on_receiver() {
        let mut registry = WaiterRegistry::new();
        let (id, mut rx) = registry.register(later());
        registry.resolve_all(&uid("04A1B2C3"));

        assert!(!registry.cancel(id));
        assert_eq!(rx.try_recv().unwrap(), Ok(uid("04A1B2C3")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overdue_waiters_time_out_instead_of_resolving() {
        let mut registry = WaiterRegistry::new();
        let (_, mut overdue) = registry.register(Instant::now() + Duration::from_millis(10));
        let (_, mut fresh) = registry.register(later());

        tokio::time::advance(Duration::from_millis(20)).await;

        assert_eq!(registry.resolve_all(&uid("04A1B2C3")), 1);
        assert_eq!(overdue.try_recv().unwrap(), Err(WaitError::Timeout));
        assert_eq!(fresh.try_recv().unwrap(), Ok(uid("04A1B2C3")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_times_out_due_waiters() {
        let mut registry = WaiterRegistry::new();
        let (_, mut due) = registry.register(Instant::now() + Duration::from_secs(1));
        let (_, mut pending) = registry.register(later());

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(registry.expire(Instant::now()), 1);
        assert_eq!(due.try_recv().unwrap(), Err(WaitError::Timeout));
        assert!(pending.try_recv().is_err());
        assert_eq!(registry.len(), 1);
    }
}
