use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// Identity of one request issued through a [`RequestSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Cloneable cancellation flag shared between a request and whoever may
/// want to abandon it.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

#[derive(Debug)]
pub enum RequestOutcome<T> {
    Ready(T),
    TimedOut(Duration),
    Cancelled,
    /// A newer request was issued on the same slot before this one finished.
    Stale,
}

impl<T> RequestOutcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            RequestOutcome::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, RequestOutcome::Stale)
    }
}

/// One logical request kind (a course lookup, a chat turn, ...).
///
/// Starting a request supersedes and cancels the previous one on the same
/// slot; a response that arrives for a superseded request is reported as
/// [`RequestOutcome::Stale`] and never handed to the caller.
#[derive(Debug)]
pub struct RequestSlot {
    name: &'static str,
    latest: AtomicU64,
    inflight: Mutex<Option<(RequestId, CancelToken)>>,
}

impl RequestSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            latest: AtomicU64::new(0),
            inflight: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn begin(&self) -> RequestHandle {
        let id = RequestId(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
        let token = CancelToken::new();
        let previous = self
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace((id, token.clone()));
        if let Some((old_id, old_token)) = previous {
            tracing::debug!(slot = self.name, superseded = old_id.get(), by = id.get(), "request superseded");
            old_token.cancel();
        }
        RequestHandle { id, token }
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.latest.load(Ordering::SeqCst) == id.get()
    }

    /// Cancel whatever is in flight on this slot.
    pub fn cancel(&self) {
        let inflight = self
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((id, token)) = inflight {
            tracing::debug!(slot = self.name, id = id.get(), "request cancelled");
            token.cancel();
        }
    }

    fn finish(&self, id: RequestId) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(inflight.as_ref(), Some((current, _)) if *current == id) {
            *inflight = None;
        }
    }
}

#[derive(Debug)]
pub struct RequestHandle {
    id: RequestId,
    token: CancelToken,
}

impl RequestHandle {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// A token that cancels this request when triggered.
    pub fn canceller(&self) -> CancelToken {
        self.token.clone()
    }

    /// Drive `fut` to completion unless it times out, is cancelled or is superseded.
    pub async fn run<F, T>(self, slot: &RequestSlot, timeout: Duration, fut: F) -> RequestOutcome<T>
    where
        F: Future<Output = T>,
    {
        let outcome = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                if slot.is_current(self.id) {
                    RequestOutcome::Cancelled
                } else {
                    RequestOutcome::Stale
                }
            }
            result = tokio::time::timeout(timeout, fut) => match result {
                Ok(value) if slot.is_current(self.id) => RequestOutcome::Ready(value),
                Ok(_) => RequestOutcome::Stale,
                Err(_) => RequestOutcome::TimedOut(timeout),
            },
        };
        slot.finish(self.id);

        match &outcome {
            RequestOutcome::Ready(_) => {}
            RequestOutcome::TimedOut(t) => {
                tracing::warn!(slot = slot.name, id = self.id.get(), timeout = ?t, "request timed out")
            }
            RequestOutcome::Cancelled => {
                tracing::debug!(slot = slot.name, id = self.id.get(), "request cancelled")
            }
            RequestOutcome::Stale => {
                tracing::debug!(slot = slot.name, id = self.id.get(), "stale response discarded")
            }
        }
        outcome
    }
}
