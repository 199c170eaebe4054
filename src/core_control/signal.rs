use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Why a session was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CancelReason {
    Kicked = 1,
    Shutdown = 2,
}

impl CancelReason {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(CancelReason::Kicked),
            2 => Some(CancelReason::Shutdown),
            _ => None,
        }
    }

    /// Text sent to the client in the closing 421 reply.
    pub fn message(self) -> &'static str {
        match self {
            CancelReason::Kicked => "You have been kicked off the server.",
            CancelReason::Shutdown => "Server is shutting down.",
        }
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Kicked => write!(f, "kicked"),
            CancelReason::Shutdown => write!(f, "shutdown"),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    notify: Notify,
    reason: AtomicU8,
}

/// Cross-task wakeup used to break a session out of its blocking wait on the
/// control socket.
///
/// A wakeup issued while nobody is waiting is kept as a permit and consumed by
/// the next wait, so a signal can never be lost between the check and the
/// wait. Cancellation is cooperative: the waiter calls [`checkpoint`] after
/// waking and unwinds only if a reason was recorded.
///
/// [`checkpoint`]: CancellationSignal::checkpoint
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    inner: Arc<Inner>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wakes the waiter without requesting cancellation.
    pub fn wake(&self) {
        self.inner.notify.notify_one();
    }

    /// Records `reason` and wakes the waiter.
    pub fn cancel(&self, reason: CancelReason) {
        self.inner.reason.store(reason as u8, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }

    /// Resolves once a wakeup is available.
    pub async fn wait(&self) {
        self.inner.notify.notified().await;
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.reason.load(Ordering::SeqCst) != 0
    }

    /// Consumes a pending cancellation request.
    pub fn checkpoint(&self) -> Result<(), CancelReason> {
        match CancelReason::from_u8(self.inner.reason.swap(0, Ordering::SeqCst)) {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }
}
