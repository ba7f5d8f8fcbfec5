//! Fire-once cancellation signals.
//!
//! A [`CancelSource`] owns the signal and hands out any number of
//! [`CancelToken`]s. Firing is monotonic: once cancelled, every token
//! observes it forever. Dropping the last clone of a source fires it too.
//!
//! The signal is a zero-capacity channel that never carries a value; firing
//! drops the only sender, which disconnects every receiver at once. That makes
//! [`CancelToken::done`] usable as an arm of `crossbeam_channel::select!`.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Uninhabited payload: nothing is ever sent on a cancellation channel.
#[derive(Debug)]
pub enum Never {}

/// Owning side of a cancellation signal.
#[derive(Clone)]
pub struct CancelSource {
    sender: Arc<Mutex<Option<Sender<Never>>>>,
    receiver: Receiver<Never>,
}

impl CancelSource {
    /// Create a signal that has not fired.
    pub fn new() -> Self {
        let (sender, receiver) = bounded(0);
        Self {
            sender: Arc::new(Mutex::new(Some(sender))),
            receiver,
        }
    }

    /// Hand out a token observing this signal.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            done: self.receiver.clone(),
        }
    }

    /// Fire the signal. Calling it again is a no-op.
    pub fn cancel(&self) {
        self.sender.lock().take();
    }

    /// Whether the signal has fired.
    pub fn is_cancelled(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSource")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Observing side of a cancellation signal.
#[derive(Clone)]
pub struct CancelToken {
    done: Receiver<Never>,
}

impl CancelToken {
    /// Whether the signal has fired (non-blocking).
    pub fn is_cancelled(&self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Block until the signal fires.
    pub fn wait(&self) {
        // recv can only return once the sender is gone
        let _ = self.done.recv();
    }

    /// Block until the signal fires or `timeout` elapses.
    /// Returns true if the signal fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        matches!(
            self.done.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// Receiver that becomes ready (disconnected) when the signal fires.
    pub fn done(&self) -> &Receiver<Never> {
        &self.done
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
