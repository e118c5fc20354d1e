//! Trailing-edge throttle for outgoing values.
//!
//! The first value in a window arms a timer; values arriving before the
//! timer fires replace the pending one; at expiry the single survivor is
//! flushed and the timer clears. Cancel-on-teardown: after [`cancel`]
//! (or drop) no flush will ever fire.
//!
//! [`cancel`]: Debouncer::cancel

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct DebounceState<T> {
    pending: Option<T>,
    timer: Option<JoinHandle<()>>,
}

/// A trailing-edge throttle.
///
/// Flushed values are delivered on the `mpsc` sender handed to [`new`];
/// only the latest value pushed within a window survives.
///
/// [`new`]: Debouncer::new
pub struct Debouncer<T: Send + 'static> {
    window: Duration,
    state: Arc<Mutex<DebounceState<T>>>,
    flush: mpsc::UnboundedSender<T>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer flushing into `flush` after `window`.
    #[must_use]
    pub fn new(window: Duration, flush: mpsc::UnboundedSender<T>) -> Self {
        Self {
            window,
            state: Arc::new(Mutex::new(DebounceState {
                pending: None,
                timer: None,
            })),
            flush,
        }
    }

    /// Push a value, superseding any pending one.
    ///
    /// Arms the timer if no window is open.
    pub fn push(&self, value: T) {
        let mut state = self.state.lock().unwrap();
        let arm = state.timer.is_none();
        state.pending = Some(value);

        if arm {
            let shared = Arc::clone(&self.state);
            let flush = self.flush.clone();
            let window = self.window;
            state.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(window).await;
                let mut state = shared.lock().unwrap();
                if let Some(value) = state.pending.take() {
                    let _ = flush.send(value);
                }
                state.timer = None;
            }));
        }
    }

    /// Check whether a value is waiting for the window to close.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.state.lock().unwrap().pending.is_some()
    }

    /// Drop the pending value and disarm the timer.
    ///
    /// After this returns, no flush fires until the next `push`. Safe to
    /// call more than once.
    pub fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.pending = None;
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
