//! Tray of transient toasts with self-expiring entries.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::Toast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub type ToastId = u64;

#[derive(Default)]
struct TrayState {
    next_id: ToastId,
    toasts: BTreeMap<ToastId, Toast>,
}

/// Holds visible toasts until their TTL elapses.
///
/// Every removal timer is bound to the tray's cancellation token. Closing or
/// dropping the tray stops all timers and clears the toasts.
pub struct ToastTray {
    state: Arc<Mutex<TrayState>>,
    cancel: CancellationToken,
    max_visible: usize,
}

impl ToastTray {
    /// The oldest toast is evicted when more than `max_visible` are shown.
    /// Must be used from within a tokio runtime.
    pub fn new(max_visible: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(TrayState::default())),
            cancel: CancellationToken::new(),
            max_visible: max_visible.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Show a toast and schedule its removal after `toast.ttl`.
    pub fn show(&self, toast: Toast) -> ToastId {
        let ttl = toast.ttl;
        let id = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.toasts.insert(id, toast);
            while state.toasts.len() > self.max_visible {
                state.toasts.pop_first();
            }
            id
        };

        if self.cancel.is_cancelled() {
            self.lock().toasts.clear();
            return id;
        }

        let state = Arc::clone(&self.state);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(ttl) => {
                    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                    if state.toasts.remove(&id).is_some() {
                        debug!(toast = id, "Toast expired");
                    }
                }
            }
        });
        id
    }

    /// Remove a toast before its TTL. Returns whether it was still visible.
    pub fn dismiss(&self, id: ToastId) -> bool {
        self.lock().toasts.remove(&id).is_some()
    }

    /// Visible toasts, oldest first.
    pub fn visible(&self) -> Vec<Toast> {
        self.lock().toasts.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancel all pending timers and clear the tray. Later toasts are not kept.
    pub fn close(&self) {
        self.cancel.cancel();
        self.lock().toasts.clear();
    }
}

impl Drop for ToastTray {
    fn drop(&mut self) {
        self.close();
    }
}
