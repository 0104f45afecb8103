//! Toast notification queue.
//!
//! DESIGN
//! ======
//! The queue owns every toast record. Observers get a fresh `&[Toast]`
//! (most recent first) immediately on subscribe and after changes, in
//! registration order. Observers run after the queue lock is released, so
//! they may call back into the queue.
//!
//! Each change bumps a version. One caller at a time drains deliveries;
//! a change made while a drain is running (from another thread or from an
//! observer) is picked up by that drain. Deliveries never overlap and never
//! go backwards, and the last one always carries the current collection.
//! Back-to-back concurrent changes may be folded into one delivery.
//!
//! Expiry timers are plain tokio tasks holding a weak reference to the
//! queue; removal by id is idempotent, so a timer firing after a manual
//! removal does nothing.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How long a dismissed toast stays in the collection (hidden) before removal.
pub const EXIT_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

impl Severity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    /// Zero means the toast stays until removed.
    pub duration: Duration,
    /// False while a dismissed toast plays out its exit delay.
    pub visible: bool,
}

/// Per-toast options. A missing duration means the queue default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToastOptions {
    pub duration: Option<Duration>,
}

impl ToastOptions {
    #[must_use]
    pub fn with_duration(duration: Duration) -> Self {
        Self { duration: Some(duration) }
    }

    #[must_use]
    pub fn persistent() -> Self {
        Self { duration: Some(Duration::ZERO) }
    }
}

type Observer = Arc<dyn Fn(&[Toast]) + Send + Sync>;

struct QueueState {
    next_id: u64,
    toasts: Vec<Toast>,
    next_observer: u64,
    observers: Vec<(u64, Observer)>,
    timers: CancellationToken,
    version: u64,
    delivered: u64,
    delivering: bool,
}

impl QueueState {
    /// Record a change. True when the caller must run the drain.
    fn changed(&mut self) -> bool {
        self.version += 1;
        !std::mem::replace(&mut self.delivering, true)
    }
}

struct QueueShared {
    state: Mutex<QueueState>,
    default_duration: Duration,
}

/// Shared handle to the toast queue. Clone is cheap.
#[derive(Clone)]
pub struct ToastQueue {
    shared: Arc<QueueShared>,
}

impl ToastQueue {
    #[must_use]
    pub fn new(default_duration: Duration) -> Self {
        let state = QueueState {
            next_id: 0,
            toasts: Vec::new(),
            next_observer: 0,
            observers: Vec::new(),
            timers: CancellationToken::new(),
            version: 0,
            delivered: 0,
            delivering: false,
        };
        Self { shared: Arc::new(QueueShared { state: Mutex::new(state), default_duration }) }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn default_duration(&self) -> Duration {
        self.shared.default_duration
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Toast> {
        self.lock().toasts.clone()
    }

    /// Push a toast to the head of the queue and return its id.
    pub fn add(&self, message: impl Into<String>, severity: Severity, options: ToastOptions) -> u64 {
        let duration = options.duration.unwrap_or(self.shared.default_duration);
        let (id, timers, pending) = {
            let mut state = self.lock();
            state.next_id += 1;
            let id = state.next_id;
            state.toasts.insert(0, Toast { id, message: message.into(), severity, duration, visible: true });
            (id, state.timers.clone(), state.changed())
        };
        debug!(id, %severity, ?duration, "toast added");
        if pending {
            self.drain();
        }

        if !duration.is_zero() {
            self.schedule_removal(id, duration, timers);
        }
        id
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.add(message, Severity::Success, ToastOptions::default())
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.add(message, Severity::Error, ToastOptions::default())
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.add(message, Severity::Info, ToastOptions::default())
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.add(message, Severity::Warning, ToastOptions::default())
    }

    /// Remove toast `id`. Returns false (and notifies nobody) if it is gone.
    pub fn remove(&self, id: u64) -> bool {
        let pending = {
            let mut state = self.lock();
            let Some(pos) = state.toasts.iter().position(|t| t.id == id) else {
                return false;
            };
            state.toasts.remove(pos);
            state.changed()
        };
        debug!(id, "toast removed");
        if pending {
            self.drain();
        }
        true
    }

    /// Hide toast `id` now and remove it after [`EXIT_DELAY`].
    pub fn dismiss(&self, id: u64) -> bool {
        let (timers, pending) = {
            let mut state = self.lock();
            let Some(toast) = state.toasts.iter_mut().find(|t| t.id == id && t.visible) else {
                return false;
            };
            toast.visible = false;
            (state.timers.clone(), state.changed())
        };
        if pending {
            self.drain();
        }
        self.schedule_removal(id, EXIT_DELAY, timers);
        true
    }

    /// Drop every toast and every pending expiry timer.
    pub fn clear_all(&self) {
        let pending = {
            let mut state = self.lock();
            state.toasts.clear();
            state.timers.cancel();
            state.timers = CancellationToken::new();
            state.changed()
        };
        debug!("toasts cleared");
        if pending {
            self.drain();
        }
    }

    /// Register `observer`; it is called right away and after every change.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&[Toast]) + Send + Sync + 'static,
    {
        let observer: Observer = Arc::new(observer);
        let (id, current) = {
            let mut state = self.lock();
            state.next_observer += 1;
            let id = state.next_observer;
            state.observers.push((id, observer.clone()));
            if state.delivering {
                // The running drain will redeliver to everyone, including us.
                state.version += 1;
                (id, None)
            } else {
                state.delivering = true;
                (id, Some(state.toasts.clone()))
            }
        };
        if let Some(current) = current {
            let _reset = DrainReset(self);
            observer(&current);
            self.drain();
        }
        Subscription { id, queue: Arc::downgrade(&self.shared) }
    }

    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    /// Deliver until observers have seen the latest version. The caller
    /// must have set `delivering`.
    fn drain(&self) {
        let _reset = DrainReset(self);
        loop {
            let (toasts, observers) = {
                let mut state = self.lock();
                if state.delivered == state.version {
                    state.delivering = false;
                    return;
                }
                state.delivered = state.version;
                let observers: Vec<Observer> = state.observers.iter().map(|(_, o)| o.clone()).collect();
                (state.toasts.clone(), observers)
            };
            for observer in &observers {
                observer(&toasts);
            }
        }
    }

    fn schedule_removal(&self, id: u64, after: Duration, timers: CancellationToken) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(id, "no async runtime; toast will not expire on its own");
            return;
        };
        let queue = Arc::downgrade(&self.shared);
        runtime.spawn(async move {
            tokio::select! {
                () = timers.cancelled() => {}
                () = tokio::time::sleep(after) => {
                    if let Some(shared) = queue.upgrade() {
                        ToastQueue { shared }.remove(id);
                    }
                }
            }
        });
    }
}

impl std::fmt::Debug for ToastQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ToastQueue")
            .field("toasts", &state.toasts)
            .field("observers", &state.observers.len())
            .finish_non_exhaustive()
    }
}

/// Clears the drain flag if an observer panics mid-delivery.
struct DrainReset<'a>(&'a ToastQueue);

impl Drop for DrainReset<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().delivering = false;
        }
    }
}

/// Observer registration. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes the observer"]
pub struct Subscription {
    id: u64,
    queue: Weak<QueueShared>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.queue.upgrade() {
            ToastQueue { shared }.lock().observers.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
#[path = "toast_test.rs"]
mod tests;
