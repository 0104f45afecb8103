//! Session store: who is signed in on this client.
//!
//! SYSTEM CONTEXT
//! ==============
//! One `SessionStore` exists per running client, created by
//! [`crate::context::AppContext`] and cloned into whatever needs it. It
//! persists the identity under the `user` storage key, rehydrates it at
//! startup, and broadcasts a [`SessionSnapshot`] on every change.
//!
//! DESIGN
//! ======
//! Every login and logout bumps an epoch and rotates a cancellation token.
//! Async work (role lookup, verification) captures both before suspending;
//! on completion it applies its result only if the epoch is still current,
//! under the same lock acquisition that performs the write. A lookup that
//! finishes after a logout therefore cannot bring the old identity back.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here retries and nothing returns a typed error to callers. Any
//! verification failure, whether transport, status, or decode, logs out.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::AuthApi;
use crate::identity::{Identity, Role, SessionSnapshot};
use crate::storage::{KeyValueStore, StorageError, load_json, save_json};

/// Storage key holding the serialized identity.
pub const USER_KEY: &str = "user";
/// Where `logout` sends the user.
pub const LOGIN_PATH: &str = "/login";

// =============================================================================
// NAVIGATOR
// =============================================================================

/// Navigation side effect used by the session on logout.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator that records every requested path.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<String>> {
        self.history
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.entries().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.entries().last().cloned()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, path: &str) {
        debug!(path, "navigate");
        self.entries().push(path.to_owned());
    }
}

// =============================================================================
// SESSION STORE
// =============================================================================

struct SessionInner {
    identity: Option<Identity>,
    epoch: u64,
    cancel: CancellationToken,
}

impl SessionInner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot { identity: self.identity.clone(), epoch: self.epoch }
    }

    /// Start a new epoch and cancel everything tied to the previous one.
    fn advance(&mut self) -> (u64, CancellationToken) {
        self.cancel.cancel();
        self.epoch += 1;
        self.cancel = CancellationToken::new();
        (self.epoch, self.cancel.clone())
    }
}

struct Shared {
    inner: Mutex<SessionInner>,
    storage: Arc<dyn KeyValueStore>,
    api: Arc<dyn AuthApi>,
    navigator: Arc<dyn Navigator>,
    snapshots: watch::Sender<SessionSnapshot>,
}

/// Shared handle to the client session. Clone is cheap.
#[derive(Clone)]
pub struct SessionStore {
    shared: Arc<Shared>,
}

impl SessionStore {
    /// Open the session, rehydrating any identity persisted by a previous run.
    ///
    /// A stored value that does not decode into an [`Identity`] is deleted
    /// and the session starts logged out.
    pub fn open(storage: Arc<dyn KeyValueStore>, api: Arc<dyn AuthApi>, navigator: Arc<dyn Navigator>) -> Self {
        let identity = rehydrate(storage.as_ref());
        match &identity {
            Some(identity) => info!(user = identity.label(), role = ?identity.role, "session restored"),
            None => debug!("no stored session"),
        }

        let inner = SessionInner { identity, epoch: 0, cancel: CancellationToken::new() };
        let (snapshots, _) = watch::channel(inner.snapshot());
        Self { shared: Arc::new(Shared { inner: Mutex::new(inner), storage, api, navigator, snapshots }) }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn persist(&self, identity: &Identity) {
        if let Err(e) = save_json(self.shared.storage.as_ref(), USER_KEY, identity) {
            error!(error = %e, "failed to persist session");
        }
    }

    fn publish(&self, inner: &SessionInner) {
        self.shared.snapshots.send_replace(inner.snapshot());
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.lock().identity.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().identity.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.lock().identity.as_ref().is_some_and(Identity::is_admin)
    }

    /// Receive a snapshot after every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshots.subscribe()
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Sign `identity` in and persist it.
    ///
    /// When the identity carries no role, a background lookup against the
    /// verify endpoint is spawned and its handle returned. The lookup is
    /// best effort: failures are logged and the login stands.
    pub fn login(&self, identity: Identity) -> Option<JoinHandle<()>> {
        let lookup = identity.role.is_none().then(|| identity.token.clone());
        let (epoch, cancel) = {
            let mut inner = self.lock();
            let advanced = inner.advance();
            self.persist(&identity);
            info!(user = identity.label(), role = ?identity.role, epoch = advanced.0, "login");
            inner.identity = Some(identity);
            self.publish(&inner);
            advanced
        };

        let token = lookup?;
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime; skipping role lookup");
            return None;
        };
        let store = self.clone();
        Some(runtime.spawn(async move { store.lookup_role(epoch, token, cancel).await }))
    }

    /// Sign out: clear memory and storage, then navigate to the login view.
    pub fn logout(&self) {
        {
            let mut inner = self.lock();
            self.clear_locked(&mut inner);
        }
        self.shared.navigator.navigate(LOGIN_PATH);
    }

    fn clear_locked(&self, inner: &mut SessionInner) {
        let (epoch, _) = inner.advance();
        let previous = inner.identity.take();
        if let Err(e) = self.shared.storage.remove(USER_KEY) {
            error!(error = %e, "failed to remove stored session");
        }
        info!(user = previous.as_ref().map_or("none", Identity::label), epoch, "logout");
        self.publish(inner);
    }

    /// Log out only if no login/logout happened since `epoch`.
    fn logout_if_current(&self, epoch: u64) -> bool {
        {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                debug!(epoch, current = inner.epoch, "stale logout skipped");
                return false;
            }
            self.clear_locked(&mut inner);
        }
        self.shared.navigator.navigate(LOGIN_PATH);
        true
    }

    /// Merge `role` into the identity if it is still the session of `epoch`
    /// and still lacks a role. Returns whether anything changed.
    fn merge_role(&self, inner: &mut SessionInner, epoch: u64, role: &Role) -> bool {
        if inner.epoch != epoch {
            debug!(epoch, current = inner.epoch, "stale role update discarded");
            return false;
        }
        let Some(identity) = inner.identity.as_mut() else {
            return false;
        };
        if identity.role.is_some() {
            return false;
        }
        identity.role = Some(role.clone());
        let identity = identity.clone();
        self.persist(&identity);
        info!(user = identity.label(), %role, "role merged");
        self.publish(inner);
        true
    }

    async fn lookup_role(&self, epoch: u64, token: String, cancel: CancellationToken) {
        let result = tokio::select! {
            () = cancel.cancelled() => {
                debug!(epoch, "role lookup cancelled");
                return;
            }
            result = self.shared.api.verify(&token) => result,
        };

        match result {
            Ok(resp) => match resp.confirmed_role() {
                Some(role) => {
                    let mut inner = self.lock();
                    self.merge_role(&mut inner, epoch, role);
                }
                None => debug!(epoch, "role lookup returned no role"),
            },
            Err(e) => warn!(error = %e, status = ?e.status(), "role lookup failed"),
        }
    }

    /// Revalidate the cached token against the backend.
    ///
    /// Returns `false` without a request when nobody is signed in. Any
    /// failure logs the session out. A verification whose session was
    /// replaced while it was in flight has no effect and returns `false`.
    pub async fn check_auth(&self) -> bool {
        let (epoch, token, cancel) = {
            let inner = self.lock();
            match inner.identity.as_ref() {
                Some(identity) if !identity.token.is_empty() => {
                    (inner.epoch, identity.token.clone(), inner.cancel.clone())
                }
                _ => return false,
            }
        };

        let result = tokio::select! {
            () = cancel.cancelled() => {
                debug!(epoch, "verification cancelled");
                return false;
            }
            result = self.shared.api.verify(&token) => result,
        };

        match result {
            Ok(resp) => {
                let mut inner = self.lock();
                if inner.epoch != epoch {
                    debug!(epoch, current = inner.epoch, "verification outlived its session");
                    return false;
                }
                if let Some(role) = resp.confirmed_role() {
                    self.merge_role(&mut inner, epoch, role);
                }
                true
            }
            Err(e) => {
                warn!(error = %e, status = ?e.status(), "session verification failed");
                self.logout_if_current(epoch);
                false
            }
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("SessionStore")
            .field("authenticated", &snapshot.is_authenticated())
            .field("epoch", &snapshot.epoch)
            .finish_non_exhaustive()
    }
}

fn rehydrate(storage: &dyn KeyValueStore) -> Option<Identity> {
    match load_json::<Identity>(storage, USER_KEY) {
        Ok(identity) => identity,
        Err(e @ (StorageError::Decode { .. } | StorageError::Corrupt { .. })) => {
            warn!(error = %e, "discarding malformed stored session");
            if let Err(e) = storage.remove(USER_KEY) {
                error!(error = %e, "failed to remove malformed session");
            }
            None
        }
        Err(e) => {
            warn!(error = %e, "session storage unreadable; starting logged out");
            None
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
