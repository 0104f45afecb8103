//! Application context.
//!
//! DESIGN
//! ======
//! `AppContext` is built once at startup and handed to every surface that
//! needs the session, the toast queue, or the guard. Clone is cheap; the
//! stateful parts are `Arc`-backed and share one underlying instance, so
//! the guard and the session always observe the same state.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::api::{ApiError, HttpApi};
use crate::config::ClientConfig;
use crate::router::RouteGuard;
use crate::router::routes::app_routes;
use crate::session::{Navigator, SessionStore};
use crate::storage::KeyValueStore;
use crate::theme::{self, Theme};
use crate::toast::ToastQueue;

#[derive(Clone)]
pub struct AppContext {
    pub config: ClientConfig,
    pub storage: Arc<dyn KeyValueStore>,
    /// Concrete client, for the admin endpoints that are not part of `AuthApi`.
    pub http: Arc<HttpApi>,
    pub session: SessionStore,
    pub toasts: ToastQueue,
    pub guard: RouteGuard,
    theme: Arc<Mutex<Theme>>,
}

impl AppContext {
    /// Wire the client together. The session is rehydrated from `storage`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = Arc::new(HttpApi::new(&config)?);
        let session = SessionStore::open(Arc::clone(&storage), http.clone(), navigator);
        let toasts = ToastQueue::new(config.toast_duration);
        let guard = RouteGuard::new(Arc::new(app_routes()), session.clone(), toasts.clone());
        let theme = theme::read_preference(&*storage, config.prefers_dark);

        info!(
            base_url = http.base_url(),
            authenticated = session.is_authenticated(),
            %theme,
            "client context ready"
        );
        Ok(Self { config, storage, http, session, toasts, guard, theme: Arc::new(Mutex::new(theme)) })
    }

    fn theme_lock(&self) -> MutexGuard<'_, Theme> {
        self.theme.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        *self.theme_lock()
    }

    /// Set and persist the theme.
    pub fn set_theme(&self, theme: Theme) {
        let mut current = self.theme_lock();
        theme::save_preference(&*self.storage, theme);
        *current = theme;
    }

    pub fn toggle_theme(&self) -> Theme {
        let mut current = self.theme_lock();
        *current = theme::toggle(&*self.storage, *current);
        *current
    }

    /// Token of the current session, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session.identity().map(|identity| identity.token)
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
