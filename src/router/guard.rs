//! Navigation guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs before every navigation. Reads the session's cached snapshot and
//! the matched route chain, then allows the navigation or rewrites it to
//! the login or home route. Guarded views that need a fresh answer call
//! `SessionStore::check_auth` themselves after they load.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::routes::{HOME_ROUTE, LOGIN_ROUTE};
use super::{Location, Redirect, RouteMeta, RouteTable, RouteTarget};
use crate::identity::{Identity, SessionSnapshot};
use crate::session::SessionStore;
use crate::toast::ToastQueue;

/// Redirect hops followed before a navigation is declared a loop.
pub const MAX_REDIRECTS: usize = 8;

pub const ADMIN_DENIED_MESSAGE: &str = "You do not have permission to access admin pages";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
    RedirectToHome,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("not an app location: {0}")]
    InvalidLocation(String),

    #[error("redirect target `{0}` is not a static route")]
    UnknownRoute(&'static str),

    #[error("navigation to {requested} exceeded {MAX_REDIRECTS} redirects")]
    RedirectLoop { requested: String },
}

/// Where a navigation ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub requested: String,
    pub path: String,
    pub route: &'static str,
    pub view: &'static str,
    pub params: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    /// True when the final location differs from the requested one.
    pub redirected: bool,
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    table: std::sync::Arc<RouteTable>,
    session: SessionStore,
    toasts: ToastQueue,
}

impl RouteGuard {
    #[must_use]
    pub fn new(table: std::sync::Arc<RouteTable>, session: SessionStore, toasts: ToastQueue) -> Self {
        Self { table, session, toasts }
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Pure access decision for a matched chain's metadata.
    #[must_use]
    pub fn decide(metas: &[RouteMeta], snapshot: &SessionSnapshot) -> GuardDecision {
        if metas.iter().any(|m| m.requires_auth) && !snapshot.is_authenticated() {
            return GuardDecision::RedirectToLogin;
        }
        if metas.iter().any(|m| m.requires_admin) && !snapshot.is_admin() {
            return GuardDecision::RedirectToHome;
        }
        GuardDecision::Allow
    }

    /// Resolve and guard a navigation to `raw`, following redirects.
    ///
    /// # Errors
    ///
    /// Returns an error for locations outside the app, redirects to routes
    /// with params, or redirect chains longer than [`MAX_REDIRECTS`].
    pub fn before_each(&self, raw: &str) -> Result<Navigation, NavigationError> {
        let snapshot = self.session.snapshot();
        let mut location = Location::parse(raw).ok_or_else(|| NavigationError::InvalidLocation(raw.to_owned()))?;

        for hop in 0..=MAX_REDIRECTS {
            let next: &'static str = match self.table.resolve(&location.path) {
                None => {
                    debug!(path = %location.path, "no route matched");
                    self.table.fallback()
                }
                Some(matched) => {
                    let route = matched.route();
                    match route.target {
                        RouteTarget::Redirect(Redirect::To(name)) => name,
                        RouteTarget::Redirect(Redirect::BySession { authenticated, anonymous }) => {
                            if snapshot.is_authenticated() { authenticated } else { anonymous }
                        }
                        RouteTarget::View(view) => match Self::decide(&matched.metas(), &snapshot) {
                            GuardDecision::Allow => {
                                return Ok(Navigation {
                                    requested: raw.to_owned(),
                                    path: location.path,
                                    route: route.name,
                                    view,
                                    params: matched.params,
                                    query: location.query,
                                    redirected: hop > 0,
                                });
                            }
                            GuardDecision::RedirectToLogin => {
                                debug!(path = %location.path, "authentication required");
                                LOGIN_ROUTE
                            }
                            GuardDecision::RedirectToHome => {
                                self.deny_admin(snapshot.identity.as_ref(), &location.path);
                                HOME_ROUTE
                            }
                        },
                    }
                }
            };

            let path = self.table.path_for(next).ok_or(NavigationError::UnknownRoute(next))?;
            location = Location { path, query: BTreeMap::new() };
        }

        Err(NavigationError::RedirectLoop { requested: raw.to_owned() })
    }

    fn deny_admin(&self, identity: Option<&Identity>, path: &str) {
        warn!(user = identity.map_or("anonymous", Identity::label), path, "admin page denied");
        self.toasts.warning(ADMIN_DENIED_MESSAGE);
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
