//! Client-side route table and navigation guard.
//!
//! DESIGN
//! ======
//! Routes are a static tree of [`RouteDescriptor`]s built once at startup.
//! Resolving a path yields the matched chain (ancestors first) so metadata
//! declared on a parent applies to every child. The guard in [`guard`] only
//! reads the cached session snapshot; it never waits on the backend.

pub mod guard;
pub mod routes;

use std::collections::BTreeMap;

use reqwest::Url;

pub use guard::{GuardDecision, Navigation, NavigationError, RouteGuard};

/// Per-route access requirements. Inherited by nested children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_admin: bool,
}

/// Where a redirect route sends the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// Always go to the named route.
    To(&'static str),
    /// Pick a named route from the cached session.
    BySession { authenticated: &'static str, anonymous: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    View(&'static str),
    Redirect(Redirect),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub name: &'static str,
    /// Pattern relative to the parent. `:name` segments capture a param.
    pub path: &'static str,
    pub target: RouteTarget,
    pub meta: RouteMeta,
    pub children: Vec<RouteDescriptor>,
}

impl RouteDescriptor {
    #[must_use]
    pub fn view(name: &'static str, path: &'static str, view: &'static str) -> Self {
        Self { name, path, target: RouteTarget::View(view), meta: RouteMeta::default(), children: Vec::new() }
    }

    #[must_use]
    pub fn redirect(name: &'static str, path: &'static str, redirect: Redirect) -> Self {
        Self { name, path, target: RouteTarget::Redirect(redirect), meta: RouteMeta::default(), children: Vec::new() }
    }

    #[must_use]
    pub fn requires_auth(mut self) -> Self {
        self.meta.requires_auth = true;
        self
    }

    /// Admin-only. Also requires authentication.
    #[must_use]
    pub fn requires_admin(mut self) -> Self {
        self.meta.requires_auth = true;
        self.meta.requires_admin = true;
        self
    }

    #[must_use]
    pub fn child(mut self, child: RouteDescriptor) -> Self {
        self.children.push(child);
        self
    }

    fn segments(&self) -> impl Iterator<Item = &'static str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}

/// A successful path resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Matched records, outermost first. The last one is the target.
    pub chain: Vec<&'a RouteDescriptor>,
    pub params: BTreeMap<String, String>,
}

impl<'a> RouteMatch<'a> {
    #[must_use]
    pub fn route(&self) -> &'a RouteDescriptor {
        // A match always holds at least one record.
        self.chain[self.chain.len() - 1]
    }

    #[must_use]
    pub fn metas(&self) -> Vec<RouteMeta> {
        self.chain.iter().map(|r| r.meta).collect()
    }
}

/// Requested location split into path and query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl Location {
    /// Parse an app-relative location such as `/view-form?id=3&mode=edit`.
    ///
    /// Returns `None` for input that cannot be read as a URL path.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let base = Url::parse("http://app.invalid/").ok()?;
        let url = base.join(raw.trim()).ok()?;
        if url.host_str() != Some("app.invalid") {
            return None;
        }
        let query = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        Some(Self { path: url.path().to_owned(), query })
    }
}

/// Immutable route tree plus the fallback for unmatched paths.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    fallback: &'static str,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<RouteDescriptor>, fallback: &'static str) -> Self {
        Self { routes, fallback }
    }

    /// Route name used when nothing matches.
    #[must_use]
    pub fn fallback(&self) -> &'static str {
        self.fallback
    }

    #[must_use]
    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// Match `path` against the table. Routes are tried in declaration order.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.routes.iter().find_map(|route| {
            let mut chain = Vec::new();
            let mut params = BTreeMap::new();
            if match_route(route, &segments, &mut chain, &mut params) {
                Some(RouteMatch { chain, params })
            } else {
                None
            }
        })
    }

    /// Absolute path of the named route, if it has no params.
    #[must_use]
    pub fn path_for(&self, name: &str) -> Option<String> {
        fn walk(routes: &[RouteDescriptor], prefix: &[&'static str], name: &str) -> Option<String> {
            for route in routes {
                let mut segs = prefix.to_vec();
                segs.extend(route.segments());
                if route.name == name {
                    if segs.iter().any(|s| s.starts_with(':')) {
                        return None;
                    }
                    return Some(format!("/{}", segs.join("/")));
                }
                if let Some(found) = walk(&route.children, &segs, name) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.routes, &[], name)
    }
}

fn match_route<'a>(
    route: &'a RouteDescriptor,
    segments: &[&str],
    chain: &mut Vec<&'a RouteDescriptor>,
    params: &mut BTreeMap<String, String>,
) -> bool {
    let pattern: Vec<&str> = route.segments().collect();
    if segments.len() < pattern.len() {
        return false;
    }
    let mut captured = Vec::new();
    for (pat, seg) in pattern.iter().zip(segments) {
        if let Some(param) = pat.strip_prefix(':') {
            captured.push((param.to_owned(), (*seg).to_owned()));
        } else if pat != seg {
            return false;
        }
    }

    let rest = &segments[pattern.len()..];
    chain.push(route);
    if rest.is_empty() {
        params.extend(captured);
        return true;
    }
    for child in &route.children {
        let mark = chain.len();
        let mut child_params = BTreeMap::new();
        if match_route(child, rest, chain, &mut child_params) {
            params.extend(captured);
            params.extend(child_params);
            return true;
        }
        chain.truncate(mark);
    }
    chain.pop();
    false
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
