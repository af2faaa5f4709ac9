//! Hash router: maps `#<route>` fragments to page-level views.
//!
//! Two macro-states, driven by the store's `isAuthenticated` flag:
//!   Unauthenticated: guest routes only (login). Protected routes
//!                    redirect to `login`.
//!   Authenticated:   protected routes. Guest-only routes redirect to
//!                    `dashboard`.
//!
//! RULE: navigation never fails. Unknown routes resolve to the
//! `not-found` view; the router writes `currentView` and the store's
//! subscribers perform the page swap.

use crate::{
    config::RouteConfig,
    state::{keys, StatePatch, StateStore},
    types::{RouteName, ViewName},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const LOGIN_ROUTE: &str = "login";
pub const DASHBOARD_ROUTE: &str = "dashboard";
pub const NOT_FOUND_VIEW: &str = "not-found";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub view:          ViewName,
    pub requires_auth: bool,
    pub guest_only:    bool,
}

/// Static route table. Built once at startup.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: BTreeMap<RouteName, RouteEntry>,
}

impl RouteTable {
    pub fn from_config(routes: &[RouteConfig]) -> Self {
        let routes = routes
            .iter()
            .map(|r| {
                (
                    r.name.clone(),
                    RouteEntry {
                        view:          r.view.clone(),
                        requires_auth: r.requires_auth,
                        guest_only:    r.guest_only,
                    },
                )
            })
            .collect();
        Self { routes }
    }

    pub fn get(&self, route: &str) -> Option<&RouteEntry> {
        self.routes.get(route)
    }

    pub fn contains(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }

    /// View a route mounts, if the route exists.
    pub fn view_for(&self, route: &str) -> Option<&str> {
        self.routes.get(route).map(|e| e.view.as_str())
    }
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Navigation {
    Resolved {
        route: RouteName,
        view:  ViewName,
    },
    Redirected {
        requested: RouteName,
        route:     RouteName,
        view:      ViewName,
    },
    NotFound {
        requested: RouteName,
    },
}

impl Navigation {
    /// The view that ends up mounted.
    pub fn view(&self) -> &str {
        match self {
            Self::Resolved { view, .. } | Self::Redirected { view, .. } => view,
            Self::NotFound { .. } => NOT_FOUND_VIEW,
        }
    }

    /// The route the URL fragment shows afterwards.
    pub fn route(&self) -> &str {
        match self {
            Self::Resolved { route, .. } | Self::Redirected { route, .. } => route,
            Self::NotFound { requested } => requested,
        }
    }
}

/// The URL fragment plus a back/forward history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    history: Vec<RouteName>,
    cursor:  usize,
}

impl Location {
    /// `#/dashboard?x=1` → `dashboard`. Empty fragments yield `None`.
    pub fn parse_fragment(fragment: &str) -> Option<&str> {
        let route = fragment.trim().trim_start_matches('#').trim_start_matches('/');
        let route = route.split(['?', '/']).next().unwrap_or_default();
        if route.is_empty() {
            None
        } else {
            Some(route)
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.history.get(self.cursor).map(String::as_str)
    }

    pub fn fragment(&self) -> String {
        format!("#{}", self.current().unwrap_or_default())
    }

    /// Push a new entry, discarding any forward history.
    pub fn push(&mut self, route: &str) {
        if self.current() == Some(route) {
            return;
        }
        if !self.history.is_empty() {
            self.history.truncate(self.cursor + 1);
        }
        self.history.push(route.to_string());
        self.cursor = self.history.len() - 1;
    }

    /// Overwrite the current entry (used when a history step redirects).
    pub fn replace(&mut self, route: &str) {
        match self.history.get_mut(self.cursor) {
            Some(entry) => *entry = route.to_string(),
            None        => self.push(route),
        }
    }

    pub fn back(&mut self) -> Option<&str> {
        if self.cursor == 0 || self.history.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    pub fn forward(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.history.len() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }
}

pub struct Router {
    table:    RouteTable,
    location: Location,
}

impl Router {
    pub fn new(table: RouteTable) -> Self {
        Self {
            table,
            location: Location::default(),
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Apply the auth guards to `requested` without side effects.
    pub fn resolve(&self, authenticated: bool, requested: &str) -> Navigation {
        let Some(entry) = self.table.get(requested) else {
            return Navigation::NotFound {
                requested: requested.to_string(),
            };
        };

        let redirect_to = if entry.requires_auth && !authenticated {
            Some(LOGIN_ROUTE)
        } else if entry.guest_only && authenticated {
            Some(DASHBOARD_ROUTE)
        } else {
            None
        };

        match redirect_to.and_then(|r| self.table.get(r).map(|e| (r, e))) {
            Some((route, target)) => Navigation::Redirected {
                requested: requested.to_string(),
                route:     route.to_string(),
                view:      target.view.clone(),
            },
            None if redirect_to.is_some() => Navigation::NotFound {
                requested: requested.to_string(),
            },
            None => Navigation::Resolved {
                route: requested.to_string(),
                view:  entry.view.clone(),
            },
        }
    }

    /// Navigate to `route`: resolve, write `currentView`, push the fragment.
    pub fn navigate(&mut self, store: &mut StateStore, route: &str) -> Navigation {
        let nav = self.resolve(store.is_authenticated(), route);
        log_navigation(&nav);
        self.location.push(nav.route());
        Self::commit(store, &nav);
        nav
    }

    /// Resolve the first view from the initial URL fragment. Missing or
    /// unknown fragments land on `dashboard` or `login` depending on auth.
    pub fn initial(&mut self, store: &mut StateStore, fragment: Option<&str>) -> Navigation {
        let requested = fragment
            .and_then(Location::parse_fragment)
            .filter(|r| self.table.contains(r))
            .map(str::to_string);
        match requested {
            Some(route) => self.navigate(store, &route),
            None => {
                let landing = self.landing(store.is_authenticated());
                self.navigate(store, landing)
            }
        }
    }

    pub fn landing(&self, authenticated: bool) -> &'static str {
        if authenticated {
            DASHBOARD_ROUTE
        } else {
            LOGIN_ROUTE
        }
    }

    /// Step back in history, re-applying the guards. `None` at the start.
    pub fn back(&mut self, store: &mut StateStore) -> Option<Navigation> {
        let route = self.location.back()?.to_string();
        Some(self.revisit(store, &route))
    }

    /// Step forward in history. `None` at the end.
    pub fn forward(&mut self, store: &mut StateStore) -> Option<Navigation> {
        let route = self.location.forward()?.to_string();
        Some(self.revisit(store, &route))
    }

    fn revisit(&mut self, store: &mut StateStore, route: &str) -> Navigation {
        let nav = self.resolve(store.is_authenticated(), route);
        log_navigation(&nav);
        if nav.route() != route {
            self.location.replace(nav.route());
        }
        Self::commit(store, &nav);
        nav
    }

    fn commit(store: &mut StateStore, nav: &Navigation) {
        store.set_state(StatePatch::new().set(keys::CURRENT_VIEW, nav.view()));
    }
}

fn log_navigation(nav: &Navigation) {
    match nav {
        Navigation::Resolved { route, .. } => log::debug!("navigate → {route}"),
        Navigation::Redirected { requested, route, .. } => {
            log::info!("navigate {requested} redirected → {route}")
        }
        Navigation::NotFound { requested } => log::warn!("navigate: unknown route '{requested}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fragments() {
        assert_eq!(Location::parse_fragment("#dashboard"), Some("dashboard"));
        assert_eq!(Location::parse_fragment("#/refer?position=pos-001"), Some("refer"));
        assert_eq!(Location::parse_fragment("#"), None);
        assert_eq!(Location::parse_fragment(""), None);
    }

    #[test]
    fn push_discards_forward_history() {
        let mut loc = Location::default();
        loc.push("a");
        loc.push("b");
        loc.push("c");
        assert_eq!(loc.back(), Some("b"));
        loc.push("d");
        assert!(!loc.can_go_forward());
        assert_eq!(loc.back(), Some("b"));
        assert_eq!(loc.back(), Some("a"));
        assert!(!loc.can_go_back());
        assert!(loc.can_go_forward());
        assert_eq!(loc.back(), None);
        assert_eq!(loc.fragment(), "#a");
    }

    #[test]
    fn view_for_maps_routes_to_views() {
        let table = RouteTable::from_config(&[RouteConfig {
            name:          "home".into(),
            view:          "dashboard-page".into(),
            requires_auth: true,
            guest_only:    false,
        }]);
        assert_eq!(table.view_for("home"), Some("dashboard-page"));
        assert_eq!(table.view_for("missing"), None);
    }
}
