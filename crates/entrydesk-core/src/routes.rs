//! Route table: maps URL paths to views.
//!
//! Paths are matched literally. `/` redirects to `/login`; anything else that
//! is not in [`ROUTES`] resolves to nothing.

use std::fmt;

/// A screen of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Register,
    Login,
    EntryForm,
    Entries,
    UserDashboard,
    AdminDashboard,
}

impl View {
    /// Canonical path of this view.
    pub fn path(self) -> &'static str {
        match self {
            View::Register => "/register",
            View::Login => "/login",
            View::EntryForm => "/entry-form",
            View::Entries => "/entries",
            View::UserDashboard => "/user-dashboard",
            View::AdminDashboard => "/admin-dashboard",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            View::Register => "Register",
            View::Login => "Login",
            View::EntryForm => "EntryForm",
            View::Entries => "Entries",
            View::UserDashboard => "UserDashboard",
            View::AdminDashboard => "AdminDashboard",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a route points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    View(View),
    Redirect(&'static str),
}

/// The route table, in match order.
pub const ROUTES: &[(&str, RouteTarget)] = &[
    ("/register", RouteTarget::View(View::Register)),
    ("/login", RouteTarget::View(View::Login)),
    ("/entry-form", RouteTarget::View(View::EntryForm)),
    ("/entries", RouteTarget::View(View::Entries)),
    ("/user-dashboard", RouteTarget::View(View::UserDashboard)),
    ("/admin-dashboard", RouteTarget::View(View::AdminDashboard)),
    ("/", RouteTarget::Redirect("/login")),
];

fn lookup(path: &str) -> Option<RouteTarget> {
    ROUTES
        .iter()
        .find(|(route, _)| *route == path)
        .map(|(_, target)| *target)
}

/// Resolves `path` to its canonical path and view, following redirects.
///
/// Returns `None` for unmatched paths and for redirect chains that never
/// reach a view.
pub fn canonicalize(path: &str) -> Option<(&'static str, View)> {
    let mut target = lookup(path)?;
    for _ in 0..ROUTES.len() {
        match target {
            RouteTarget::View(view) => return Some((view.path(), view)),
            RouteTarget::Redirect(next) => target = lookup(next)?,
        }
    }
    None
}

/// The view rendered for `path`, if any.
pub fn resolve(path: &str) -> Option<View> {
    canonicalize(path).map(|(_, view)| view)
}

/// History-mode navigation: locations change without a server round trip.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    history: Vec<&'static str>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigates to `path`. Redirects record their target; unmatched paths
    /// leave the history untouched and return `None`.
    pub fn push(&mut self, path: &str) -> Option<View> {
        let (canonical, view) = canonicalize(path)?;
        if self.history.last() != Some(&canonical) {
            self.history.push(canonical);
        }
        Some(view)
    }

    /// Goes back one location. Returns the view now shown, or `None` if
    /// there was nothing to go back to.
    pub fn back(&mut self) -> Option<View> {
        if self.history.len() < 2 {
            return None;
        }
        self.history.pop();
        self.current()
    }

    pub fn current(&self) -> Option<View> {
        self.history.last().and_then(|path| resolve(path))
    }

    pub fn current_path(&self) -> Option<&'static str> {
        self.history.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_view_route_round_trips() {
        for (path, target) in ROUTES {
            if let RouteTarget::View(view) = target {
                assert_eq!(view.path(), *path);
                assert_eq!(resolve(path), Some(*view));
            }
        }
    }

    #[test]
    fn test_root_redirects_to_login() {
        assert_eq!(resolve("/"), resolve("/login"));
        assert_eq!(canonicalize("/"), Some(("/login", View::Login)));
    }

    #[test]
    fn test_unmatched_paths_resolve_to_nothing() {
        assert_eq!(resolve("/nope"), None);
        assert_eq!(resolve("/entries/5"), None);
        assert_eq!(resolve("/login/"), None);
        assert_eq!(resolve(""), None);
    }

    #[test]
    fn test_navigator_records_redirect_target() {
        let mut nav = Navigator::new();
        assert_eq!(nav.push("/"), Some(View::Login));
        assert_eq!(nav.current_path(), Some("/login"));
    }

    #[test]
    fn test_navigator_back() {
        let mut nav = Navigator::new();
        nav.push("/login");
        nav.push("/entries");
        nav.push("/entry-form");
        assert_eq!(nav.back(), Some(View::Entries));
        assert_eq!(nav.back(), Some(View::Login));
        assert_eq!(nav.back(), None);
        assert_eq!(nav.current(), Some(View::Login));
    }

    #[test]
    fn test_navigator_ignores_unmatched_and_repeats() {
        let mut nav = Navigator::new();
        nav.push("/login");
        assert_eq!(nav.push("/missing"), None);
        nav.push("/");
        assert_eq!(nav.current(), Some(View::Login));
        assert_eq!(nav.back(), None);
    }
}
