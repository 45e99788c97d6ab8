use std::sync::RwLock;

use sr_core::{Navigator, Route};

/// Navigator that records every intent it is handed. Backs the terminal
/// client, where "navigation" means remembering where the app would be,
/// and doubles as the observer in tests.
#[derive(Debug)]
pub struct RouteLog {
    inner: RwLock<State>,
}

#[derive(Debug)]
struct State {
    current: Route,
    history: Vec<Route>,
}

impl RouteLog {
    pub fn new() -> Self {
        Self::starting_at(Route::Landing)
    }

    pub fn starting_at(route: Route) -> Self {
        Self {
            inner: RwLock::new(State {
                current: route,
                history: Vec::new(),
            }),
        }
    }

    /// Every route navigated to, oldest first.
    pub fn history(&self) -> Vec<Route> {
        self.inner.read().unwrap().history.clone()
    }

    pub fn last(&self) -> Option<Route> {
        self.inner.read().unwrap().history.last().cloned()
    }
}

impl Default for RouteLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for RouteLog {
    fn current(&self) -> Route {
        self.inner.read().unwrap().current.clone()
    }

    fn navigate(&self, route: Route) {
        let mut inner = self.inner.write().unwrap();
        inner.current = route.clone();
        inner.history.push(route);
    }
}
