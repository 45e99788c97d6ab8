use std::fmt;

/// Views the client can ask the interface to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Register,
    Panel,
    Summary(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::Login => "/auth/login".to_string(),
            Route::Register => "/auth/register".to_string(),
            Route::Panel => "/panel".to_string(),
            Route::Summary(id) => format!("/summary/{}", id),
        }
    }

    /// True for the login and register views, where a failed session
    /// check must not bounce the user away.
    pub fn is_auth(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    /// True for views a signed-in user has no business on.
    pub fn is_anonymous_only(&self) -> bool {
        matches!(self, Route::Landing | Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Routing seam the stores emit navigation intents through.
pub trait Navigator: Send + Sync {
    /// Route the interface is currently on
    fn current(&self) -> Route;

    /// Ask the interface to move to `route`
    fn navigate(&self, route: Route);
}
