pub mod api;
pub mod auth;
pub mod config;
pub mod navigation;
pub mod summary;

pub use api::{ApiClient, ApiResponse};
pub use auth::{AuthState, AuthStore, SessionPhase};
pub use config::ClientConfig;
pub use navigation::RouteLog;
pub use summary::{PagedList, SummaryFilters, SummaryState, SummaryStore};

pub mod prelude {
    pub use super::api::ApiClient;
    pub use super::auth::AuthStore;
    pub use super::config::ClientConfig;
    pub use super::summary::{SummaryFilters, SummaryStore};
    pub use sr_core::{ContentType, Error, Result, Route, SortKey};
}
