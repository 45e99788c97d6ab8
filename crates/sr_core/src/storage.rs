use async_trait::async_trait;

use crate::Result;

/// Key the access token is stored under.
pub const ACCESS_TOKEN: &str = "access_token";
/// Key the refresh token is stored under.
pub const REFRESH_TOKEN: &str = "refresh_token";

/// Key/value persistence for session tokens, the native counterpart of
/// the browser's localStorage.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` if present
    async fn remove(&self, key: &str) -> Result<()>;
}
