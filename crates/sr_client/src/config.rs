use std::env;

const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Where to find the summarization service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    /// Read the server location from `SERVER_URL`, falling back to the
    /// local development default.
    pub fn from_env() -> Self {
        let base_url =
            env::var("SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        Self { base_url }
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
