use std::sync::Arc;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use sr_core::{
    Error, Navigator, Result, Route, TokenPair, TokenStorage, User, ACCESS_TOKEN, REFRESH_TOKEN,
};

use crate::api::ApiClient;
use crate::summary::SummaryStore;

const LOGIN_URL: &str = "/auth/login/";
const REGISTER_URL: &str = "/auth/register/";
const REFRESH_URL: &str = "/auth/token/refresh/";
const ME_URL: &str = "/auth/user/me/";

/// The only claim the client reads. Signatures are never verified here;
/// knowing when to refresh is all the expiry is used for.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: i64,
}

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Initializing,
    Authenticated,
}

/// Observable session state.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub loading: bool,
    pub init_loading: bool,
    pub user: Option<User>,
}

impl AuthState {
    pub fn phase(&self) -> SessionPhase {
        if self.user.is_some() {
            SessionPhase::Authenticated
        } else if self.init_loading {
            SessionPhase::Initializing
        } else {
            SessionPhase::Anonymous
        }
    }
}

/// Session manager: owns the token lifecycle and the signed-in profile.
pub struct AuthStore {
    api: Arc<ApiClient>,
    storage: Arc<dyn TokenStorage>,
    navigator: Arc<dyn Navigator>,
    summaries: Arc<SummaryStore>,
    state: RwLock<AuthState>,
}

impl AuthStore {
    pub fn new(
        api: Arc<ApiClient>,
        storage: Arc<dyn TokenStorage>,
        navigator: Arc<dyn Navigator>,
        summaries: Arc<SummaryStore>,
    ) -> Self {
        Self {
            api,
            storage,
            navigator,
            summaries,
            state: RwLock::new(AuthState {
                init_loading: true,
                ..AuthState::default()
            }),
        }
    }

    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    /// Exchange credentials for a session. On success the token pair is
    /// persisted, the profile is populated and the interface moves to
    /// the panel; on failure nothing about the session changes.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        let payload = json!({ "username": username, "password": password });
        self.state.write().await.loading = true;

        let outcome = self.api.send(Method::POST, LOGIN_URL, Some(&payload)).await;
        let response = match outcome {
            Ok(response) if response.ok() => response,
            _ => {
                self.state.write().await.loading = false;
                return Ok(false);
            }
        };

        let stored = self.store_session(&response.body).await;
        self.state.write().await.loading = false;
        let stored = stored?;
        if stored {
            info!("Signed in as {}", username);
            self.navigator.navigate(Route::Panel);
        }
        Ok(stored)
    }

    /// Create an account. The service signs the new user straight in, so
    /// this persists tokens and lands on the panel exactly like login.
    pub async fn register(&self, email: &str, username: &str, password: &str) -> Result<bool> {
        let payload = json!({
            "email": email,
            "username": username,
            "password": password,
        });
        self.state.write().await.loading = true;

        let outcome = self
            .api
            .send(Method::POST, REGISTER_URL, Some(&payload))
            .await;
        let response = match outcome {
            Ok(response) if response.ok() => response,
            _ => {
                self.state.write().await.loading = false;
                return Ok(false);
            }
        };

        let stored = self.store_session(&response.body).await;
        self.state.write().await.loading = false;
        let stored = stored?;
        if stored {
            info!("Registered {}", username);
            self.navigator.navigate(Route::Panel);
        }
        Ok(stored)
    }

    /// One refresh attempt, no retries. Failure is terminal: the session
    /// is cleared and the interface goes back to the landing view.
    pub async fn refresh_token(&self) -> Result<bool> {
        let Some(refresh) = self.storage.get(REFRESH_TOKEN).await? else {
            return Ok(false);
        };

        let payload = json!({ "refresh": refresh });
        let outcome = self
            .api
            .send(Method::POST, REFRESH_URL, Some(&payload))
            .await;
        let response = match outcome {
            Ok(response) if response.ok() => response,
            _ => {
                self.clear_auth().await;
                self.navigator.navigate(Route::Landing);
                return Ok(false);
            }
        };

        match response.body.get("access").and_then(Value::as_str) {
            Some(access) if !access.is_empty() => {
                self.storage.set(ACCESS_TOKEN, access).await?;
                debug!("Access token refreshed");
                Ok(true)
            }
            _ => {
                warn!("Refresh response carried no access token");
                self.clear_auth().await;
                self.navigator.navigate(Route::Landing);
                Ok(false)
            }
        }
    }

    /// Check the stored access token's expiry, refreshing when it has
    /// passed. No token at all is simply invalid, with no side effects.
    pub async fn is_token_valid(&self) -> Result<bool> {
        let Some(token) = self.storage.get(ACCESS_TOKEN).await? else {
            return Ok(false);
        };

        let exp = match decode_expiry(&token) {
            Ok(exp) => exp,
            Err(e) => {
                debug!("Could not decode access token: {}", e);
                return self.refresh_token().await;
            }
        };

        if exp < chrono::Utc::now().timestamp() {
            self.refresh_token().await
        } else {
            Ok(true)
        }
    }

    /// Startup sequence: validate or refresh the token, load the profile,
    /// then settle the interface on the right view. A session that cannot
    /// be proven valid is dropped entirely.
    pub async fn init(&self) -> Result<()> {
        if !self.is_token_valid().await? {
            self.clear_auth().await;
            self.state.write().await.init_loading = false;
            return Ok(());
        }

        let outcome = self.api.send(Method::GET, ME_URL, None).await;
        let response = match outcome {
            Ok(response) if response.ok() => response,
            _ => {
                self.clear_auth().await;
                self.state.write().await.init_loading = false;
                // kicked back to login, unless already on an auth view
                if !self.navigator.current().is_auth() {
                    self.navigator.navigate(Route::Login);
                }
                return Ok(());
            }
        };

        let user = User::from_value(response.body.get("user").unwrap_or(&Value::Null));
        {
            let mut state = self.state.write().await;
            state.user = Some(user);
            state.init_loading = false;
        }
        if self.navigator.current().is_anonymous_only() {
            self.navigator.navigate(Route::Panel);
        }
        Ok(())
    }

    /// Drop the session and every piece of loaded content, then return
    /// to the landing view. Never fails; a broken token store still ends
    /// the session locally.
    pub async fn logout(&self) {
        self.clear_auth().await;
        self.summaries.reset_state().await;
        self.navigator.navigate(Route::Landing);
    }

    /// Profile fetch with a cache: an already-loaded user is returned
    /// without a round trip, and an anonymous client stays offline.
    pub async fn fetch_user(&self) -> Result<Option<User>> {
        if let Some(user) = self.state.read().await.user.clone() {
            return Ok(Some(user));
        }
        if self.storage.get(ACCESS_TOKEN).await?.is_none() {
            return Ok(None);
        }

        self.state.write().await.loading = true;
        let outcome = self.api.send(Method::GET, ME_URL, None).await;
        let response = match outcome {
            Ok(response) if response.ok() => response,
            _ => {
                self.state.write().await.loading = false;
                return Ok(None);
            }
        };

        let user = User::from_value(response.body.get("user").unwrap_or(&Value::Null));
        let mut state = self.state.write().await;
        state.user = Some(user.clone());
        state.loading = false;
        Ok(Some(user))
    }

    async fn store_session(&self, body: &Value) -> Result<bool> {
        let tokens = body.get("tokens").unwrap_or(&Value::Null);
        let Some(pair) = TokenPair::from_value(tokens) else {
            warn!("Auth response carried no usable token pair");
            return Ok(false);
        };
        self.storage.set(ACCESS_TOKEN, &pair.access).await?;
        self.storage.set(REFRESH_TOKEN, &pair.refresh).await?;

        let user = User::from_value(body.get("user").unwrap_or(&Value::Null));
        self.state.write().await.user = Some(user);
        Ok(true)
    }

    async fn clear_auth(&self) {
        if let Err(e) = self.storage.remove(ACCESS_TOKEN).await {
            warn!("Failed to drop access token: {}", e);
        }
        if let Err(e) = self.storage.remove(REFRESH_TOKEN).await {
            warn!("Failed to drop refresh token: {}", e);
        }
        self.state.write().await.user = None;
    }
}

/// Read `exp` out of a JWT without verifying it. The server remains the
/// only party that checks signatures.
fn decode_expiry(token: &str) -> Result<i64> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| Error::Token(e.to_string()))?;
    Ok(data.claims.exp)
}
