//! Backend configuration and client selection
//!
//! Every option is optional. When the backend URL or key is missing the
//! application runs against the offline client instead of failing.

use std::sync::Arc;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{error::StoreResult, offline::OfflineClient, rest::SupabaseClient, store::Backend};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REDIRECT_URL: &str = "http://localhost:5173/auth/callback";

/// Backend configuration struct
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BackendConfig {
    /// Hosted backend base URL
    #[serde(default)]
    pub supabase_url: Option<String>,
    /// Anonymous (public) API key
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    /// Key for the assistant integration
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    /// HTTP timeout in seconds
    #[serde(default)]
    pub backend_timeout_secs: Option<u64>,
    /// Where the OAuth provider sends the user back to
    #[serde(default)]
    pub auth_redirect_url: Option<String>,
}

impl BackendConfig {
    /// Create a new BackendConfig from an optional `gogirl.*` file and the environment
    ///
    /// # Environment Variables
    /// - `SUPABASE_URL`: backend base URL
    /// - `SUPABASE_ANON_KEY`: anonymous API key
    /// - `GEMINI_API_KEY`: assistant API key
    /// - `BACKEND_TIMEOUT_SECS`: HTTP timeout in seconds (default: 10)
    /// - `AUTH_REDIRECT_URL`: OAuth redirect target
    pub fn from_env() -> StoreResult<Self> {
        let config: BackendConfig = Config::builder()
            .add_source(File::with_name("gogirl").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        Ok(config.normalized())
    }

    /// Treat blank values as absent
    fn normalized(self) -> Self {
        fn non_blank(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            supabase_url: non_blank(self.supabase_url).map(|u| u.trim_end_matches('/').to_string()),
            supabase_anon_key: non_blank(self.supabase_anon_key),
            gemini_api_key: non_blank(self.gemini_api_key),
            backend_timeout_secs: self.backend_timeout_secs,
            auth_redirect_url: non_blank(self.auth_redirect_url),
        }
    }

    /// Both URL and key are present
    pub fn is_backend_configured(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_anon_key.is_some()
    }

    pub fn is_assistant_configured(&self) -> bool {
        self.gemini_api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn redirect_url(&self) -> &str {
        self.auth_redirect_url
            .as_deref()
            .unwrap_or(DEFAULT_REDIRECT_URL)
    }
}

/// Pick the backend implementation for this configuration
///
/// Falls back to [`OfflineClient`] when the backend is not configured or
/// the real client cannot be built.
pub fn connect(config: &BackendConfig) -> Arc<dyn Backend> {
    if !config.is_backend_configured() {
        warn!("Backend URL or anon key missing, running with the offline client");
        return Arc::new(OfflineClient::new());
    }

    match SupabaseClient::new(config) {
        Ok(client) => {
            info!("Backend client initialized for {}", client.base_url());
            Arc::new(client)
        }
        Err(e) => {
            warn!(
                "Failed to initialize backend client, running offline: {}",
                e
            );
            Arc::new(OfflineClient::new())
        }
    }
}
