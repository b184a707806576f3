use std::env;

use url::Url;

use crate::error::ConfigError;

pub const BACKEND_URL_VAR: &str = "SIE_BACKEND_URL";
pub const BACKEND_ANON_KEY_VAR: &str = "SIE_BACKEND_ANON_KEY";

/// Location and public key of the hosted backend.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendConfig {
    base_url: Url,
    anon_key: String,
}

impl BackendConfig {
    /// Validate a backend URL and anon key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the URL does not parse, is not http(s), or
    /// the key is blank.
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url.trim())?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base_url.scheme().to_owned()));
        }
        let anon_key = anon_key.trim();
        if anon_key.is_empty() {
            return Err(ConfigError::MissingAnonKey);
        }
        Ok(Self {
            base_url,
            anon_key: anon_key.to_owned(),
        })
    }

    /// Read `SIE_BACKEND_URL` and `SIE_BACKEND_ANON_KEY`.
    ///
    /// Returns `None` when either is unset or invalid; the hosted identity
    /// client is then disabled.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var(BACKEND_URL_VAR).ok()?;
        let anon_key = env::var(BACKEND_ANON_KEY_VAR).ok()?;
        match Self::new(&base_url, &anon_key) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring backend configuration");
                None
            }
        }
    }

    #[must_use]
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Join `path` onto the base URL, keeping any base path prefix.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url.as_str())
            .field("anon_key", &"<redacted>")
            .finish()
    }
}
