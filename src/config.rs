//! Service configuration with sensible defaults.
//!
//! [`ServicesConfig`] gathers the retry policy, HTTP client settings and
//! per-provider settings. It can be built in code, loaded from a TOML file,
//! and topped up from environment variables. Credentials are never
//! defaulted: a provider that needs a key fails at construction when none
//! is configured.

use std::path::Path;
use std::time::Duration;

use retrieval_core::{Result, RetryPolicy, ServiceError};
use serde::{Deserialize, Serialize};

use crate::providers::dblp::DblpConfig;
use crate::providers::google::GoogleConfig;
use crate::providers::pinecone::PineconeConfig;
use crate::providers::semantic_scholar::SemanticScholarConfig;

/// Environment variable holding the Semantic Scholar API key.
pub const S2_API_KEY_ENV: &str = "S2_API_KEY";
/// Environment variable holding the Google API key.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Environment variable holding the Google Programmable Search engine id.
pub const GOOGLE_CX_ENV: &str = "GOOGLE_CX";
/// Environment variable holding the Pinecone API key.
pub const PINECONE_API_KEY_ENV: &str = "PINECONE_API_KEY";

/// Rate-limit retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts per remote call, including the first.
    pub retries: u32,
    /// Wait before the first retry, in seconds.
    pub cooldown_secs: f64,
    /// Double the wait after every retry.
    pub exponential: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 5,
            cooldown_secs: 2.0,
            exponential: true,
        }
    }
}

impl RetryConfig {
    /// Checks that the attempt limit and cooldown are usable.
    pub fn validate(&self) -> Result<()> {
        if self.retries == 0 {
            return Err(ServiceError::Config(
                "retry.retries must be greater than 0".into(),
            ));
        }
        self.cooldown()?;
        Ok(())
    }

    fn cooldown(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.cooldown_secs).map_err(|_| {
            ServiceError::Config(format!(
                "retry.cooldown_secs must be a non-negative number of seconds, got {}",
                self.cooldown_secs
            ))
        })
    }

    /// The [`RetryPolicy`] described by this config.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if `cooldown_secs` is negative, not
    /// finite, or too large for a [`Duration`].
    pub fn policy(&self) -> Result<RetryPolicy> {
        Ok(RetryPolicy::new(self.retries, self.cooldown()?).with_exponential(self.exponential))
    }
}

/// HTTP client settings shared by all providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent. If `None`, the crate name and version are sent.
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: None,
        }
    }
}

impl HttpConfig {
    /// Checks the timeout.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            return Err(ServiceError::Config(
                "http.timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration for every adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Rate-limit retry settings.
    pub retry: RetryConfig,
    /// HTTP client settings.
    pub http: HttpConfig,
    /// DBLP search and citation settings.
    pub dblp: DblpConfig,
    /// Semantic Scholar settings.
    pub semantic_scholar: SemanticScholarConfig,
    /// Google Custom Search settings.
    pub google: GoogleConfig,
    /// Pinecone settings.
    pub pinecone: PineconeConfig,
}

impl ServicesConfig {
    /// Load a configuration from a TOML file.
    ///
    /// Missing sections and fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ServiceError::Config(format!("invalid config: {e}")))
    }

    /// Fill unset credentials from the process environment.
    ///
    /// Values already present in the config are kept.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Fill unset credentials using `lookup` (environment-like).
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if self.semantic_scholar.api_key.is_none() {
            self.semantic_scholar.api_key = non_empty(S2_API_KEY_ENV);
        }
        if self.google.api_key.is_none() {
            self.google.api_key = non_empty(GOOGLE_API_KEY_ENV);
        }
        if self.google.cx.is_none() {
            self.google.cx = non_empty(GOOGLE_CX_ENV);
        }
        if self.pinecone.api_key.is_none() {
            self.pinecone.api_key = non_empty(PINECONE_API_KEY_ENV);
        }
        self
    }

    /// Validates the settings every provider shares.
    ///
    /// Provider credentials are checked when that provider is constructed,
    /// so a config without a Google key is still valid for DBLP.
    pub fn validate(&self) -> Result<()> {
        self.retry.validate()?;
        self.http.validate()?;
        Ok(())
    }
}
