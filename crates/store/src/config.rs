//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `WATCHSHOP_DATA_DIR` - Directory for persisted collections (default: the
//!   per-user data directory, e.g. `~/.local/share/watchshop` on Linux)
//! - `WATCHSHOP_STORAGE_NAMESPACE` - Prefix for storage keys (letters, digits,
//!   `_`, `-`); unset means the cart and favorites are shared by everyone
//!   using the data directory
//! - `WATCHSHOP_PERSIST_RETRIES` - Extra attempts for a failed write (default: 2)
//! - `WATCHSHOP_PERSIST_BACKOFF_MS` - Pause between write attempts (default: 50)
//! - `WATCHSHOP_QUEUE_CAPACITY` - Pending commands before callers wait (default: 64)
//! - `WATCHSHOP_CURRENCY` - Display currency for totals (default: EUR)
//! - `WATCHSHOP_USER_ID` - Signed-in customer's UUID, required for checkout
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Order backend (both or neither)
//! - `WATCHSHOP_BACKEND_URL` - Base URL of the hosted backend
//! - `WATCHSHOP_BACKEND_ANON_KEY` - Project anon key
//! - `WATCHSHOP_ACCESS_TOKEN` - Customer access token (optional)

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use watchshop_core::{CurrencyCode, CustomerId};

use crate::storage::StorageKeys;
use crate::store::StoreOptions;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
    #[error("No home directory to place data in; set WATCHSHOP_DATA_DIR")]
    NoDataDir,
}

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the persisted collections
    pub data_dir: PathBuf,
    /// Storage key namespace
    pub namespace: Option<String>,
    /// Keys derived from `namespace`
    pub keys: StorageKeys,
    /// Extra write attempts after a failure
    pub persist_retries: u32,
    /// Pause between write attempts
    pub persist_backoff: Duration,
    /// Command queue capacity
    pub queue_capacity: usize,
    /// Display currency
    pub currency: CurrencyCode,
    /// Signed-in customer, if any
    pub customer: Option<CustomerId>,
    /// Order backend, if configured
    pub backend: Option<BackendConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Order backend configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL, always ending in `/`
    pub base_url: Url,
    /// Project anon key
    pub anon_key: SecretString,
    /// Customer access token
    pub access_token: Option<SecretString>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid, if only half of the
    /// backend pair is set, or if the anon key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let data_dir = match env.optional("WATCHSHOP_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        let namespace = env.optional("WATCHSHOP_STORAGE_NAMESPACE");
        let keys = StorageKeys::namespaced(namespace.as_deref()).map_err(|e| {
            ConfigError::InvalidEnvVar("WATCHSHOP_STORAGE_NAMESPACE".to_string(), e.to_string())
        })?;
        let persist_retries = env.parsed("WATCHSHOP_PERSIST_RETRIES", 2_u32)?;
        let persist_backoff =
            Duration::from_millis(env.parsed("WATCHSHOP_PERSIST_BACKOFF_MS", 50_u64)?);
        let queue_capacity = env.parsed("WATCHSHOP_QUEUE_CAPACITY", 64_usize)?;
        if queue_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "WATCHSHOP_QUEUE_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let currency = env.parsed("WATCHSHOP_CURRENCY", CurrencyCode::default())?;
        let customer = env
            .optional("WATCHSHOP_USER_ID")
            .map(|raw| {
                raw.parse::<CustomerId>().map_err(|e| {
                    ConfigError::InvalidEnvVar("WATCHSHOP_USER_ID".to_string(), e.to_string())
                })
            })
            .transpose()?;
        let backend = BackendConfig::from_env(&env)?;
        let sentry_dsn = env.optional("SENTRY_DSN");

        Ok(Self {
            data_dir,
            namespace,
            keys,
            persist_retries,
            persist_backoff,
            queue_capacity,
            currency,
            customer,
            backend,
            sentry_dsn,
        })
    }

    /// Store tuning derived from this configuration.
    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            keys: self.keys.clone(),
            persist_retries: self.persist_retries,
            persist_backoff: self.persist_backoff,
            queue_capacity: self.queue_capacity,
        }
    }
}

impl BackendConfig {
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let base_url = env.optional("WATCHSHOP_BACKEND_URL");
        let anon_key = env.optional("WATCHSHOP_BACKEND_ANON_KEY");

        let (base_url, anon_key) = match (base_url, anon_key) {
            (None, None) => return Ok(None),
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar(
                    "WATCHSHOP_BACKEND_ANON_KEY".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar("WATCHSHOP_BACKEND_URL".to_string()));
            }
            (Some(url), Some(key)) => (url, key),
        };

        let base_url = parse_base_url(&base_url)?;
        validate_secret_strength(&anon_key, "WATCHSHOP_BACKEND_ANON_KEY")?;
        let access_token = env.optional("WATCHSHOP_ACCESS_TOKEN").map(SecretString::from);

        Ok(Some(Self {
            base_url,
            anon_key: SecretString::from(anon_key),
            access_token,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with the parsing helpers used above.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Per-user data directory, independent of the working directory.
fn default_data_dir() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("", "", "watchshop")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(ConfigError::NoDataDir)
}

/// Parse the backend base URL, making sure relative joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash).map_err(|e| {
        ConfigError::InvalidEnvVar("WATCHSHOP_BACKEND_URL".to_string(), e.to_string())
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "WATCHSHOP_BACKEND_URL".to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Key length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a key is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ANON_KEY: &str = "eyJhbGciOiJIUzI1NiJ9.aB3xY9mK2nL5pQ7rT0uW4zC6";

    fn load(vars: &[(&str, &str)]) -> Result<StoreConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.data_dir, default_data_dir().unwrap());
        assert!(config.data_dir.is_absolute());
        assert_eq!(config.namespace, None);
        assert_eq!(config.persist_retries, 2);
        assert_eq!(config.persist_backoff, Duration::from_millis(50));
        assert_eq!(config.currency, CurrencyCode::EUR);
        assert!(config.customer.is_none());
        assert!(config.backend.is_none());

        let options = config.store_options();
        assert_eq!(options.keys, StorageKeys::default());
    }

    #[test]
    fn test_data_dir_override() {
        let config = load(&[("WATCHSHOP_DATA_DIR", "/var/lib/watchshop")]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/watchshop"));
    }

    #[test]
    fn test_namespace_flows_into_keys() {
        let config = load(&[("WATCHSHOP_STORAGE_NAMESPACE", "alice")]).unwrap();
        assert_eq!(config.store_options().keys.cart, "alice:cart");
    }

    #[test]
    fn test_namespace_with_separator_rejected() {
        let err = load(&[("WATCHSHOP_STORAGE_NAMESPACE", "a.b")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == "WATCHSHOP_STORAGE_NAMESPACE"));
    }

    #[test]
    fn test_invalid_number() {
        let err = load(&[("WATCHSHOP_PERSIST_RETRIES", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == "WATCHSHOP_PERSIST_RETRIES"));
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        assert!(load(&[("WATCHSHOP_QUEUE_CAPACITY", "0")]).is_err());
    }

    #[test]
    fn test_invalid_user_id() {
        let err = load(&[("WATCHSHOP_USER_ID", "nobody")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_backend_requires_both_variables() {
        let err = load(&[("WATCHSHOP_BACKEND_URL", "https://project.backend.test")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(name) if name == "WATCHSHOP_BACKEND_ANON_KEY"));
    }

    #[test]
    fn test_backend_url_gets_trailing_slash() {
        let config = load(&[
            ("WATCHSHOP_BACKEND_URL", "https://project.backend.test/api"),
            ("WATCHSHOP_BACKEND_ANON_KEY", ANON_KEY),
        ])
        .unwrap();
        let backend = config.backend.unwrap();
        assert_eq!(backend.base_url.as_str(), "https://project.backend.test/api/");
        assert!(!format!("{backend:?}").contains(ANON_KEY));
    }

    #[test]
    fn test_backend_url_scheme_checked() {
        let err = load(&[
            ("WATCHSHOP_BACKEND_URL", "ftp://project.backend.test"),
            ("WATCHSHOP_BACKEND_ANON_KEY", ANON_KEY),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_anon_key_rejected() {
        let result = validate_secret_strength("your-anon-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_low_entropy_anon_key_rejected() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_realistic_anon_key_accepted() {
        assert!(validate_secret_strength(ANON_KEY, "TEST_VAR").is_ok());
    }
}
